use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use valprop_core::{
    AnalysisContext, AnalysisRequest, CompanyHandler, CompanyRouter, Credential, DocumentSource,
    OptimizerError, StepResult, StepSink, Table, STEPS,
};

use crate::llm::CompletionClient;

/// Field name reported when the caller supplied no credential.
pub const CREDENTIAL_FIELD: &str = "api_key";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Every chain step ran; results are in step order.
    Chain { results: Vec<StepResult> },
    /// The company is a special case answered from a reference dataset.
    Document { company_name: String, dataset: PathBuf, table: Table },
}

/// Runs the fixed value proposition chain for one request.
pub struct ChainOrchestrator<C, D> {
    client: C,
    documents: D,
    router: CompanyRouter,
    carry_forward: bool,
}

impl<C, D> ChainOrchestrator<C, D>
where
    C: CompletionClient,
    D: DocumentSource,
{
    pub fn new(client: C, documents: D, router: CompanyRouter) -> Self {
        Self { client, documents, router, carry_forward: false }
    }

    pub fn with_carry_forward(mut self, carry_forward: bool) -> Self {
        self.carry_forward = carry_forward;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub async fn run(
        &self,
        credential: &Credential,
        request: AnalysisRequest,
        sink: &dyn StepSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, OptimizerError> {
        let mut missing = request.missing_fields();
        if credential.is_blank() {
            missing.push(CREDENTIAL_FIELD);
        }
        if !missing.is_empty() {
            return Err(OptimizerError::MissingInput { fields: missing });
        }

        let correlation_id = Uuid::new_v4().to_string();
        match self.router.resolve_company_handler(&request.company_name) {
            CompanyHandler::DocumentLookup { dataset } => {
                self.lookup(&correlation_id, request.company_name, dataset).await
            }
            CompanyHandler::LlmChain => {
                self.run_chain(&correlation_id, credential, request, sink, cancel).await
            }
        }
    }

    async fn lookup(
        &self,
        correlation_id: &str,
        company_name: String,
        dataset: PathBuf,
    ) -> Result<AnalysisOutcome, OptimizerError> {
        info!(
            event_name = "chain.document_lookup.started",
            correlation_id,
            dataset = %dataset.display(),
            "company routed to reference dataset"
        );

        let table = self.documents.load_table(&dataset).await.map_err(|source| {
            warn!(
                event_name = "chain.document_lookup.failed",
                correlation_id,
                error = %source,
                "reference dataset could not be loaded"
            );
            OptimizerError::DocumentLookupFailed { dataset: dataset.display().to_string(), source }
        })?;

        Ok(AnalysisOutcome::Document { company_name, dataset, table })
    }

    async fn run_chain(
        &self,
        correlation_id: &str,
        credential: &Credential,
        request: AnalysisRequest,
        sink: &dyn StepSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, OptimizerError> {
        let mut context = AnalysisContext::seed(request);
        let mut results = Vec::with_capacity(STEPS.len());

        for spec in STEPS.iter() {
            if cancel.is_cancelled() {
                warn!(event_name = "chain.cancelled", correlation_id, step = spec.index);
                return Err(OptimizerError::Cancelled);
            }

            let prompt = spec.render(&context, self.carry_forward);
            info!(
                event_name = "chain.step.started",
                correlation_id,
                step = spec.index,
                step_name = spec.name
            );

            let call =
                self.client.complete_chat(credential, &prompt.instruction, &prompt.human_turn);
            let reply = tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(event_name = "chain.cancelled", correlation_id, step = spec.index);
                    return Err(OptimizerError::Cancelled);
                }
                reply = call => reply,
            };

            let text = reply.map_err(|source| {
                warn!(
                    event_name = "chain.step.failed",
                    correlation_id,
                    step = spec.index,
                    error = %source,
                    "aborting chain"
                );
                OptimizerError::chain_step(spec.index, source)
            })?;

            let result = StepResult::new(spec, text);
            sink.emit(&result);
            info!(event_name = "chain.step.completed", correlation_id, step = spec.index);

            context.advance(result.text.clone());
            results.push(result);
        }

        Ok(AnalysisOutcome::Chain { results })
    }
}
