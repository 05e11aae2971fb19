use serde::{Deserialize, Serialize};

/// The facts a user supplies for one optimizer invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub company_name: String,
    pub industry: String,
    pub initial_value_proposition: String,
    pub venture_summary: String,
}

impl AnalysisRequest {
    pub fn new(
        company_name: impl Into<String>,
        industry: impl Into<String>,
        initial_value_proposition: impl Into<String>,
        venture_summary: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            industry: industry.into(),
            initial_value_proposition: initial_value_proposition.into(),
            venture_summary: venture_summary.into(),
        }
    }

    /// Names of the required fields that are empty or whitespace-only, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("company_name", &self.company_name),
            ("industry", &self.industry),
            ("initial_value_proposition", &self.initial_value_proposition),
            ("venture_summary", &self.venture_summary),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Accumulated state threaded through the chain.
///
/// `current_analysis` starts as the initial value proposition and is replaced by every
/// step's output before the next step renders its prompts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisContext {
    pub company_name: String,
    pub industry: String,
    pub initial_value_proposition: String,
    pub venture_summary: String,
    pub current_analysis: String,
}

impl AnalysisContext {
    pub fn seed(request: AnalysisRequest) -> Self {
        let current_analysis = request.initial_value_proposition.clone();
        Self {
            company_name: request.company_name,
            industry: request.industry,
            initial_value_proposition: request.initial_value_proposition,
            venture_summary: request.venture_summary,
            current_analysis,
        }
    }

    pub fn advance(&mut self, analysis: impl Into<String>) {
        self.current_analysis = analysis.into();
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisContext, AnalysisRequest};

    #[test]
    fn missing_fields_reports_blank_values_in_form_order() {
        let request = AnalysisRequest::new("Acme", "  ", "", "summary");
        assert_eq!(request.missing_fields(), vec!["industry", "initial_value_proposition"]);
    }

    #[test]
    fn complete_request_has_no_missing_fields() {
        let request = AnalysisRequest::new("Acme", "Retail", "We sell", "Research says");
        assert!(request.missing_fields().is_empty());
    }

    #[test]
    fn seeded_context_starts_from_initial_value_proposition() {
        let mut context =
            AnalysisContext::seed(AnalysisRequest::new("Acme", "Retail", "We sell", "Research"));
        assert_eq!(context.current_analysis, "We sell");

        context.advance("step output");
        assert_eq!(context.current_analysis, "step output");
        assert_eq!(context.initial_value_proposition, "We sell");
    }
}
