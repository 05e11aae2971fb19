use serde::Serialize;

use crate::domain::analysis::AnalysisContext;

/// Which original inputs a step places in its human turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HumanTurn {
    PropositionAndSummary,
    SummaryOnly,
}

/// One fixed stage of the optimizer chain.
#[derive(Clone, Copy, Debug)]
pub struct StepSpec {
    pub index: usize,
    pub name: &'static str,
    pub instruction: fn(&AnalysisContext) -> String,
    pub human_turn: HumanTurn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub instruction: String,
    pub human_turn: String,
}

impl StepSpec {
    /// Renders the system instruction and human turn for this step.
    ///
    /// With `carry_forward` set, the rolling `current_analysis` is appended to the human turn
    /// of every step after the seed step.
    pub fn render(&self, context: &AnalysisContext, carry_forward: bool) -> RenderedPrompt {
        let mut human_turn = match self.human_turn {
            HumanTurn::PropositionAndSummary => format!(
                "Initial Value Proposition: {}\nVenture Summary: {}",
                context.initial_value_proposition, context.venture_summary
            ),
            HumanTurn::SummaryOnly => format!("Venture Summary: {}", context.venture_summary),
        };

        if carry_forward && self.index > 0 {
            human_turn.push_str("\nPrevious Analysis: ");
            human_turn.push_str(&context.current_analysis);
        }

        RenderedPrompt { instruction: (self.instruction)(context), human_turn }
    }

    pub fn label(&self) -> String {
        format!("Step {}: {}", self.index, self.name)
    }
}

/// Output of one chain step, surfaced to the caller as soon as the step finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub name: &'static str,
    pub text: String,
}

impl StepResult {
    pub fn new(spec: &StepSpec, text: impl Into<String>) -> Self {
        Self { index: spec.index, name: spec.name, text: text.into() }
    }
}
