//! The fixed eight-step optimizer chain.
//!
//! Instructions reference only the company, the industry and the original inputs. The rolling
//! analysis is carried forward through `AnalysisContext::current_analysis` and only reaches a
//! prompt when carry-forward is enabled in `ChainConfig`.

use crate::domain::analysis::AnalysisContext;
use crate::domain::step::{HumanTurn, StepSpec};

pub const STEP_COUNT: usize = 8;

pub static STEPS: [StepSpec; STEP_COUNT] = [
    StepSpec {
        index: 0,
        name: "Analysis of the Current Value Proposition",
        instruction: seed_instruction,
        human_turn: HumanTurn::PropositionAndSummary,
    },
    StepSpec {
        index: 1,
        name: "Describe the Current Value Proposition",
        instruction: describe_instruction,
        human_turn: HumanTurn::PropositionAndSummary,
    },
    StepSpec {
        index: 2,
        name: "Identify Customer Segments",
        instruction: segments_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
    StepSpec {
        index: 3,
        name: "Analyze the Competitive Landscape",
        instruction: competitive_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
    StepSpec {
        index: 4,
        name: "Summarize Customer Feedback",
        instruction: feedback_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
    StepSpec {
        index: 5,
        name: "Conduct a SWOT Analysis",
        instruction: swot_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
    StepSpec {
        index: 6,
        name: "Propose Enhancements to the Value Proposition",
        instruction: enhancements_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
    StepSpec {
        index: 7,
        name: "New Optimized Value Proposition",
        instruction: new_proposition_instruction,
        human_turn: HumanTurn::SummaryOnly,
    },
];

fn seed_instruction(context: &AnalysisContext) -> String {
    format!(
        "You are an AI trained to analyze and enhance company value propositions. Using initial \
         inputs and conducting further online research, provide a comprehensive analysis for \
         the company '{}' in the industry '{}'. Consider the initial value proposition '{}' and \
         venture summary '{}', and train yourself to be an expert for this company to elaborate \
         during the next steps based the input and on external data sources.",
        context.company_name,
        context.industry,
        context.initial_value_proposition,
        context.venture_summary
    )
}

fn describe_instruction(context: &AnalysisContext) -> String {
    format!(
        "Describe the current value proposition of {}. Include details on the target audience, \
         key benefits, and how it differentiates from competitors.",
        context.company_name
    )
}

fn segments_instruction(context: &AnalysisContext) -> String {
    format!(
        "Identify the primary and secondary customer segments for {}. List their main needs, \
         preferences, and pain points related to the company's offerings.",
        context.company_name
    )
}

fn competitive_instruction(context: &AnalysisContext) -> String {
    format!(
        "Analyze the competitive landscape for {company} in {industry}. Highlight key competitors \
         and compare their value propositions with that of {company}.",
        company = context.company_name,
        industry = context.industry
    )
}

fn feedback_instruction(context: &AnalysisContext) -> String {
    format!(
        "Summarize customer feedback and reviews for {}, focusing on customer satisfaction with \
         the current value proposition. Include any recurring themes or suggestions.",
        context.company_name
    )
}

fn swot_instruction(context: &AnalysisContext) -> String {
    format!(
        "Conduct a SWOT analysis (Strengths, Weaknesses, Opportunities, Threats) for {} based on \
         the current value proposition and market conditions.",
        context.company_name
    )
}

fn enhancements_instruction(context: &AnalysisContext) -> String {
    format!(
        "Based on the analysis in the previous steps, propose enhancements to the value \
         proposition of {} that align with customer needs and market opportunities.",
        context.company_name
    )
}

fn new_proposition_instruction(context: &AnalysisContext) -> String {
    format!(
        "Based on the comprehensive analysis of customer needs, market trends, competitive \
         positioning, and internal strengths and weaknesses conducted in the previous steps, \
         craft a new, optimized value proposition for {}. This proposition should clearly state \
         the unique benefits, target customer segments, and how it differentiates from \
         competitors. Also, include rationale for why this new value proposition will meet market \
         demands more effectively and how it aligns with the company's strategic goals.",
        context.company_name
    )
}
