//! Prompt strategies for the adversarial property-advisory flavor.
//!
//! - [`RationalAdvisor`]: commute and financial risk first
//! - [`EmotionalAdvisor`]: quality of life and the client's aspirations
//! - [`Mediator`]: weighs both sides and closes with recommendations

use super::strategy::{PromptContext, PromptStrategy};
use super::template::{full_discussion, parameter_terms};
use crate::core::parameters::Parameters;
use crate::core::role::RoleId;
use crate::deliberation::state::DeliberationState;

const REQUIREMENT_KEYS: &[&str] = &[
    "budget",
    "property_type",
    "area_range",
    "preference1",
    "preference2",
];

/// Section headings the mediator is asked to use; the synthesis parser
/// looks for the same headings.
pub const RECOMMENDED_HEADING: &str = "Recommended Properties";
pub const FOLLOW_UP_HEADING: &str = "Follow-up Options";

fn requirements(params: &Parameters) -> String {
    format!(
        "Client requirements:\n- Budget: {}\n- Property type: {}\n- Area range: {}\n- Preference 1: {}\n- Preference 2: {}",
        params.text("budget"),
        params.text("property_type"),
        params.text("area_range"),
        params.text("preference1"),
        params.text("preference2"),
    )
}

fn is_opening(state: &DeliberationState) -> bool {
    state.round_or_turn_counter() <= 1
}

fn last_content(state: &DeliberationState, role: &RoleId) -> String {
    state
        .last_turn_by(role)
        .map(|t| t.content.clone())
        .unwrap_or_default()
}

fn biased_query(state: &DeliberationState, bias: &str) -> String {
    let mut query = parameter_terms(state.parameters(), REQUIREMENT_KEYS);
    query.push(' ');
    query.push_str(bias);
    if !is_opening(state) {
        query.push_str(" counterpoint");
    }
    query.trim().to_string()
}

/// Realistic, risk-averse advisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct RationalAdvisor;

impl PromptStrategy for RationalAdvisor {
    fn system_instruction(&self) -> &str {
        "You are a realistic, level-headed real estate expert. You put the client's commute, \
         living environment and financial risk first. You ground your advice in statistics and \
         objective facts, and you carefully discourage overreaching decisions. You emphasize \
         safe and stable choices."
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        biased_query(state, "commute living environment financial stability")
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        let params = ctx.state.parameters();
        if is_opening(ctx.state) {
            format!(
                r#"You are the rational, realistic property advisor.

{}

Relevant property information:
{}

Analyze the client's requirements from a realistic, clear-eyed perspective.
Focus on commute convenience, living environment and financial risk, and stress safe, stable choices.
Support your points with statistics or objective facts.
Write 2-3 short paragraphs."#,
                requirements(params),
                ctx.references
            )
        } else {
            format!(
                r#"You are the rational, realistic property advisor.

{}

Relevant property information:
{}

Rebut the emotional advisor's latest opinion from a realistic standpoint and reinforce your rational advice:
Emotional advisor's opinion: "{}"

Focus on commute, living environment and financial risk, and stress why safe, stable choices matter.
Write 2-3 short paragraphs."#,
                requirements(params),
                ctx.references,
                last_content(ctx.state, &RoleId::emotional())
            )
        }
    }
}

/// Advisor who champions the client's aspirations and quality of life.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionalAdvisor;

impl PromptStrategy for EmotionalAdvisor {
    fn system_instruction(&self) -> &str {
        "You are an empathetic real estate expert who respects the client's dreams. Within \
         realistic bounds you help the client realize what they value. You prioritize emotional \
         satisfaction and quality of life, and gently argue that gaining something may mean \
         giving up something else."
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        biased_query(state, "view amenities quality of life")
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        let params = ctx.state.parameters();
        let rational = last_content(ctx.state, &RoleId::rational());
        let instruction = if is_opening(ctx.state) {
            "Respond to the rational advisor's opinion from an emotional perspective, and give advice that honors the client's aspirations and emotional satisfaction:"
        } else {
            "Rebut the rational advisor's latest opinion from an emotional perspective, and strengthen the case for the client's aspirations and emotional satisfaction:"
        };

        format!(
            r#"You are the emotional, aspirational property advisor.

{}

Relevant property information:
{}

{}
Rational advisor's opinion: "{}"

Prioritize emotional satisfaction and quality of life, and gently persuade that some trade-offs are worth making.
Write 2-3 short paragraphs."#,
            requirements(params),
            ctx.references,
            instruction,
            rational
        )
    }
}

/// Terminal synthesizer for the advisory debate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mediator;

impl PromptStrategy for Mediator {
    fn system_instruction(&self) -> &str {
        "You are a mediator who combines the two advisors' opinions, distills the essentials and \
         reaches the most reasonable conclusion. You summarize the preceding debate, analyze \
         strengths and weaknesses clearly, and give objective, balanced information so the client \
         can make the final decision."
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        let mut query = parameter_terms(state.parameters(), REQUIREMENT_KEYS);
        query.push_str(" objective information market trends analysis");
        query.trim().to_string()
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        format!(
            r#"Below is a debate between two advisors about property recommendations. Analyze each advisor's opinion and give comprehensive advice.

{}

Relevant property information:
{}

Debate:
{}

Provide comprehensive advice that includes:
1. A summary of the core of both opinions
2. The strengths and weaknesses of each opinion
3. A recommended direction based on the client's priorities

Then close with these two sections, one bullet per line:

## {}
- <property or area>: <one-line reason>

## {}
- <a refinement of the search conditions the client could try next>

Keep the whole answer under 500 words."#,
            requirements(ctx.state.parameters()),
            ctx.references,
            full_discussion(ctx.state.transcript()),
            RECOMMENDED_HEADING,
            FOLLOW_UP_HEADING
        )
    }
}
