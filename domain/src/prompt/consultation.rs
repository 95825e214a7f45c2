//! Prompt strategies for the dialogic spinal-fusion consultation flavor.

use super::strategy::{PromptContext, PromptStrategy};
use super::template::transcript_digest;
use crate::core::parameters::Parameters;
use crate::core::role::RoleId;
use crate::deliberation::consultation_type::ConsultationType;
use crate::deliberation::state::DeliberationState;

/// Turns longer than this are cut in the coordinator's digest.
pub const DIGEST_TURN_CHARS: usize = 100;

fn consultation_type(params: &Parameters) -> ConsultationType {
    ConsultationType::from_code(&params.text("consultation_type"))
}

fn profile(params: &Parameters, field: &str) -> String {
    params
        .nested_text("patient_info", field)
        .unwrap_or_else(|| "not provided".to_string())
}

fn doctor_examples(kind: ConsultationType) -> &'static str {
    match kind {
        ConsultationType::PreSurgery => {
            r#"Example:
Patient: "I'm scared of the surgery. Is it really safe?"
Doctor: "Fear before surgery is a natural feeling. Spinal fusion is a safe procedure with a high success rate, and thorough pre-operative tests keep the risks low. Let me walk you through the procedure...""#
        }
        ConsultationType::Rehabilitation => {
            r#"Example:
Patient: "When can I start exercising?"
Doctor: "Exercise should start in stages. At six weeks after surgery, begin with light walking and stretching. Avoid bending or twisting your back for now; a physical therapist can help you plan...""#
        }
        _ => {
            r#"Example:
Patient: "It's three weeks after surgery and it still hurts. Is that normal?"
Doctor: "Pain at three weeks is part of normal recovery. Bone fusion takes three to six months, so you are still early on. If the pain is slowly decreasing, you are recovering well. Take the prescribed pain medication regularly...""#
        }
    }
}

fn patient_examples(kind: ConsultationType) -> &'static str {
    match kind {
        ConsultationType::PreSurgery => {
            r#"Example:
Doctor: "The surgery is very safe and has a high success rate."
Patient: "That's a bit of a relief. But when can I go back to work? I sit at a desk most of the day. And I'm worried about looking after the kids.""#
        }
        ConsultationType::Rehabilitation => {
            r#"Example:
Doctor: "You can start exercising step by step."
Patient: "Okay. Are there simple exercises I can do at home? Coming to the hospital every time is a bit hard. Which movements should I be careful with?""#
        }
        _ => {
            r#"Example:
Doctor: "Your recovery is going smoothly."
Patient: "Good to hear. But my legs still go numb sometimes. Will that get better with time? And how long will I need physical therapy?""#
        }
    }
}

/// Spinal fusion specialist.
#[derive(Debug, Clone, Copy, Default)]
pub struct Doctor;

impl PromptStrategy for Doctor {
    fn system_instruction(&self) -> &str {
        r#"You are a spinal fusion specialist. Answer the patient's questions accurately and in plain language.

## Responsibilities
1. Provide expert medical knowledge about spinal fusion
2. Ease the patient's anxiety and convey accurate information
3. Give pre- and post-operative care guidance
4. Tailor advice to the individual patient

## Principles
- Give only medically accurate information
- Explain technical terms simply
- Empathize with the patient and reassure them
- Recommend an immediate hospital visit in emergencies"#
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        let params = state.parameters();
        let mut query = format!(
            "{} {} spinal fusion guidance",
            params.text("patient_query"),
            consultation_type(params).code()
        );
        if let Some(turn) = state.last_turn_by(&RoleId::patient()) {
            query.push(' ');
            query.push_str(&turn.content);
        }
        query
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        let params = ctx.state.parameters();
        let kind = consultation_type(params);
        let question = match ctx.state.last_turn_by(&RoleId::patient()) {
            Some(turn) => format!("The patient's latest reply: \"{}\"", turn.content),
            None => format!("Patient question: \"{}\"", params.text("patient_query")),
        };

        format!(
            r#"Patient information:
- Age: {}
- Time since surgery: {}
- Main symptoms: {}
- Consultation type: {}

Relevant medical information:
{}

{}

{}

Answer in these steps:
1. **Assessment**: analyze the patient's question and condition
2. **Explanation**: explain the relevant medical knowledge simply
3. **Actions**: concrete steps the patient can take
4. **Precautions**: important warnings and what to do in an emergency
5. **Encouragement**: reassure and encourage the patient

Keep it under 300 words, medically accurate, warm and easy to understand."#,
            profile(params, "age"),
            profile(params, "post_surgery_period"),
            profile(params, "symptoms"),
            kind.display_name(),
            ctx.references,
            doctor_examples(kind),
            question
        )
    }
}

/// Patient reacting to the doctor's explanations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Patient;

impl PromptStrategy for Patient {
    fn system_instruction(&self) -> &str {
        r#"You are a patient who has had (or is about to have) spinal fusion surgery. Listen to the doctor's explanation and react naturally.

## Character
1. A layperson with limited medical knowledge
2. Natural anxiety about surgery and recovery
3. Concrete questions about everyday life
4. Asks the doctor to confirm what they said

## Behavior
- Show that you understood the explanation
- Raise further worries or questions
- Express emotions such as anxiety or relief naturally
- Mention practical concerns about family and work
- When all your concerns are resolved, thank the doctor and say you have no more questions"#
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        format!(
            "{} recovery daily life return to work",
            consultation_type(state.parameters()).code()
        )
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        let params = ctx.state.parameters();
        let kind = consultation_type(params);
        let doctor = ctx
            .state
            .last_turn_by(&RoleId::doctor())
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        format!(
            r#"Patient information:
- Age: {}
- Occupation: {}
- Family: {}
- Time since surgery: {}
- Consultation type: {}

{}

The doctor's answer: "{}"

React naturally as the patient:
1. **Understanding**: show understanding or relief
2. **Follow-up question**: a concrete question about your own situation
3. **Worries**: what still concerns you
4. **Daily life**: practical concerns about work, family and everyday life

Keep it under 200 words and use everyday words rather than medical jargon."#,
            profile(params, "age"),
            profile(params, "occupation"),
            profile(params, "family"),
            profile(params, "post_surgery_period"),
            kind.display_name(),
            patient_examples(kind),
            doctor
        )
    }
}

/// Terminal synthesizer summarizing the consultation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinator;

impl PromptStrategy for Coordinator {
    fn system_instruction(&self) -> &str {
        r#"You are a care coordinator for spinal fusion consultations. You organize and summarize the consultation between doctor and patient.

## Responsibilities
1. Organize the key points of the consultation
2. Summarize the advice the patient received
3. Identify areas needing further consultation
4. Point out next appointments or check-ups"#
    }

    fn retrieval_query(&self, state: &DeliberationState) -> String {
        format!(
            "{} {} care plan follow-up",
            state.parameters().text("patient_query"),
            consultation_type(state.parameters()).code()
        )
    }

    fn compose(&self, ctx: &PromptContext<'_>) -> String {
        let params = ctx.state.parameters();
        format!(
            r#"Consultation information:
- Patient: age {}, {}
- Consultation type: {}
- Time since surgery: {}

Relevant medical information:
{}

Conversation:
{}

Summarize the consultation as follows:

## Consultation Summary
### 1. Main topics
- The patient's main questions and concerns
- The doctor's key advice

### 2. Patient action items
- Immediate actions
- Ongoing care
- Things to avoid

### 3. Precautions
- What to do in an emergency
- Regular check-up schedule
- Areas needing further consultation

### 4. Next steps
- Expected recovery course
- Recommended time for the next consultation

Write clearly and concretely so the patient can easily understand."#,
            profile(params, "age"),
            profile(params, "occupation"),
            consultation_type(params).display_name(),
            profile(params, "post_surgery_period"),
            ctx.references,
            transcript_digest(ctx.state.transcript(), DIGEST_TURN_CHARS)
        )
    }
}
