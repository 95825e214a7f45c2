//! Deliberation settings: runtime knobs for a run.
//!
//! [`DeliberationSettings`] is the slice of file configuration that the
//! use case needs. The infrastructure layer builds it from `[retrieval]` and
//! `[deliberation]`; tests build it directly.

use agora_domain::{DEFAULT_COMPLETION_PHRASES, Flavor};
use std::time::Duration;

/// Runtime settings for deliberation runs.
///
/// | Field | Applies to |
/// |-------|------------|
/// | `retrieval_cap` | ordinary agents, and the adversarial mediator |
/// | `synthesis_retrieval_cap` | the dialogic coordinator |
/// | `max_rounds` / `max_turns` | default ceiling when the input has none |
#[derive(Debug, Clone, PartialEq)]
pub struct DeliberationSettings {
    pub retrieval_cap: usize,
    pub synthesis_retrieval_cap: usize,
    pub max_rounds: u32,
    pub max_turns: u32,
    /// Pause after each emitted update in the event stream
    pub step_delay: Duration,
    pub completion_phrases: Vec<String>,
}

impl Default for DeliberationSettings {
    fn default() -> Self {
        Self {
            retrieval_cap: 2,
            synthesis_retrieval_cap: 1,
            max_rounds: Flavor::Adversarial.default_ceiling(),
            max_turns: Flavor::Dialogic.default_ceiling(),
            step_delay: Duration::from_millis(10),
            completion_phrases: DEFAULT_COMPLETION_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl DeliberationSettings {
    // ==================== Builder Methods ====================

    pub fn with_retrieval_cap(mut self, cap: usize) -> Self {
        self.retrieval_cap = cap;
        self
    }

    pub fn with_synthesis_retrieval_cap(mut self, cap: usize) -> Self {
        self.synthesis_retrieval_cap = cap;
        self
    }

    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_completion_phrases(mut self, phrases: Vec<String>) -> Self {
        self.completion_phrases = phrases;
        self
    }

    /// Zero every retrieval cap, including the synthesizer's.
    pub fn without_retrieval(mut self) -> Self {
        self.retrieval_cap = 0;
        self.synthesis_retrieval_cap = 0;
        self
    }

    // ==================== Per-flavor Lookups ====================

    pub fn default_ceiling(&self, flavor: Flavor) -> u32 {
        match flavor {
            Flavor::Adversarial => self.max_rounds,
            Flavor::Dialogic => self.max_turns,
        }
    }

    pub fn synthesis_cap(&self, flavor: Flavor) -> usize {
        match flavor {
            Flavor::Adversarial => self.retrieval_cap,
            Flavor::Dialogic => self.synthesis_retrieval_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DeliberationSettings::default();
        assert_eq!(settings.retrieval_cap, 2);
        assert_eq!(settings.synthesis_cap(Flavor::Dialogic), 1);
        assert_eq!(settings.synthesis_cap(Flavor::Adversarial), 2);
        assert_eq!(settings.default_ceiling(Flavor::Adversarial), 3);
        assert_eq!(settings.default_ceiling(Flavor::Dialogic), 6);
        assert_eq!(settings.step_delay, Duration::from_millis(10));
        assert!(settings.completion_phrases.contains(&"thank you".to_string()));
    }

    #[test]
    fn test_without_retrieval_zeroes_all_caps() {
        let settings = DeliberationSettings::default()
            .with_synthesis_retrieval_cap(3)
            .without_retrieval();
        assert_eq!(settings.synthesis_cap(Flavor::Adversarial), 0);
        assert_eq!(settings.synthesis_cap(Flavor::Dialogic), 0);
    }
}
