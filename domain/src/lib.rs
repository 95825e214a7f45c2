//! Domain layer for agora
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Deliberation
//!
//! A deliberation is a bounded, multi-role conversation driven by a fixed
//! schedule:
//!
//! - **Ordinary roles** take turns in a fixed order within each cycle
//! - **Cycle advance** bumps the round/turn counter and checks the
//!   termination rule
//! - **Terminal synthesis** runs once after termination and produces the
//!   final artifacts
//!
//! ## Flavors
//!
//! - **Adversarial**: rational vs. emotional advisor, closed by a mediator
//!   (round ceiling, `counter > max`)
//! - **Dialogic**: doctor / patient dialogue, closed by a coordinator
//!   (turn ceiling `counter >= max`, or a completion phrase from the patient)

pub mod core;
pub mod deliberation;
pub mod prompt;
pub mod session;
pub mod synthesis;

// Re-export commonly used types
pub use core::{error::DomainError, parameters::Parameters, role::RoleId};
pub use deliberation::{
    consultation_type::ConsultationType,
    flavor::Flavor,
    record::DeliberationRecord,
    state::{DeliberationState, FinalArtifacts, RecommendedItem, ReferenceSnippet, Turn},
    termination::{DEFAULT_COMPLETION_PHRASES, TerminationReason, TerminationRule},
};
pub use prompt::{PromptContext, PromptStrategy};
pub use session::entities::{Message, Role};
pub use synthesis::parsing::parse_synthesis_artifacts;
