//! Prompt domain
//!
//! The [`PromptStrategy`] seam plus the built-in role strategies for both
//! deliberation flavors.

pub mod advisory;
pub mod consultation;
mod strategy;
mod template;

pub use strategy::{PromptContext, PromptStrategy};
pub use template::{format_references, full_discussion, parameter_terms, transcript_digest};
