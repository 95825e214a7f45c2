//! Deliberation domain
//!
//! State, termination rules and flavor definitions for multi-role
//! deliberation runs.

pub mod consultation_type;
pub mod flavor;
pub mod record;
pub mod state;
pub mod termination;
