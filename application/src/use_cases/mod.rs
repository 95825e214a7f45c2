//! Use cases (application services)

pub mod event_stream;
pub mod run_deliberation;
