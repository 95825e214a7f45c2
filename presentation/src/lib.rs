//! Presentation layer for agora
//!
//! This crate contains CLI definitions, output formatters and progress
//! reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, ConsultArgs, DebateArgs, OutputFormat, RunArgs};
pub use output::console::ConsoleFormatter;
pub use output::sse::SseEncoder;
pub use progress::reporter::{ProgressReporter, SimpleProgress, describe_termination};
