//! Application-level configuration.
//!
//! - [`DeliberationSettings`]: retrieval caps, default ceilings, step delay
//!   and completion phrases

pub mod deliberation_settings;

pub use deliberation_settings::DeliberationSettings;
