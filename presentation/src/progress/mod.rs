//! Progress display for deliberation runs

pub mod reporter;
