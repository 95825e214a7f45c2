//! Terminal synthesis output handling

pub mod parsing;
