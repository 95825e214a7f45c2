//! Generation session domain: messages exchanged with a language model.

pub mod entities;
