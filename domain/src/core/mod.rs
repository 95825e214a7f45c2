//! Core domain concepts shared across all subdomains.
//!
//! - [`role::RoleId`]: identifier of a deliberation participant
//! - [`parameters::Parameters`]: caller-supplied run inputs
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod parameters;
pub mod role;
pub mod string;
