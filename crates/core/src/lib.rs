//! Pure domain logic for the casetrace session lifecycle subsystem.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the pipeline handlers, and any future CLI tooling.

pub mod crypto;
pub mod error;
pub mod lifecycle;
pub mod types;
pub mod user_agent;
