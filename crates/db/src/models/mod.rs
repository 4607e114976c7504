//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and a create DTO for inserts.

pub mod device_session;
pub mod queued_job;
pub mod revoked_token;
