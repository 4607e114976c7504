//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod device_session_repo;
pub mod revoked_token_repo;
pub mod session_job_repo;

pub use device_session_repo::DeviceSessionRepo;
pub use revoked_token_repo::RevokedTokenRepo;
pub use session_job_repo::SessionJobRepo;
