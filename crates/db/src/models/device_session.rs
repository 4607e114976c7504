//! Device session model and DTOs.

use casetrace_core::types::{DbId, Timestamp};
use casetrace_core::user_agent::DeviceFingerprint;
use sqlx::FromRow;

/// A row from the `device_sessions` table — one authenticated
/// device/browser pairing for a user.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceSession {
    pub id: DbId,
    pub user_id: DbId,
    pub session_token: String,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub device_type: Option<String>,
    pub device_vendor: Option<String>,
    pub device_model: Option<String>,
    pub ip_address_enc: Option<String>,
    pub location: Option<String>,
    pub is_current_session: bool,
    pub last_active_at: Timestamp,
    pub created_at: Timestamp,
}

impl DeviceSession {
    /// The device-matching key for this row.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint {
            browser_name: self.browser_name.clone(),
            browser_version: self.browser_version.clone(),
            os_name: self.os_name.clone(),
            os_version: self.os_version.clone(),
            device_type: self.device_type.clone(),
            device_vendor: self.device_vendor.clone(),
            device_model: self.device_model.clone(),
        }
    }
}

/// DTO for inserting a new device session.
#[derive(Debug, Clone)]
pub struct NewDeviceSession {
    pub user_id: DbId,
    pub session_token: String,
    pub fingerprint: DeviceFingerprint,
    pub ip_address_enc: Option<String>,
    pub location: Option<String>,
    pub last_active_at: Timestamp,
}
