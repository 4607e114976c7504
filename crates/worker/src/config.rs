/// Worker configuration loaded from environment variables.
///
/// All fields except the IP encryption key have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 64-hex-char AES-256 key for IP address encryption at rest.
    pub ip_encryption_key: String,
    /// Whether trackers schedule deferred inactivity checks
    /// (default: `true`). Disabled in test environments so runs do not
    /// accumulate deferred jobs.
    pub schedule_checks: bool,
    /// Seconds between revocation cache syncs (default: `3600`).
    pub revocation_sync_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `IP_ENCRYPTION_KEY`        | (required) |
    /// | `SCHEDULE_INACTIVITY_CHECKS` | `true`   |
    /// | `REVOCATION_SYNC_SECS`     | `3600`     |
    pub fn from_env() -> Self {
        let ip_encryption_key =
            std::env::var("IP_ENCRYPTION_KEY").expect("IP_ENCRYPTION_KEY must be set");

        let schedule_checks: bool = std::env::var("SCHEDULE_INACTIVITY_CHECKS")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("SCHEDULE_INACTIVITY_CHECKS must be true or false");

        let revocation_sync_secs: u64 = std::env::var("REVOCATION_SYNC_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("REVOCATION_SYNC_SECS must be a valid u64");

        Self {
            ip_encryption_key,
            schedule_checks,
            revocation_sync_secs,
        }
    }
}
