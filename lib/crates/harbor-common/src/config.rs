use serde::Deserialize;

/// Host-level configuration, loaded from `<root>/harbor.yml` when the
/// file exists and defaulted otherwise. Every field has a standalone
/// default so a partial file is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Address apps use to reach the host on the compose network.
    #[serde(default = "default_network_ip")]
    pub network_ip: String,

    /// Device hostname override. When absent the host's own hostname
    /// is used.
    #[serde(default)]
    pub hostname: Option<String>,

    /// Whether the anonymizing-network layer (hidden services) is
    /// enabled for externally-reachable apps.
    #[serde(default)]
    pub remote_access: bool,

    /// Seconds between registry lock acquisition attempts.
    #[serde(default = "default_lock_retry_interval_secs")]
    pub lock_retry_interval_secs: u64,

    /// Number of lock acquisition attempts before giving up.
    #[serde(default = "default_lock_retry_attempts")]
    pub lock_retry_attempts: u32,

    /// Milliseconds between polls for the hidden-service hostname file.
    #[serde(default = "default_hidden_service_poll_interval_millis")]
    pub hidden_service_poll_interval_millis: u64,

    /// Number of hidden-service polls before proceeding without it.
    #[serde(default = "default_hidden_service_poll_attempts")]
    pub hidden_service_poll_attempts: u32,
}

fn default_network_ip() -> String {
    "10.21.0.1".to_owned()
}

fn default_lock_retry_interval_secs() -> u64 {
    1
}

fn default_lock_retry_attempts() -> u32 {
    60
}

fn default_hidden_service_poll_interval_millis() -> u64 {
    500
}

fn default_hidden_service_poll_attempts() -> u32 {
    20
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            network_ip: default_network_ip(),
            hostname: None,
            remote_access: false,
            lock_retry_interval_secs: default_lock_retry_interval_secs(),
            lock_retry_attempts: default_lock_retry_attempts(),
            hidden_service_poll_interval_millis:
                default_hidden_service_poll_interval_millis(),
            hidden_service_poll_attempts: default_hidden_service_poll_attempts(),
        }
    }
}
