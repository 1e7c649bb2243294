use serde::Deserialize;

/// Booking engine knobs, loaded once from configuration and handed to
/// constructors. Nothing in the engine reads the process environment.
#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_pending_ttl() -> u64 {
    900
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_currency() -> String {
    "INR".to_string()
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            pending_ttl_seconds: default_pending_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            currency: default_currency(),
        }
    }
}
