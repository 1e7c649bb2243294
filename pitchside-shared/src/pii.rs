use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for secrets held in config, such as the gateway key secret and
/// the SMTP password. `Debug` and `Display` print a fixed mask so tracing
/// macros cannot leak the value; serialization passes the inner value
/// through so the wrapper round-trips cleanly from config files.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    /// Unwrap the secret for the one call site that actually needs it.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Short masked preview of a secret for diagnostics. Shows at most the
/// first four characters, never the whole value.
pub fn masked_preview(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}
