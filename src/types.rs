//! Data types for the keyvalue client

use serde::{Deserialize, Serialize};

/// The pair that addresses one remote slot.
///
/// Serializes as `{"token": "...", "key": "..."}` so callers can keep it
/// somewhere and rebuild a handle later with
/// [`KeyValue::with_credentials`](crate::KeyValue::with_credentials).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    /// Opaque token assigned by the service when the slot was created
    pub token: String,
    /// Key name chosen by the caller
    pub key: String,
}

impl Credentials {
    /// Bundle a token and key
    pub fn new(token: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_json_shape() {
        let credentials = Credentials::new("0123456", "some-key");
        let json = serde_json::to_string(&credentials).unwrap();
        assert_eq!(json, r#"{"token":"0123456","key":"some-key"}"#);

        let parsed: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, credentials);
    }
}
