use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whatever the client posted to `/jwt`, plus the expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub exp: usize,
}

impl Claims {
    pub fn email(&self) -> Option<&str> {
        self.payload.get("email").and_then(Value::as_str)
    }
}
