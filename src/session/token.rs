use serde_json::Value;
use uuid::Uuid;

use crate::correlator::Token;

/// Generate a fresh correlation token.
///
/// UUIDv4 keeps tokens unique across concurrent calls and across client
/// restarts without any persisted counter state.
pub fn fresh_token() -> Token {
    Uuid::new_v4().to_string()
}

/// How a correlation token travels inside a payload.
///
/// Wire formats vary, so embedding the token into an outgoing request and
/// extracting it from a raw inbound payload are pluggable. The session
/// and the delivery pump share one scheme so both sides agree on the
/// convention.
pub trait TokenScheme: Send + Sync {
    /// Produce the outgoing payload with `token` embedded in it.
    fn embed(&self, token: &str, payload: &Value) -> Value;

    /// Pull the token out of an inbound payload, if it carries one.
    ///
    /// Takes the already-parsed payload so the delivery pump decodes each
    /// inbound message exactly once.
    fn extract(&self, payload: &Value) -> Option<Token>;
}

/// Default convention: the token lives in a named field of a JSON object.
///
/// Non-object request payloads are wrapped as
/// `{ <field>: token, "body": payload }` so the token always has a place
/// to live.
#[derive(Debug, Clone)]
pub struct JsonField {
    field: String,
}

impl JsonField {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

impl Default for JsonField {
    fn default() -> Self {
        Self::new("correlation_id")
    }
}

impl TokenScheme for JsonField {
    fn embed(&self, token: &str, payload: &Value) -> Value {
        match payload {
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert(self.field.clone(), Value::String(token.to_string()));
                Value::Object(map)
            }
            other => serde_json::json!({
                &self.field: token,
                "body": other,
            }),
        }
    }

    fn extract(&self, payload: &Value) -> Option<Token> {
        payload
            .get(&self.field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
