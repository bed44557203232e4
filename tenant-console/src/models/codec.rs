//! JSON codec between the wire format and the typed tenant models.
//!
//! Absent optional fields stay absent in both directions: nothing is
//! defaulted on decode and nothing is emitted as `null` on encode. Empty
//! strings are kept as given.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

pub fn encode_value<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Decode a response body.
///
/// An empty body or a top-level `null` yields `T::default()` (every field
/// absent) instead of an error; callers check the shape they need.
pub fn decode<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode_value(serde_json::from_slice(body)?)
}

pub fn decode_value<T: DeserializeOwned + Default>(value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::Null => Ok(T::default()),
        value => serde_json::from_value(value),
    }
}
