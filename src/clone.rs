//! Structural deep clone of payloads.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// The payload could not be converted into a structural JSON value.
#[derive(Debug, Error)]
#[error("payload is not JSON-serializable: {0}")]
pub struct CloneError(#[from] serde_json::Error);

/// Deep-clone `data` by converting it into an owned [`Value`] tree.
///
/// The result shares no structure with the input. A `null` payload (or a
/// type that serializes to `null`, such as `Option::None`) becomes an
/// empty object so downstream merges always see a mapping.
///
/// Non-serializable input (maps with non-string keys, custom `Serialize`
/// failures) is an error; callers decide whether to propagate or degrade.
pub fn deep_clone<T: Serialize + ?Sized>(data: &T) -> Result<Value, CloneError> {
    let value = serde_json::to_value(data)?;
    if value.is_null() {
        Ok(Value::Object(Map::new()))
    } else {
        Ok(value)
    }
}
