//! Single place where backend payload shapes are flattened.
//!
//! The backend answers collections as bare arrays, `null`, or envelopes
//! keyed by one of [`ENVELOPE_KEYS`]; errors carry `msg` or `message`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::BackendError;
use crate::workflows::availability::AvailabilitySnapshot;

pub const ENVELOPE_KEYS: [&str; 6] = ["items", "listings", "requests", "slots", "data", "organizations"];

const REVISION_KEYS: [&str; 3] = ["revision", "version", "updatedAt"];

/// Decode a collection; entries that fail to decode are logged and skipped.
pub fn collection<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, BackendError> {
    let items = match unwrap_collection(value)? {
        Some(items) => items,
        None => return Ok(Vec::new()),
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(index, error = %err, "skipping undecodable backend entry");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(kept = decoded.len(), total, "backend collection partially decoded");
    }
    Ok(decoded)
}

fn unwrap_collection(value: Value) -> Result<Option<Vec<Value>>, BackendError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                match map.remove(key) {
                    Some(Value::Array(items)) => return Ok(Some(items)),
                    Some(Value::Null) => return Ok(None),
                    Some(nested @ Value::Object(_)) => return unwrap_collection(nested),
                    Some(_) | None => continue,
                }
            }
            Err(BackendError::Decode(format!(
                "expected an array or an envelope keyed by one of {ENVELOPE_KEYS:?}"
            )))
        }
        other => Err(BackendError::Decode(format!(
            "expected a collection, got {}",
            kind_of(&other)
        ))),
    }
}

const ENTITY_KEYS: [&str; 5] = ["data", "user", "request", "pet", "listing"];

/// Decode a single entity, unwrapping `{data: ..}`-style wrappers that carry no id of their own.
pub fn entity<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(unwrap_entity(value)).map_err(|err| BackendError::Decode(err.to_string()))
}

fn unwrap_entity(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("_id") && !map.contains_key("id") => {
            let key = ENTITY_KEYS
                .iter()
                .find(|key| matches!(map.get(**key), Some(Value::Object(_))));
            match key {
                Some(key) => map.remove(*key).map(unwrap_entity).unwrap_or(Value::Null),
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

/// Availability arrives as a bare slot array or as `{slots, revision}`.
pub fn availability_snapshot(value: Value) -> Result<AvailabilitySnapshot, BackendError> {
    let revision = match &value {
        Value::Object(map) => REVISION_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(revision_text),
        _ => None,
    };
    let slots = collection(value)?;
    Ok(AvailabilitySnapshot::new(slots, revision))
}

fn revision_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Human message from an error body, falling back to the status reason.
pub fn error_message(body: &str, fallback: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["msg", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('{') && !trimmed.starts_with('<'))
                .then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
