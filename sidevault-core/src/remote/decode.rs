//! Validated decoding of secret store responses.

use serde_json::{Map, Value};

use super::ServiceError;
use crate::model::{Credential, RenewedLease, TokenStatus};
use crate::secret::Secret;

fn decode_error(message: impl Into<String>) -> ServiceError {
    ServiceError::Decode {
        message: message.into(),
    }
}

fn object<'a>(body: &'a Value, key: &str) -> Result<&'a Map<String, Value>, ServiceError> {
    match body.get(key) {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Null) | None => Err(decode_error(format!("response has no {:?} block", key))),
        Some(_) => Err(decode_error(format!("{:?} is not an object", key))),
    }
}

fn seconds(map: &Map<String, Value>, field: &str) -> Result<u64, ServiceError> {
    let value = map
        .get(field)
        .ok_or_else(|| decode_error(format!("missing field {:?}", field)))?;
    value.as_u64().ok_or_else(|| {
        decode_error(format!(
            "field {:?} is not a non-negative integer: {}",
            field, value
        ))
    })
}

fn string<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a str, ServiceError> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) => Err(decode_error(format!("field {:?} is empty", field))),
        Some(_) => Err(decode_error(format!("field {:?} is not a string", field))),
        None => Err(decode_error(format!("missing field {:?}", field))),
    }
}

/// Decode a login response: `{"auth": {"client_token": .., "accessor": ..}}`.
pub fn credential(body: &Value) -> Result<Credential, ServiceError> {
    let auth = object(body, "auth")?;
    let token = string(auth, "client_token")?;
    let accessor = string(auth, "accessor")?;
    Ok(Credential::new(Secret::new(token), accessor))
}

/// Decode a self-lookup response: `{"data": {"creation_ttl": .., "ttl": ..}}`.
pub fn token_status(body: &Value) -> Result<TokenStatus, ServiceError> {
    let data = object(body, "data")?;
    Ok(TokenStatus::new(
        seconds(data, "creation_ttl")?,
        seconds(data, "ttl")?,
    ))
}

/// Decode a self-renew response: `{"auth": {"lease_duration": .., "renewable": ..}}`.
pub fn renewed_lease(body: &Value) -> Result<RenewedLease, ServiceError> {
    let auth = object(body, "auth")?;
    let lease_duration = seconds(auth, "lease_duration")?;
    let renewable = match auth.get("renewable") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(decode_error(format!(
                "field \"renewable\" is not a boolean: {}",
                other
            )));
        }
    };
    Ok(RenewedLease {
        lease_duration,
        renewable,
    })
}

/// Extract the `{"errors": [...]}` messages from an error body, if any.
pub fn error_messages(body: &Value) -> Vec<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| match e.as_str() {
                    Some(s) => s.to_string(),
                    None => e.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
