//! Vision manager replies and their validation
//!
//! A reply is either already decoded JSON or raw bytes. Raw bytes are only
//! decoded when they look like a JSON object (first byte `{`, last byte
//! `}`); anything else, such as an image blob, is handed back untouched.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{TransportError, VisionError};

/// Key a reply uses to report a failure
pub const ERROR_KEY: &str = "error";

/// A reply from the vision manager
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Reply decoded as JSON
    Json(Value),
    /// Reply kept as raw bytes
    Raw(Bytes),
}

impl Response {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(value) => Some(value),
            Response::Raw(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Response::Json(value) => Some(value),
            Response::Raw(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Response::Json(_) => None,
            Response::Raw(bytes) => Some(bytes),
        }
    }

    /// Look up a top-level field of a JSON reply
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|value| value.get(key))
    }
}

/// Check a reply for protocol-level errors.
///
/// `command` names the command the reply belongs to and is only used in
/// error messages. Decoded raw replies come back as [`Response::Json`].
pub fn validate_response(response: Response, command: &str) -> Result<Response, VisionError> {
    match response {
        Response::Json(value) => {
            check_error(&value)?;
            Ok(Response::Json(value))
        }
        Response::Raw(bytes) => {
            if looks_like_json_object(&bytes) {
                let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                    VisionError::communication(command, TransportError::MalformedReply(e))
                })?;
                check_error(&value)?;
                if is_empty_object(&value) {
                    return Err(VisionError::EmptyResponse {
                        command: command.to_owned(),
                    });
                }
                return Ok(Response::Json(value));
            }

            if bytes.is_empty() {
                return Err(VisionError::EmptyResponse {
                    command: command.to_owned(),
                });
            }

            Ok(Response::Raw(bytes))
        }
    }
}

/// Sniff only the first and last byte; never attempt a full parse.
fn looks_like_json_object(bytes: &[u8]) -> bool {
    matches!((bytes.first(), bytes.last()), (Some(b'{'), Some(b'}')))
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(fields) if fields.is_empty())
}

fn check_error(value: &Value) -> Result<(), VisionError> {
    let Some(error) = value.get(ERROR_KEY) else {
        return Ok(());
    };

    match error {
        Value::Object(fields) => Err(VisionError::Structured {
            desc: field_text(fields.get("desc")),
            error_type: field_text(fields.get("type")),
        }),
        other => Err(VisionError::Unknown { raw: other.clone() }),
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
