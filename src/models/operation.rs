use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single edit intent or presence update submitted by a session.
///
/// Positions and lengths are counted in characters. `client_version` is the
/// document version the client believed current when it produced the edit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Insert {
        position: usize,
        content: String,
        #[serde(default)]
        client_version: u64,
    },
    #[serde(rename_all = "camelCase")]
    Delete {
        position: usize,
        length: usize,
        #[serde(default)]
        client_version: u64,
    },
    Replace {
        content: String,
    },
    Cursor {
        position: usize,
    },
}

/// Reasons an inbound operation is refused before it reaches the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Operation must be an object")]
    NotAnObject,
    #[error("Operation type is missing")]
    MissingType,
    #[error("Unknown operation type '{0}'")]
    UnknownType(String),
    #[error("Position must be a non-negative number")]
    InvalidPosition,
    #[error("Length must be a non-negative number")]
    InvalidLength,
    #[error("Content must be a string")]
    InvalidContent,
    #[error("Content exceeds the maximum size of {0} characters")]
    ContentTooLarge(usize),
}

impl Operation {
    /// Validate a raw JSON operation and turn it into a typed one.
    pub fn parse(raw: &Value, max_content_size: usize) -> Result<Self, ValidationError> {
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingType)?;

        match kind {
            "insert" => Ok(Operation::Insert {
                position: parse_position(obj.get("position"))?,
                content: parse_content(obj.get("content"), max_content_size)?,
                client_version: parse_client_version(obj.get("clientVersion")),
            }),
            "delete" => Ok(Operation::Delete {
                position: parse_position(obj.get("position"))?,
                length: parse_count(obj.get("length")).ok_or(ValidationError::InvalidLength)?,
                client_version: parse_client_version(obj.get("clientVersion")),
            }),
            "replace" => Ok(Operation::Replace {
                content: parse_content(obj.get("content"), max_content_size)?,
            }),
            "cursor" => Ok(Operation::Cursor {
                position: parse_position(obj.get("position"))?,
            }),
            other => Err(ValidationError::UnknownType(other.to_string())),
        }
    }
}

/// Validate a cursor position carried outside of an operation object.
pub fn parse_position(value: Option<&Value>) -> Result<usize, ValidationError> {
    parse_count(value).ok_or(ValidationError::InvalidPosition)
}

// Fractional numbers are floored, anything negative or non-numeric is refused.
fn parse_count(value: Option<&Value>) -> Option<usize> {
    let number = value?.as_f64()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.floor() as usize)
}

fn parse_content(value: Option<&Value>, max_content_size: usize) -> Result<String, ValidationError> {
    let content = value
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidContent)?;
    if content.chars().count() > max_content_size {
        return Err(ValidationError::ContentTooLarge(max_content_size));
    }
    Ok(content.to_string())
}

// An absent or malformed client version means "I have seen nothing".
fn parse_client_version(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAX: usize = 100;

    #[test]
    fn parses_insert_with_default_client_version() {
        let op = Operation::parse(&json!({"type": "insert", "position": 3, "content": "abc"}), MAX).unwrap();
        assert_eq!(
            op,
            Operation::Insert { position: 3, content: "abc".to_string(), client_version: 0 }
        );
    }

    #[test]
    fn parses_delete_and_floors_fractions() {
        let op = Operation::parse(
            &json!({"type": "delete", "position": 2.7, "length": 4, "clientVersion": 9}),
            MAX,
        )
        .unwrap();
        assert_eq!(op, Operation::Delete { position: 2, length: 4, client_version: 9 });
    }

    #[test]
    fn rejects_malformed_operations() {
        assert_eq!(Operation::parse(&json!("insert"), MAX), Err(ValidationError::NotAnObject));
        assert_eq!(Operation::parse(&json!({"position": 1}), MAX), Err(ValidationError::MissingType));
        assert_eq!(
            Operation::parse(&json!({"type": "explode"}), MAX),
            Err(ValidationError::UnknownType("explode".to_string()))
        );
        assert_eq!(
            Operation::parse(&json!({"type": "insert", "position": -1, "content": "x"}), MAX),
            Err(ValidationError::InvalidPosition)
        );
        assert_eq!(
            Operation::parse(&json!({"type": "insert", "position": "1", "content": "x"}), MAX),
            Err(ValidationError::InvalidPosition)
        );
        assert_eq!(
            Operation::parse(&json!({"type": "insert", "position": 1, "content": 5}), MAX),
            Err(ValidationError::InvalidContent)
        );
        assert_eq!(
            Operation::parse(&json!({"type": "delete", "position": 1, "length": -3}), MAX),
            Err(ValidationError::InvalidLength)
        );
        assert_eq!(
            Operation::parse(&json!({"type": "delete", "position": 1}), MAX),
            Err(ValidationError::InvalidLength)
        );
        assert_eq!(
            Operation::parse(&json!({"type": "cursor", "position": null}), MAX),
            Err(ValidationError::InvalidPosition)
        );
    }

    #[test]
    fn rejects_oversized_content() {
        let big = "x".repeat(MAX + 1);
        assert_eq!(
            Operation::parse(&json!({"type": "replace", "content": big}), MAX),
            Err(ValidationError::ContentTooLarge(MAX))
        );
        let fits = "é".repeat(MAX);
        assert!(Operation::parse(&json!({"type": "replace", "content": fits}), MAX).is_ok());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let op = Operation::Delete { position: 1, length: 2, client_version: 3 };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"type": "delete", "position": 1, "length": 2, "clientVersion": 3})
        );
    }
}
