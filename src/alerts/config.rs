//! Alert document layout and helper configuration

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::data::{DocId, Document, Value, ID_FIELD};

pub const TYPE_FIELD: &str = "type";
pub const MESSAGE_FIELD: &str = "message";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const HELPER_ID_FIELD: &str = "helperId";

/// Fields the helper writes on every alert
pub const RESERVED_FIELDS: [&str; 4] = [TYPE_FIELD, CREATED_AT_FIELD, HELPER_ID_FIELD, MESSAGE_FIELD];

/// Field consulted first when a message is given as an object
pub const REASON_FIELD: &str = "reason";

/// Built-in alert categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Error,
    Info,
    Success,
    Warning,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Error => "error",
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Warning => "warning",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AlertKind> for Value {
    fn from(kind: AlertKind) -> Self {
        Value::from(kind.as_str())
    }
}

/// How `add` treats a message passed as an object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageExtraction {
    /// Use the object's `reason`, else its `message`, else the object itself
    #[default]
    Extract,
    /// Store the object unchanged, matching older clients that never unwrapped it
    Verbatim,
}

/// How `add` treats `extra` keys that collide with reserved fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReservedFields {
    /// `extra` wins, including over `helperId`
    #[default]
    Overwrite,
    /// Colliding keys are dropped from `extra`
    Protect,
}

/// Behavior switches for an [`AlertHelper`](super::AlertHelper)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelperConfig {
    pub message_extraction: MessageExtraction,
    pub reserved_fields: ReservedFields,
}

impl HelperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_extraction(mut self, mode: MessageExtraction) -> Self {
        self.message_extraction = mode;
        self
    }

    pub fn with_reserved_fields(mut self, policy: ReservedFields) -> Self {
        self.reserved_fields = policy;
        self
    }
}

/// Typed view of an alert document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: DocId,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: Value,
    pub created_at: DateTime<Utc>,
    pub helper_id: f64,
    /// Every other field the caller merged in
    #[serde(flatten)]
    pub extra: Document,
}

impl Alert {
    /// The message as text, when it is a string
    pub fn text(&self) -> Option<&str> {
        self.message.as_str()
    }
}

impl TryFrom<Document> for Alert {
    type Error = AlertDecodeError;

    fn try_from(mut doc: Document) -> Result<Self, Self::Error> {
        let id = doc.id().ok_or(AlertDecodeError::MissingField(ID_FIELD))?;
        doc.remove(ID_FIELD);

        let kind = match doc.remove(TYPE_FIELD) {
            Some(Value::String(s)) => s,
            Some(_) => return Err(AlertDecodeError::invalid(TYPE_FIELD, "string")),
            None => return Err(AlertDecodeError::MissingField(TYPE_FIELD)),
        };

        let created_ms = doc
            .remove(CREATED_AT_FIELD)
            .ok_or(AlertDecodeError::MissingField(CREATED_AT_FIELD))?;
        let created_at = match created_ms {
            Value::Timestamp(ms) | Value::Int64(ms) => Utc.timestamp_millis_opt(ms).single(),
            _ => None,
        }
        .ok_or_else(|| AlertDecodeError::invalid(CREATED_AT_FIELD, "timestamp"))?;

        let helper_id = doc
            .remove(HELPER_ID_FIELD)
            .ok_or(AlertDecodeError::MissingField(HELPER_ID_FIELD))?
            .as_f64()
            .ok_or_else(|| AlertDecodeError::invalid(HELPER_ID_FIELD, "number"))?;

        let message = doc.remove(MESSAGE_FIELD).unwrap_or_default();

        Ok(Self {
            id,
            kind,
            message,
            created_at,
            helper_id,
            extra: doc,
        })
    }
}

impl TryFrom<&Document> for Alert {
    type Error = AlertDecodeError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Alert::try_from(doc.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertDecodeError {
    #[error("Alert field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Alert field '{field}' is not a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

impl AlertDecodeError {
    fn invalid(field: &'static str, expected: &'static str) -> Self {
        AlertDecodeError::InvalidField { field, expected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Document {
        Document::new()
            .with(ID_FIELD, "abc")
            .with(TYPE_FIELD, "error")
            .with(CREATED_AT_FIELD, Value::Timestamp(1_700_000_000_000))
            .with(HELPER_ID_FIELD, 42.5)
            .with(MESSAGE_FIELD, "boom")
            .with("priority", 1)
    }

    #[test]
    fn test_decode_alert() {
        let alert = Alert::try_from(&stored()).unwrap();
        assert_eq!(alert.id.as_str(), "abc");
        assert_eq!(alert.kind, "error");
        assert_eq!(alert.text(), Some("boom"));
        assert_eq!(alert.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(alert.helper_id, 42.5);
        assert_eq!(alert.extra.get("priority"), Some(&Value::Int64(1)));
        assert_eq!(alert.extra.len(), 1);
    }

    #[test]
    fn test_decode_errors() {
        let mut doc = stored();
        doc.remove(HELPER_ID_FIELD);
        assert!(matches!(
            Alert::try_from(doc),
            Err(AlertDecodeError::MissingField(HELPER_ID_FIELD))
        ));

        let doc = stored().with(CREATED_AT_FIELD, "yesterday");
        assert!(matches!(
            Alert::try_from(doc),
            Err(AlertDecodeError::InvalidField { field: CREATED_AT_FIELD, .. })
        ));
    }

    #[test]
    fn test_serialize_alert() {
        let alert = Alert::try_from(stored()).unwrap();
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["helperId"], 42.5);
        assert_eq!(json["priority"], 1);
    }

    #[test]
    fn test_config_builder() {
        let config = HelperConfig::new()
            .with_message_extraction(MessageExtraction::Verbatim)
            .with_reserved_fields(ReservedFields::Protect);
        assert_eq!(config.message_extraction, MessageExtraction::Verbatim);
        assert_eq!(config.reserved_fields, ReservedFields::Protect);
        assert_eq!(HelperConfig::default().message_extraction, MessageExtraction::Extract);
    }
}
