use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    config::NotificationDefaults,
    error::AgentError,
    model::{Notification, NotificationOptions},
};

/// The json sent by the push server
///
/// Every field is optional. There's no schema version, unknown fields are
/// ignored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    fields: Map<String, Value>,
}

impl PushPayload {
    /// Parses the raw push data
    ///
    /// No data is an empty payload. Data that isn't json fails, as does a json
    /// `null` since nothing can be read from it. Other non-object json values
    /// carry no fields
    pub fn parse(data: Option<&str>) -> Result<Self, AgentError> {
        let Some(data) = data else {
            return Ok(Self::default());
        };

        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(Value::Null) => Err(AgentError::PushPayload("payload is null".to_string())),
            Ok(_) => Ok(Self::default()),
            Err(e) => Err(AgentError::PushPayload(e.to_string())),
        }
    }

    /// Falsy values (missing, `null`, `false`, `0`, `""`) fall back to the
    /// default. Anything else is converted the way a browser would show it
    fn text_or(&self, key: &str, default: &str) -> String {
        match self.fields.get(key) {
            Some(v) if is_truthy(v) => display_text(v),
            _ => default.to_string(),
        }
    }

    pub fn title(&self, defaults: &NotificationDefaults) -> String {
        self.text_or("title", &defaults.title)
    }

    pub fn body(&self, defaults: &NotificationDefaults) -> String {
        self.text_or("body", &defaults.body)
    }

    /// Only a non-empty string is accepted as an icon url
    pub fn icon(&self, defaults: &NotificationDefaults) -> String {
        match self.fields.get("icon") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => defaults.icon.clone(),
        }
    }

    /// When the server sent the message, if it said
    pub fn sent(&self) -> Option<DateTime<Utc>> {
        let sent = self.fields.get("sent")?.as_str()?;
        DateTime::parse_from_rfc3339(sent).ok().map(|d| d.with_timezone(&Utc))
    }

    pub fn into_notification(self, defaults: &NotificationDefaults) -> Notification {
        Notification {
            title: self.title(defaults),
            options: NotificationOptions {
                body: self.body(defaults),
                icon: self.icon(defaults),
                badge: defaults.badge.clone(),
                tag: defaults.tag.clone(),
                renotify: defaults.renotify,
                timestamp: self.sent(),
            },
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JS string conversion: arrays join their elements with commas (`null`
/// elements are empty) and objects become `[object Object]`
fn display_text(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                item => display_text(item),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn notification(data: Option<&str>) -> Result<Notification, AgentError> {
        Ok(PushPayload::parse(data)?.into_notification(&NotificationDefaults::default()))
    }

    #[test]
    fn test_title_and_body_from_payload() {
        let n = notification(Some(r#"{"title":"T","body":"B"}"#)).unwrap();
        assert_eq!(n.title, "T");
        assert_eq!(n.options.body, "B");
        assert_eq!(n.options.tag, "workout-notification");
        assert!(n.options.renotify);
        assert_eq!(n.options.timestamp, None);
    }

    #[test]
    fn test_no_payload_uses_defaults() {
        let n = notification(None).unwrap();
        assert_eq!(n.title, "Calistenia App");
        assert_eq!(n.options.body, "Tu entrenamiento continua!");
        assert_eq!(n.options.icon, "https://placehold.co/192x192/18181b/ffffff?text=APP");
        assert_eq!(n.options.badge, "https://placehold.co/48x48/18181b/ffffff?text=APP");
    }

    #[test]
    fn test_falsy_fields_use_defaults() {
        let n = notification(Some(r#"{"title":"","body":0}"#)).unwrap();
        assert_eq!(n.title, "Calistenia App");
        assert_eq!(n.options.body, "Tu entrenamiento continua!");

        let n = notification(Some(r#"{"title":null,"body":false}"#)).unwrap();
        assert_eq!(n.title, "Calistenia App");
        assert_eq!(n.options.body, "Tu entrenamiento continua!");
    }

    #[test]
    fn test_non_string_fields_are_rendered() {
        let n = notification(Some(r#"{"title":42,"body":true}"#)).unwrap();
        assert_eq!(n.title, "42");
        assert_eq!(n.options.body, "true");

        let n = notification(Some(r#"{"title":["a","b"],"body":{"a":1}}"#)).unwrap();
        assert_eq!(n.title, "a,b");
        assert_eq!(n.options.body, "[object Object]");

        let n = notification(Some(r#"{"title":[1.0,null,[2,"x"]],"body":2.5}"#)).unwrap();
        assert_eq!(n.title, "1,,2,x");
        assert_eq!(n.options.body, "2.5");
    }

    #[test]
    fn test_non_object_payload_uses_defaults() {
        for data in ["42", r#""hello""#, "[1,2]", "true"] {
            let n = notification(Some(data)).unwrap();
            assert_eq!(n.title, "Calistenia App", "payload {data}");
        }
    }

    #[test]
    fn test_malformed_and_null_payloads_fail() {
        for data in ["{not json", "", "null"] {
            assert!(
                matches!(notification(Some(data)), Err(AgentError::PushPayload(_))),
                "payload {data:?}"
            );
        }
    }

    #[test]
    fn test_icon_and_sent() {
        let n = notification(Some(
            r#"{"icon":"/favicon.ico","sent":"2024-05-01T10:00:00Z","title":"T"}"#,
        ))
        .unwrap();
        assert_eq!(n.options.icon, "/favicon.ico");
        assert_eq!(n.options.timestamp, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));

        let n = notification(Some(r#"{"icon":7,"sent":"yesterday"}"#)).unwrap();
        assert_eq!(n.options.icon, "https://placehold.co/192x192/18181b/ffffff?text=APP");
        assert_eq!(n.options.timestamp, None);
    }
}
