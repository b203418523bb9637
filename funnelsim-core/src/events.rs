//! ## funnelsim-core::events
//! **Immutable analytics event records**
//!
//! An `Event` is produced once by the journey simulator and handed on to
//! the driver and then to a sink. Nothing mutates it after creation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of user action an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Click,
    ExperimentAssignment,
    Signup,
    Purchase,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::PageView,
        EventType::Click,
        EventType::ExperimentAssignment,
        EventType::Signup,
        EventType::Purchase,
    ];

    /// Wire name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::Click => "click",
            EventType::ExperimentAssignment => "experiment_assignment",
            EventType::Signup => "signup",
            EventType::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single property value attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Ordered property map; `BTreeMap` keeps serialized output stable.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique within a run (32 lowercase hex characters).
    pub event_id: String,
    pub user_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub properties: Properties,
}

impl Event {
    pub fn new(
        event_id: String,
        user_id: impl Into<String>,
        event_type: EventType,
        timestamp: DateTime<Utc>,
        properties: Properties,
    ) -> Self {
        Self {
            event_id,
            user_id: user_id.into(),
            event_type,
            timestamp,
            properties,
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Text property lookup; `None` if absent or numeric.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(PropertyValue::as_str)
    }
}
