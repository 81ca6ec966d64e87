//! Realtime Message Types
//!
//! Frames pushed by the backend on `/ws/realtime` look like
//! `{"type": "<tag>", "payload": {...}, "timestamp": "..."}`.
//! The payload is kept as untouched JSON; typed views are decoded on demand.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::DecodeError;

/// The five event tags the dashboard understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoiUpdate,
    NewRecommendation,
    AutomationResult,
    CompetitiveUpdate,
    PredictionUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::RoiUpdate,
        EventKind::NewRecommendation,
        EventKind::AutomationResult,
        EventKind::CompetitiveUpdate,
        EventKind::PredictionUpdate,
    ];

    /// Map a wire tag to a known kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "roi_update" => Some(EventKind::RoiUpdate),
            "new_recommendation" => Some(EventKind::NewRecommendation),
            "automation_result" => Some(EventKind::AutomationResult),
            "competitive_update" => Some(EventKind::CompetitiveUpdate),
            "prediction_update" => Some(EventKind::PredictionUpdate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RoiUpdate => "roi_update",
            EventKind::NewRecommendation => "new_recommendation",
            EventKind::AutomationResult => "automation_result",
            EventKind::CompetitiveUpdate => "competitive_update",
            EventKind::PredictionUpdate => "prediction_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded event with a recognized tag
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub payload: Value,
    pub timestamp: Option<DateTime<Utc>>,
}

impl InboundEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self {
            kind,
            payload,
            timestamp: None,
        }
    }

    /// Decode the payload into one of the typed views below
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        parse_payload(self.kind, self.payload.clone())
    }
}

/// Result of decoding one text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(InboundEvent),
    /// Well-formed frame whose tag has no handler slot (e.g. `connection_established`)
    Unrecognized { tag: String },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Decode a text frame
pub fn decode(text: &str) -> Result<Inbound, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    let Some(kind) = EventKind::from_tag(&envelope.tag) else {
        return Ok(Inbound::Unrecognized { tag: envelope.tag });
    };

    let timestamp = envelope
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Inbound::Event(InboundEvent {
        kind,
        payload: envelope.payload,
        timestamp,
    }))
}

/// Decode a payload of the given kind into a typed view
pub fn parse_payload<T: DeserializeOwned>(kind: EventKind, payload: Value) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(|error| DecodeError::Payload { kind, error })
}

/// Direction of the ROI trend, used as the display class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Negative,
    #[serde(other)]
    Stable,
}

impl Trend {
    pub fn as_class(&self) -> &'static str {
        match self {
            Trend::Positive => "positive",
            Trend::Negative => "negative",
            Trend::Stable => "stable",
        }
    }
}

/// `roi_update` payload
///
/// Numbers may arrive as JSON numbers or numeric strings (`"15.75"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiUpdate {
    #[serde(deserialize_with = "number_or_string")]
    pub current: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub predicted: f64,
    pub trend: Trend,
    #[serde(deserialize_with = "number_or_string")]
    pub network_average: f64,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub change_24h: Option<f64>,
}

/// `automation_result` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationResult {
    pub recommendation_id: String,
    pub success: bool,
    #[serde(default)]
    pub roi_impact: f64,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub message: String,
}

/// One row of a `competitive_update` payload (the payload is a list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveMetric {
    pub metric: String,
    pub dazno_value: String,
    pub competitor_value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {:?}", s))),
        }
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn optional_number_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}
