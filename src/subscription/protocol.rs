use crate::world::Attributes;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Client → Server: `{"<entity>": {<attr>: <value>, ...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMessage {
    pub entity: String,
    pub data: Attributes,
}

/// Why an inbound frame was not applied
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    /// Frame is not JSON or not a single-key `{entity: {...}}` object
    #[error("malformed message: {0}")]
    Parse(String),

    /// The transport failed while reading
    #[error("transport error: {0}")]
    Transport(String),
}

impl InboundError {
    /// Parse errors drop the frame; everything else ends the session
    pub fn is_fatal(&self) -> bool {
        !matches!(self, InboundError::Parse(_))
    }
}

impl From<serde_json::Error> for InboundError {
    fn from(e: serde_json::Error) -> Self {
        InboundError::Parse(e.to_string())
    }
}

impl EntityMessage {
    /// Parse a text frame.
    ///
    /// The top-level object must hold exactly one key and its value must be
    /// an object; anything else is a [`InboundError::Parse`].
    pub fn parse(text: &str) -> Result<Self, InboundError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(packet) = value else {
            return Err(InboundError::Parse("expected a JSON object".to_string()));
        };

        if packet.len() != 1 {
            return Err(InboundError::Parse(format!(
                "expected exactly one entity key, found {}",
                packet.len()
            )));
        }

        let Some((entity, data)) = packet.into_iter().next() else {
            return Err(InboundError::Parse("missing entity key".to_string()));
        };

        match data {
            Value::Object(data) => Ok(Self { entity, data }),
            other => Err(InboundError::Parse(format!(
                "entity '{}' data must be an object, got {}",
                entity,
                json_kind(&other)
            ))),
        }
    }
}

/// Server → Client: serialized `{entity: data}` shared by every queue
pub fn encode_notification(entity: &str, data: &Attributes) -> Result<Arc<str>, serde_json::Error> {
    let mut packet = Map::with_capacity(1);
    packet.insert(entity.to_string(), Value::Object(data.clone()));
    let json = serde_json::to_string(&packet)?;
    Ok(Arc::from(json))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
