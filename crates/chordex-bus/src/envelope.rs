//! Wire format. Every field is always present in both directions.

use chordex_common::{BusError, ContextIdentity, MessageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Request(Message),
    Response(Response),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel: String,
    pub method: String,
    pub args: Vec<Value>,
    pub sender: ContextIdentity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: MessageId,
    pub sender: ContextIdentity,
    pub reply: Reply,
}

/// A handler's return value or its error description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    Ok(Value),
    Err(String),
}

impl Reply {
    pub fn into_result(self) -> Result<Value, BusError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err(message) => Err(BusError::Remote(message)),
        }
    }
}

impl From<Result<Value, BusError>> for Reply {
    fn from(result: Result<Value, BusError>) -> Self {
        match result {
            Ok(value) => Reply::Ok(value),
            Err(BusError::Remote(message)) => Reply::Err(message),
            Err(e) => Reply::Err(e.to_string()),
        }
    }
}

impl Envelope {
    pub fn encode(&self) -> Result<String, BusError> {
        serde_json::to_string(self).map_err(|e| BusError::Codec(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, BusError> {
        serde_json::from_str(raw).map_err(|e| BusError::Codec(e.to_string()))
    }
}
