use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{CallId, WindowConfig},
    error::ProtocolError,
};

pub const WINDOW_STATE_REQUEST: &str = "window-state-request";
pub const WINDOW_STATE_INFO: &str = "window-state-info";
pub const COMMAND: &str = "command";
pub const REQUEST_ACTION: &str = "request-action";
pub const SYSTEM_THEME_CHANGED: &str = "system-theme-changed";
pub const APP_NAVIGATE: &str = "app-navigate";
pub const WINDOW_RELOADING: &str = "window-reloading";
pub const FATAL_ERROR: &str = "fatal-error";
/// Replies to calls this process issued.
pub const CALL_REPLY: &str = "call-reply";
/// Replies this process authors for remote-call commands.
pub const CURRENT_TABS_COUNT: &str = "current-tabs-count";
pub const REQUEST_DATA: &str = "request-data";
pub const TAB_ACTIVATED: &str = "tab-activated";

/// The unit crossing the process boundary: a topic plus positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMessage {
    pub topic: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BoundaryMessage {
    pub fn new(topic: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            topic: topic.into(),
            args,
        }
    }
}

/// Wire form of a correlated answer: `(id, isError, ...args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyFrame {
    pub id: CallId,
    pub is_error: bool,
    pub args: Vec<Value>,
}

impl ReplyFrame {
    pub fn ok(id: CallId, args: Vec<Value>) -> Self {
        Self {
            id,
            is_error: false,
            args,
        }
    }

    pub fn err(id: CallId, args: Vec<Value>) -> Self {
        Self {
            id,
            is_error: true,
            args,
        }
    }

    pub fn parse(topic: &str, args: Vec<Value>) -> Result<Self, ProtocolError> {
        let mut args = args.into_iter();
        let id = args
            .next()
            .ok_or_else(|| ProtocolError::missing(topic, 0))?
            .as_u64()
            .ok_or_else(|| ProtocolError::invalid(topic, 0, "an unsigned integer call id"))?;
        let is_error = args
            .next()
            .ok_or_else(|| ProtocolError::missing(topic, 1))?
            .as_bool()
            .ok_or_else(|| ProtocolError::invalid(topic, 1, "a boolean error flag"))?;
        Ok(Self {
            id: CallId(id),
            is_error,
            args: args.collect(),
        })
    }

    pub fn into_args(self) -> Vec<Value> {
        let mut args = Vec::with_capacity(self.args.len() + 2);
        args.push(Value::from(self.id.0));
        args.push(Value::Bool(self.is_error));
        args.extend(self.args);
        args
    }

    /// Splits the frame into its id and the settled value, tagged as success
    /// or failure by the error flag.
    pub fn into_outcome(self) -> (CallId, Result<Value, Value>) {
        let value = settle_value(self.args);
        if self.is_error {
            (self.id, Err(value))
        } else {
            (self.id, Ok(value))
        }
    }
}

/// One argument settles to itself, several to the ordered list, none to null.
pub fn settle_value(mut args: Vec<Value>) -> Value {
    match args.len() {
        0 => Value::Null,
        1 => args.remove(0),
        _ => Value::Array(args),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    WindowStateInfo(WindowConfig),
    Command { name: String, args: Vec<Value> },
    RequestAction { name: String, args: Vec<Value> },
    SystemThemeChanged { dark_mode: bool },
    AppNavigate { detail: Value },
    Reply(ReplyFrame),
    Unhandled { topic: String, args: Vec<Value> },
}

impl InboundMessage {
    pub fn parse(message: BoundaryMessage) -> Result<Self, ProtocolError> {
        let BoundaryMessage { topic, args } = message;
        match topic.as_str() {
            WINDOW_STATE_INFO => {
                let raw = args
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProtocolError::missing(&topic, 0))?;
                let config = serde_json::from_value(raw).map_err(|source| {
                    ProtocolError::InvalidWindowConfig {
                        topic: topic.clone(),
                        source,
                    }
                })?;
                Ok(Self::WindowStateInfo(config))
            }
            COMMAND => {
                let (name, args) = split_name(&topic, args)?;
                Ok(Self::Command { name, args })
            }
            REQUEST_ACTION => {
                let (name, args) = split_name(&topic, args)?;
                Ok(Self::RequestAction { name, args })
            }
            SYSTEM_THEME_CHANGED => {
                let dark_mode = args
                    .first()
                    .ok_or_else(|| ProtocolError::missing(&topic, 0))?
                    .as_bool()
                    .ok_or_else(|| ProtocolError::invalid(&topic, 0, "a boolean"))?;
                Ok(Self::SystemThemeChanged { dark_mode })
            }
            APP_NAVIGATE => Ok(Self::AppNavigate {
                detail: args.into_iter().next().unwrap_or(Value::Null),
            }),
            CALL_REPLY => Ok(Self::Reply(ReplyFrame::parse(&topic, args)?)),
            _ => Ok(Self::Unhandled { topic, args }),
        }
    }
}

fn split_name(topic: &str, args: Vec<Value>) -> Result<(String, Vec<Value>), ProtocolError> {
    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        Some(_) => return Err(ProtocolError::invalid(topic, 0, "a string name")),
        None => return Err(ProtocolError::missing(topic, 0)),
    };
    Ok((name, args.collect()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    WindowStateRequest,
    WindowReloading,
    FatalError { message: String },
    Reply {
        topic: &'static str,
        frame: ReplyFrame,
    },
}

impl OutboundMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::WindowStateRequest => WINDOW_STATE_REQUEST,
            Self::WindowReloading => WINDOW_RELOADING,
            Self::FatalError { .. } => FATAL_ERROR,
            Self::Reply { topic, .. } => *topic,
        }
    }
}

impl From<OutboundMessage> for BoundaryMessage {
    fn from(value: OutboundMessage) -> Self {
        let topic = value.topic();
        let args = match value {
            OutboundMessage::WindowStateRequest | OutboundMessage::WindowReloading => Vec::new(),
            OutboundMessage::FatalError { message } => vec![Value::String(message)],
            OutboundMessage::Reply { frame, .. } => frame.into_args(),
        };
        BoundaryMessage::new(topic, args)
    }
}
