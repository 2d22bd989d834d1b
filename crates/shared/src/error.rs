use thiserror::Error;

/// A boundary message whose payload does not have the shape its topic requires.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{topic}: missing argument #{index}")]
    MissingArgument { topic: String, index: usize },
    #[error("{topic}: argument #{index} must be {expected}")]
    InvalidArgument {
        topic: String,
        index: usize,
        expected: &'static str,
    },
    #[error("{topic}: invalid window configuration: {source}")]
    InvalidWindowConfig {
        topic: String,
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn missing(topic: &str, index: usize) -> Self {
        Self::MissingArgument {
            topic: topic.to_string(),
            index,
        }
    }

    pub fn invalid(topic: &str, index: usize, expected: &'static str) -> Self {
        Self::InvalidArgument {
            topic: topic.to_string(),
            index,
            expected,
        }
    }
}
