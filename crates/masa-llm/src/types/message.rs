use serde::{Deserialize, Serialize};

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System { content: String },

    /// Customer message
    User { content: String },

    /// Assistant reply
    Assistant { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant { content: content.into() }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::User { content } | Self::Assistant { content } => content,
        }
    }
}
