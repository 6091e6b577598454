use serde::{Deserialize, Serialize};

/// One `data:` payload of a streamed Chat Completions response.
///
/// `choices` is required: a payload without it does not decode and is counted
/// as a skipped chunk by the stream reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Server-assigned identifier, shared by every chunk of one response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Incremental choices; the client reads the first.
    pub choices: Vec<ChunkChoice>,
}

/// One incremental choice inside a [`ChatCompletionChunk`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The new piece of the message.
    #[serde(default)]
    pub delta: Delta,

    /// Set on the last chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The incremental part of a streamed message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Delta {
    /// Sent once, on the first chunk, by most providers.  Any string is
    /// accepted; the client does not act on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The text fragment carried by this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying one content fragment.
    pub fn from_fragment(fragment: impl Into<String>) -> Self {
        Self {
            id: None,
            choices: vec![ChunkChoice {
                index: 0,
                delta: Delta {
                    role: None,
                    content: Some(fragment.into()),
                },
                finish_reason: None,
            }],
        }
    }

    /// Returns true if the chunk carries at least one choice.
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    /// The content fragment of `choices[0].delta`, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }
}
