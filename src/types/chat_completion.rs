use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Message;

/// A non-streaming Chat Completions response.
///
/// Only the fields the client reads are modelled; everything else the server
/// sends is ignored.  Fields are optional so that a structurally odd body
/// decodes and is then rejected by [`ChatCompletion::into_message`] with a
/// message that says what was missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The model that produced the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Candidate answers; the client reads the first.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One candidate answer in a [`ChatCompletion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChoiceMessage>,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The message body inside a [`Choice`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceMessage {
    /// Author as the server reported it.  Kept as text so that a provider
    /// using a role name of its own still decodes; the reply is always taken
    /// as the assistant's turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The text.  `null` is treated the same as missing.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Build a response carrying a single assistant message.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![Choice {
                index: 0,
                message: Some(ChoiceMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                }),
                finish_reason: None,
            }],
        }
    }

    /// Extract `choices[0].message` as an assistant [`Message`].
    ///
    /// # Errors
    ///
    /// Returns a serialization error if there are no choices, the first choice has
    /// no message, or the message has no content.
    pub fn into_message(self) -> Result<Message> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::serialization("response has no choices", None))?;
        let message = choice
            .message
            .ok_or_else(|| Error::serialization("choices[0] has no message", None))?;
        let content = message
            .content
            .ok_or_else(|| Error::serialization("choices[0].message has no content", None))?;
        Ok(Message::assistant(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_extracts_first_choice() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-3.5-turbo",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "Other"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }))
        .unwrap();

        assert_eq!(completion.id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(completion.into_message().unwrap(), Message::assistant("Hello"));
    }

    #[test]
    fn completion_without_choices_is_decode_error() {
        let completion: ChatCompletion = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = completion.into_message().unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn completion_with_null_content_is_decode_error() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(completion.into_message().unwrap_err().is_decode());
    }

    #[test]
    fn completion_with_unknown_role_still_decodes() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "model", "content": "42"}}]
        }))
        .unwrap();
        assert_eq!(completion.choices[0].message.as_ref().unwrap().role.as_deref(), Some("model"));
        assert_eq!(completion.into_message().unwrap(), Message::assistant("42"));

        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": null, "content": "43"}}]
        }))
        .unwrap();
        assert_eq!(completion.into_message().unwrap(), Message::assistant("43"));
    }

    #[test]
    fn from_content_round_trips() {
        let message = ChatCompletion::from_content("abc").into_message().unwrap();
        assert_eq!(message, Message::assistant("abc"));
    }
}
