use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body of a `POST {base_url}/chat/completions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier, passed through verbatim.
    pub model: String,

    /// The conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Sampling temperature in `[0, 2]`.
    pub temperature: f32,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,

    /// Whether the server should answer with a server-sent-event stream.
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a new non-streaming request.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
            stream: false,
        }
    }

    /// Set whether the response is streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = ChatCompletionRequest::new(
            "gpt-3.5-turbo",
            vec![Message::system("Be brief."), Message::user("Hi")],
            0.5,
            2048,
        )
        .with_stream(true);

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ],
                "temperature": 0.5,
                "max_tokens": 2048,
                "stream": true
            })
        );
    }
}
