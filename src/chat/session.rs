//! Core chat session management.
//!
//! A [`ChatSession`] owns the conversation history and the request
//! configuration.  `ask` is a stateless single turn; `chat` is a stateful turn
//! that commits the user message and the reply together, and only on success.

use crate::chat::config::ChatConfig;
use crate::client::{ChatClient, Transport};
use crate::config::Settings;
use crate::error::Result;
use crate::observability::{SESSION_FAILED_TURNS, SESSION_TURNS};
use crate::render::Renderer;
use crate::types::{ChatCompletionRequest, Message};

/// A chat session that manages conversation state and API interactions.
///
/// History mutation is not synchronised; share a session between tasks only
/// behind a lock.
pub struct ChatSession<T: Transport = ChatClient> {
    transport: T,
    config: ChatConfig,
    history: Vec<Message>,
}

impl ChatSession<ChatClient> {
    /// Creates a session talking HTTP to the configured endpoint.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = ChatClient::new(config.base_url.clone(), config.api_key.clone())?;
        Ok(Self::with_transport(client, config))
    }

    /// Creates a session from a flat settings mapping.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(ChatConfig::from(settings))
    }
}

impl<T: Transport> ChatSession<T> {
    /// Creates a session over an arbitrary transport.
    pub fn with_transport(transport: T, config: ChatConfig) -> Self {
        let history = seed(&config);
        Self {
            transport,
            config,
            history,
        }
    }

    /// Asks a single question without reading or writing the history.
    ///
    /// The request carries the system prompt (if any) and the question only.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the transport.
    pub async fn ask(
        &self,
        question: &str,
        stream: bool,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let mut messages = seed(&self.config);
        messages.push(Message::user(question));
        let request = self.request(messages, stream);
        let reply = self.transport.send(&request, renderer).await?;
        Ok(reply.into_content())
    }

    /// Sends one turn of the conversation.
    ///
    /// The request carries the full history plus `user_input`.  On success the
    /// user message and then the reply are appended to the history; on any
    /// error, or if the returned future is dropped before completing, the
    /// history is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the transport.
    pub async fn chat(
        &mut self,
        user_input: &str,
        stream: bool,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let user = Message::user(user_input);
        let mut messages = self.history.clone();
        messages.push(user.clone());
        let request = self.request(messages, stream);

        match self.transport.send(&request, renderer).await {
            Ok(reply) => {
                SESSION_TURNS.click();
                let content = reply.message.content.clone();
                self.history.push(user);
                self.history.push(reply.message);
                Ok(content)
            }
            Err(err) => {
                SESSION_FAILED_TURNS.click();
                Err(err)
            }
        }
    }

    /// Resets the history to its initial state: the system prompt alone, or empty.
    pub fn clear_history(&mut self) {
        self.history = seed(&self.config);
    }

    /// The conversation so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Returns the number of messages in the history, system prompt included.
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the model used for every request.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Returns the endpoint requests are sent to.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Returns the system prompt, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.config.system_prompt.as_deref()
    }

    /// Returns the request configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn request(&self, messages: Vec<Message>, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.config.model.clone(),
            messages,
            self.config.temperature,
            self.config.max_tokens,
        )
        .with_stream(stream)
    }
}

fn seed(config: &ChatConfig) -> Vec<Message> {
    config
        .system_prompt
        .iter()
        .map(|prompt| Message::system(prompt.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulating_stream::Reply;
    use crate::render::CollectingRenderer;
    use crate::types::Role;
    use crate::Error;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays canned outcomes and records what it was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl ScriptedTransport {
        fn replying(outcomes: Vec<Result<String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatCompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        fn base_url(&self) -> &str {
            "http://scripted.test/v1"
        }

        async fn send(
            &self,
            request: &ChatCompletionRequest,
            renderer: &mut dyn Renderer,
        ) -> Result<Reply> {
            self.requests.lock().unwrap().push(request.clone());
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()));
            let content = outcome?;
            if request.stream {
                renderer.print_text(&content);
                renderer.finish_response();
            }
            Ok(Reply::complete(Message::assistant(content)))
        }
    }

    fn session(system: Option<&str>, outcomes: Vec<Result<String>>) -> ChatSession<ScriptedTransport> {
        let mut config = ChatConfig::new().with_model("test-model");
        if let Some(system) = system {
            config = config.with_system_prompt(system);
        }
        ChatSession::with_transport(ScriptedTransport::replying(outcomes), config)
    }

    #[test]
    fn new_session_is_seeded() {
        let session = session(Some("Be helpful"), vec![]);
        assert_eq!(session.history(), &[Message::system("Be helpful")]);
        assert_eq!(session.system_prompt(), Some("Be helpful"));

        let session = self::session(None, vec![]);
        assert_eq!(session.message_count(), 0);
    }

    #[test]
    fn accessors() {
        let session = session(None, vec![]);
        assert_eq!(session.model(), "test-model");
        assert_eq!(session.base_url(), "http://scripted.test/v1");
        assert_eq!(session.config().max_tokens, 2048);
    }

    #[tokio::test]
    async fn chat_grows_history_by_two() {
        let mut session = session(Some("sys"), vec![]);
        let mut renderer = CollectingRenderer::new();
        for n in 1..=3 {
            session.chat(&format!("q{n}"), true, &mut renderer).await.unwrap();
            assert_eq!(session.message_count(), 1 + 2 * n);
        }

        let mut session = self::session(None, vec![]);
        for n in 1..=3 {
            session.chat("q", false, &mut renderer).await.unwrap();
            assert_eq!(session.message_count(), 2 * n);
        }
    }

    #[tokio::test]
    async fn chat_request_holds_prior_history_only() {
        let mut session = session(
            Some("sys"),
            vec![Ok("first".to_string()), Ok("second".to_string())],
        );
        let mut renderer = CollectingRenderer::new();
        assert_eq!(session.chat("one", true, &mut renderer).await.unwrap(), "first");
        assert_eq!(session.chat("two", true, &mut renderer).await.unwrap(), "second");

        let requests = session.transport.requests();
        assert_eq!(
            requests[0].messages,
            vec![Message::system("sys"), Message::user("one")]
        );
        assert_eq!(
            requests[1].messages,
            vec![
                Message::system("sys"),
                Message::user("one"),
                Message::assistant("first"),
                Message::user("two"),
            ]
        );
        assert_eq!(requests[1].model, "test-model");
        assert!(requests[1].stream);
        assert_eq!(
            session.history().last().map(|m| m.role),
            Some(Role::Assistant)
        );
        assert_eq!(renderer.fragments, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failed_chat_leaves_history_unchanged() {
        let mut session = session(
            Some("sys"),
            vec![
                Ok("fine".to_string()),
                Err(Error::api(401, None, "invalid api key")),
            ],
        );
        let mut renderer = CollectingRenderer::new();
        session.chat("one", true, &mut renderer).await.unwrap();
        let before = session.history().to_vec();

        let err = session.chat("two", true, &mut renderer).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(session.history(), before.as_slice());
    }

    #[tokio::test]
    async fn ask_never_touches_history() {
        let mut session = session(Some("sys"), vec![Ok("reply".to_string())]);
        let mut renderer = CollectingRenderer::new();
        session.chat("remember me", false, &mut renderer).await.unwrap();
        let before = session.history().to_vec();

        for _ in 0..3 {
            session.ask("stateless", false, &mut renderer).await.unwrap();
        }
        assert_eq!(session.history(), before.as_slice());

        let requests = session.transport.requests();
        assert_eq!(
            requests.last().unwrap().messages,
            vec![Message::system("sys"), Message::user("stateless")]
        );
        assert!(renderer.fragments.is_empty());
    }

    #[tokio::test]
    async fn ask_without_system_prompt_sends_question_only() {
        let session = session(None, vec![Ok("4".to_string())]);
        let mut renderer = CollectingRenderer::new();
        assert_eq!(session.ask("2+2?", true, &mut renderer).await.unwrap(), "4");
        assert_eq!(
            session.transport.requests()[0].messages,
            vec![Message::user("2+2?")]
        );
    }

    #[tokio::test]
    async fn clear_restores_seed() {
        let mut session = session(Some("sys"), vec![]);
        let mut renderer = CollectingRenderer::new();
        session.chat("a", true, &mut renderer).await.unwrap();
        session.chat("b", true, &mut renderer).await.unwrap();
        session.clear_history();
        assert_eq!(session.history(), &[Message::system("sys")]);

        let mut session = self::session(None, vec![]);
        session.chat("a", true, &mut renderer).await.unwrap();
        session.clear_history();
        assert!(session.history().is_empty());
        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[test]
    fn from_settings_builds_http_session() {
        let settings = Settings {
            base_url: "http://localhost:11434/v1/".to_string(),
            model: "qwen2.5".to_string(),
            system_prompt: String::new(),
            ..Settings::default()
        };
        let session = ChatSession::from_settings(&settings).unwrap();
        assert_eq!(session.base_url(), "http://localhost:11434/v1");
        assert_eq!(session.model(), "qwen2.5");
        assert_eq!(session.message_count(), 0);
    }
}
