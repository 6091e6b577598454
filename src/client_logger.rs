//! Logging trait for client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`ChatClient`](crate::ChatClient).

use crate::types::{ChatCompletionRequest, Message};

/// A trait for logging client operations.
///
/// Implement this trait to capture and record all API interactions,
/// including the outgoing request, non-streaming responses, and individual
/// streamed fragments.
///
/// # Example
///
/// ```rust,ignore
/// use cheapllm::{ChatCompletionRequest, ClientLogger, Message};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &ChatCompletionRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, message: &Message) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", serde_json::to_string(message).unwrap()).unwrap();
///     }
///
///     fn log_stream_fragment(&self, fragment: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Fragment: {fragment:?}").unwrap();
///     }
///
///     fn log_stream_message(&self, message: &Message, skipped_chunks: u64) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Stream complete ({skipped_chunks} skipped): {}",
///             serde_json::to_string(message).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log a complete response from a non-streaming call.
    fn log_response(&self, message: &Message);

    /// Log one streamed fragment, in arrival order.
    fn log_stream_fragment(&self, fragment: &str);

    /// Log the message assembled from a completed stream.
    ///
    /// `skipped_chunks` counts the malformed chunks that were dropped.
    fn log_stream_message(&self, message: &Message, skipped_chunks: u64);
}
