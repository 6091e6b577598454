// Public modules
pub mod accumulating_stream;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod observability;
pub mod providers;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use accumulating_stream::{Reply, StreamAccumulator};
pub use chat::{ChatConfig, ChatSession};
pub use client::{ChatClient, Transport};
pub use client_logger::ClientLogger;
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result};
pub use interrupt::Interrupt;
pub use observability::register_biometrics;
pub use providers::Provider;
pub use render::{CollectingRenderer, PlainTextRenderer, Renderer};
pub use types::*;
