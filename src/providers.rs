//! Known OpenAI-compatible providers.
//!
//! The table is static and ordered; [`list`] returns it in the order the
//! interactive setup shows it.

use std::fmt;

/// A provider preset: where it lives and which model to default to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Short key used on the command line.
    pub name: &'static str,
    /// Chat Completions base URL, without a trailing slash.
    pub base_url: &'static str,
    /// Model selected when the provider is chosen.
    pub default_model: &'static str,
    /// One-line human description.
    pub description: &'static str,
}

impl Provider {
    /// Returns true if the provider runs on this machine and needs no API key.
    pub fn is_local(&self) -> bool {
        crate::config::is_local_endpoint(self.base_url)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}

const PROVIDERS: &[Provider] = &[
    Provider {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        default_model: "gpt-3.5-turbo",
        description: "OpenAI official API",
    },
    Provider {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        default_model: "deepseek-chat",
        description: "DeepSeek (low cost)",
    },
    Provider {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        default_model: "qwen2.5",
        description: "Ollama local models (free)",
    },
    Provider {
        name: "zhipu",
        base_url: "https://open.bigmodel.cn/api/paas/v4",
        default_model: "glm-4-flash",
        description: "Zhipu AI (GLM family)",
    },
    Provider {
        name: "siliconflow",
        base_url: "https://api.siliconflow.cn/v1",
        default_model: "Qwen/Qwen2.5-7B-Instruct",
        description: "SiliconFlow (multi-model aggregator with free tier)",
    },
];

/// Look up a provider by name.
pub fn lookup(name: &str) -> Option<&'static Provider> {
    PROVIDERS.iter().find(|p| p.name == name)
}

/// All providers in display order.
pub fn list() -> &'static [Provider] {
    PROVIDERS
}
