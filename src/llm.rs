// llm.rs
use crate::role::Decider;
use async_trait::async_trait;
use cli_log::debug;
use color_eyre::eyre::{eyre, Result};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::Ollama;

pub const DEFAULT_MODEL: &str = "llama3.2:latest";

/// Thin client around a local Ollama instance. Cloned freely: every action
/// and every role's decision procedure talks through one of these.
#[derive(Debug, Clone)]
pub struct Llm {
    client: Ollama,
    model: String,
}

impl Llm {
    pub fn new(model: Option<String>) -> Self {
        Self {
            client: Ollama::default(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ask(&self, prompt: &str) -> Result<String> {
        debug!("sending {} chars to {}", prompt.len(), self.model);
        let request = GenerationRequest::new(self.model.clone(), prompt.to_string());
        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| eyre!("generation failed: {}", e))?;
        Ok(response.response)
    }
}

#[async_trait]
impl Decider for Llm {
    async fn decide(&self, prompt: &str) -> Result<String> {
        self.ask(prompt).await
    }
}

#[tokio::test]
async fn test_ask_without_server_errors() {
    // No Ollama server is listening in the test environment; the transport
    // error must surface instead of being swallowed.
    let llm = Llm::new(Some("missing-model".to_string()));
    assert!(llm.ask("hello?").await.is_err());
}
