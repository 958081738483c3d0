// action.rs
use crate::llm::Llm;
use crate::message::Message;
use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Sentinel action kind attributed to operator input; the root of every
/// causal chain.
pub const USER_REQUIREMENT: &str = "UserRequirement";

/// An external unit of work a role executes on its turn, typically a model
/// invocation. `kind()` is the stable identifier other roles watch for and
/// the `cause_by` attribution of the resulting message.
///
/// Errors are not caught by the role layer; a failing action is fatal for
/// the calling role's turn.
#[async_trait]
pub trait Action: Send + Sync {
    fn kind(&self) -> &str;

    async fn run(
        &self,
        context: &[Message],
        options: &HashMap<String, String>,
    ) -> Result<ActionOutput>;
}

/// Result of an action: free text, optionally doubled by a structured
/// payload for machine consumers.
#[derive(Debug, Clone)]
pub struct ActionOutput {
    pub content: String,
    pub structured_content: Option<Value>,
}

impl ActionOutput {
    /// Wraps raw model output. When the text is a JSON object it is carried
    /// as the structured payload too, with the text kept as the
    /// human-readable echo.
    pub fn parse(content: String) -> Self {
        let structured_content = match serde_json::from_str::<Value>(content.trim()) {
            Ok(value) if value.is_object() => Some(value),
            _ => None,
        };
        Self {
            content,
            structured_content,
        }
    }
}

impl From<String> for ActionOutput {
    fn from(content: String) -> Self {
        Self {
            content,
            structured_content: None,
        }
    }
}

/// A model-backed action: one instruction, executed against the
/// conversation context the role hands over.
pub struct LlmAction {
    kind: String,
    instruction: String,
    llm: Llm,
}

impl LlmAction {
    pub fn new(kind: impl Into<String>, instruction: impl Into<String>, llm: Llm) -> Self {
        Self {
            kind: kind.into(),
            instruction: instruction.into(),
            llm,
        }
    }
}

#[async_trait]
impl Action for LlmAction {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn run(
        &self,
        context: &[Message],
        options: &HashMap<String, String>,
    ) -> Result<ActionOutput> {
        let mut prompt = String::new();
        if let Some(prefix) = options.get("prefix") {
            prompt.push_str(prefix);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&self.instruction);
        if let Some(language) = options.get("language") {
            prompt.push_str(&format!("\nAnswer in {}.", language));
        }
        prompt.push_str("\n\n## Conversation so far\n");
        for message in context {
            prompt.push_str(&format!("{}\n", message));
        }

        let response = self.llm.ask(&prompt).await?;
        Ok(ActionOutput::parse(response))
    }
}
