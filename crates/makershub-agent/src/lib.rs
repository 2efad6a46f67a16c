//! Alternative conversation backend that delegates intent handling to an
//! LLM with tool calling, instead of the deterministic flow engine.
//!
//! The model is given the full content-management tool set (only when the
//! user is signed in) and a bounded number of tool rounds per turn. Write
//! tools that succeed mark the turn as having changed data so the caller
//! can refresh its views.

pub mod anthropic;
pub mod provider;
pub mod tools;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use makershub_nlu::human_date;
use makershub_schema::{UserContext, Utterance};
use makershub_store::{ContentStore, Notifier};

pub use anthropic::AnthropicProvider;
pub use provider::{ContentBlock, LlmMessage, LlmProvider, LlmRequest, LlmResponse, ToolDef};
pub use tools::{is_write_tool, tool_defs, ToolExecutor, ToolOutput};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const MAX_TOKENS: u32 = 1024;
const MAX_TOOL_ROUNDS: usize = 5;
const FALLBACK_REPLY: &str = "I'm here to help! What would you like to do?";

#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub data_changed: bool,
}

pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: ToolExecutor,
    model: String,
    reference: Option<NaiveDate>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn ContentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            provider,
            tools: ToolExecutor::new(store, notifier),
            model: DEFAULT_MODEL.to_string(),
            reference: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Pins "today" for deterministic tests.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn system_prompt(&self, user: Option<&UserContext>) -> String {
        let today = human_date(self.today());
        let mut prompt = format!(
            "You are AI Maker Bot, the assistant for the AI MAKERS GENERATION community site. \
TODAY'S DATE IS {today}.\n\n\
Community context:\n\
- Flagship event: Film Bar AI, every Tuesday 6-10pm EST at Halidom Eatery in East Atlanta.\n\
- Founders: Darion D'Anjou and Gheri Thomas.\n\n\
Rules:\n\
- Always confirm details with the user before calling any tool that creates, updates or deletes content.\n\
- When showing multiple items, use a numbered list.\n\
- Dates passed to tools must be in YYYY-MM-DD format.\n\
- Keep replies short and friendly."
        );
        if user.is_none() {
            prompt.push_str(
                "\n- The user is not signed in. They can browse and ask questions, but must sign \
in before adding or managing content. Do not promise to make changes for them.",
            );
        }
        prompt
    }

    /// Runs one conversational turn, executing tool calls for up to
    /// `MAX_TOOL_ROUNDS` rounds before returning the model's final text.
    pub async fn respond(
        &self,
        history: &[LlmMessage],
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<AgentReply> {
        let tools = if user.is_some() { tool_defs() } else { Vec::new() };

        let mut messages: Vec<LlmMessage> = history.to_vec();
        let mut text = turn.text.clone();
        if let Some(url) = &turn.attachment_url {
            text.push_str(&format!("\n[Attached file: {url}]"));
        }
        messages.push(LlmMessage::user(text));

        let mut data_changed = false;
        let mut rounds_left = MAX_TOOL_ROUNDS;

        loop {
            let response = self
                .provider
                .chat(LlmRequest {
                    model: self.model.clone(),
                    system: Some(self.system_prompt(user)),
                    messages: messages.clone(),
                    max_tokens: MAX_TOKENS,
                    tools: tools.clone(),
                })
                .await?;

            let tool_uses = response.tool_uses();
            let wants_tools = response.stop_reason.as_deref() == Some("tool_use")
                && !tool_uses.is_empty()
                && rounds_left > 0;
            let signed_in = user.filter(|_| wants_tools);

            let Some(user) = signed_in else {
                let text = if response.text.trim().is_empty() {
                    FALLBACK_REPLY.to_string()
                } else {
                    response.text
                };
                return Ok(AgentReply { text, data_changed });
            };
            rounds_left -= 1;

            tracing::debug!(tools = tool_uses.len(), "executing tool round");
            messages.push(LlmMessage {
                role: "assistant".to_string(),
                content: response.content,
            });

            let mut results = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in tool_uses {
                let output = self.tools.execute(&name, &input, user, self.today()).await;
                if is_write_tool(&name) && !output.is_error {
                    data_changed = true;
                }
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: output.content,
                    is_error: output.is_error,
                });
            }
            messages.push(LlmMessage {
                role: "user".to_string(),
                content: results,
            });
        }
    }
}
