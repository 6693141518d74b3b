//! Conversation orchestrator: central coordinator of the exchange pipeline.
//!
//! Drives one send-message invocation end to end: validate, persist the
//! user message, assemble context, call the completion provider under its
//! retry/deadline policy, and persist the assistant reply. Provider
//! failures are absorbed into a fixed fallback reply so the exchange is
//! always closed; storage failures bubble.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use colloquy_core::config::ChatConfig;
use colloquy_core::types::{AssistantReply, ExchangeResult, Message, Role, Thread};
use colloquy_provider::{CompletionClient, CompletionRequest, ContextMessage};
use colloquy_storage::{Database, MessageRepository, ThreadRepository};

use crate::context::ContextBuilder;
use crate::error::ChatError;

/// Central coordinator for conversation exchanges.
///
/// One instance serves all threads; each `send_message` call is an
/// independent unit of work with no shared mutable state beyond the
/// stores themselves.
pub struct ConversationOrchestrator {
    threads: ThreadRepository,
    messages: MessageRepository,
    context_builder: ContextBuilder,
    client: Arc<dyn CompletionClient>,
    config: ChatConfig,
    model: String,
}

impl ConversationOrchestrator {
    /// Create a new orchestrator over the given database and completion
    /// client. The client is expected to already carry its retry/deadline
    /// policy (see `colloquy_provider::RetryingClient`).
    pub fn new(
        db: Arc<Database>,
        client: Arc<dyn CompletionClient>,
        config: ChatConfig,
        model: String,
    ) -> Self {
        let context_builder = ContextBuilder::new(config.context_window);
        Self {
            threads: ThreadRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(db),
            context_builder,
            client,
            config,
            model,
        }
    }

    /// Handle an inbound user message against a thread.
    ///
    /// The thread is created if it does not exist. Exactly two messages
    /// are persisted per invocation: the user message, and an assistant
    /// reply that is either the provider's completion or the fixed
    /// fallback content when the provider cannot be reached within policy.
    pub async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ExchangeResult, ChatError> {
        // Validate before any persistence.
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if content.chars().count() > self.config.max_message_chars {
            return Err(ChatError::MessageTooLong(self.config.max_message_chars));
        }

        let now = Utc::now();
        self.threads.upsert(thread_id, now)?;

        // Step 1: persist the user message.
        let user_message = Message {
            id: Uuid::new_v4(),
            thread_id: thread_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            created_at: now,
            model: None,
            usage: None,
        };
        self.messages.append(&user_message)?;
        self.threads.touch(thread_id, now)?;

        // Step 2: assemble context (includes the message just persisted).
        let history = self.context_builder.build(&self.messages, thread_id)?;
        let mut turns = Vec::with_capacity(history.len() + 1);
        turns.push(ContextMessage::new("system", self.config.system_prompt.clone()));
        turns.extend(history);
        let request = CompletionRequest::new(self.model.clone(), turns);

        // Step 3: bounded completion call; failures become the fallback.
        let assistant = match self.client.complete(&request).await {
            Ok(completion) => {
                info!(
                    thread_id,
                    model = %completion.model,
                    "Completion succeeded"
                );
                AssistantReply {
                    content: completion.content,
                    model: Some(completion.model),
                    usage: completion.usage,
                }
            }
            Err(e) => {
                warn!(thread_id, error = %e, "Completion failed, using fallback reply");
                AssistantReply {
                    content: self.config.fallback_content.clone(),
                    model: None,
                    usage: None,
                }
            }
        };

        // Step 4: persist the assistant reply, strictly after the user
        // message in the thread's total order.
        let assistant_at = strictly_after(user_message.created_at, Utc::now());
        let assistant_message = Message {
            id: Uuid::new_v4(),
            thread_id: thread_id.to_string(),
            role: Role::Assistant,
            content: assistant.content.clone(),
            created_at: assistant_at,
            model: assistant.model.clone(),
            usage: assistant.usage.clone(),
        };
        self.messages.append(&assistant_message)?;
        self.threads.touch(thread_id, assistant_at)?;

        Ok(ExchangeResult {
            thread_id: thread_id.to_string(),
            user_message_id: user_message.id,
            assistant_message_id: assistant_message.id,
            assistant,
        })
    }

    /// Create a new thread with a server-generated id and the fixed
    /// assistant greeting as its first message.
    pub fn create_thread(&self, title: Option<String>) -> Result<Thread, ChatError> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            title,
            created_at: now,
            updated_at: now,
        };
        self.threads.create(&thread)?;

        self.messages.append(&Message {
            id: Uuid::new_v4(),
            thread_id: thread.id.clone(),
            role: Role::Assistant,
            content: self.config.welcome_content.clone(),
            created_at: now,
            model: None,
            usage: None,
        })?;

        info!(thread_id = %thread.id, "Thread created");
        Ok(thread)
    }
}

/// A timestamp no earlier than one millisecond after `earlier`.
///
/// Millisecond storage precision can make two writes in the same tick
/// collide; the assistant reply must sort strictly after its user message.
fn strictly_after(earlier: DateTime<Utc>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    if candidate.timestamp_millis() > earlier.timestamp_millis() {
        candidate
    } else {
        earlier + Duration::milliseconds(1)
    }
}
