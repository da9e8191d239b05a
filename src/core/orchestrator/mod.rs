//! Request lifecycle for a single conversation.
//!
//! [`Orchestrator`] owns the [`ChatState`] and is the only thing that mutates
//! it. A submission moves through these phases:
//!
//! ```text
//! Idle -> Composing -> (AwaitingCredential | InFlight) -> Idle
//! ```
//!
//! Exactly one request may be in flight; a second submission while one is
//! pending is refused with [`SubmitOutcome::Busy`]. Failures of any kind end
//! up as an assistant message in the transcript and never escape.

use std::fmt;

use tracing::{debug, info, warn};

use crate::api::client::{CompletionClient, CompletionError};
use crate::api::{ChatMessage, ChatRequest};
use crate::core::config::Config;
use crate::core::constants::{CREDENTIAL_HINT, CREDENTIAL_SESSION_ONLY, CREDENTIAL_STORED};
use crate::core::credential::{CredentialError, CredentialHolder};
use crate::core::history::HistoryPolicy;
use crate::core::message::{now_millis, Message, MessageStore, Role};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Non-blank text is waiting to be sent.
    Composing,
    /// A submission was abandoned because no credential is set.
    AwaitingCredential,
    InFlight,
}

/// Everything the renderer and the UI read.
pub struct ChatState {
    messages: MessageStore,
    credential: CredentialHolder,
    loading: bool,
    pending_input: String,
    settings_open: bool,
    notice: Option<String>,
    phase: Phase,
}

impl ChatState {
    pub fn new(credential: CredentialHolder, now: i64) -> Self {
        Self {
            messages: MessageStore::seeded(now),
            credential,
            loading: false,
            pending_input: String::new(),
            settings_open: false,
            notice: None,
            phase: Phase::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.messages.all()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn credential(&self) -> &CredentialHolder {
        &self.credential
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Whether the credential entry surface should be shown.
    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    /// One-line confirmation for the status area.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Called whenever the visible state changed and should be redrawn.
pub trait RenderHook {
    fn request_render(&mut self, state: &ChatState);
}

/// For callers that draw on their own schedule (or not at all).
pub struct NoRender;

impl RenderHook for NoRender {
    fn request_render(&mut self, _state: &ChatState) {}
}

#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub model: String,
    pub persona: String,
}

impl RequestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model().to_string(),
            persona: config.persona().to_string(),
        }
    }
}

/// A request ready to send, with the credential captured at submit time.
pub struct PendingRequest {
    pub api_key: String,
    pub request: ChatRequest,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("api_key", &"<redacted>")
            .field("request", &self.request)
            .finish()
    }
}

#[derive(Debug)]
pub enum SubmitStart {
    Ignored,
    Busy,
    CredentialRequired,
    Dispatched(PendingRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing changed.
    Ignored,
    /// A request is already in flight; nothing changed.
    Busy,
    /// No credential; settings were opened and the text kept.
    CredentialRequired,
    Replied,
    /// The failure was appended to the transcript.
    Failed,
}

pub struct Orchestrator {
    state: ChatState,
    settings: RequestSettings,
    history: Box<dyn HistoryPolicy>,
}

impl Orchestrator {
    pub fn new(
        state: ChatState,
        settings: RequestSettings,
        history: Box<dyn HistoryPolicy>,
    ) -> Self {
        Self {
            state,
            settings,
            history,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Mirror the composer contents.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
        if self.state.phase != Phase::AwaitingCredential {
            self.settle_phase();
        }
    }

    /// First half of a submission: validate, record the user message and
    /// build the outbound request. Pair with [`Orchestrator::complete`].
    pub fn begin_submit(&mut self, text: &str, hook: &mut dyn RenderHook) -> SubmitStart {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring blank submission");
            return SubmitStart::Ignored;
        }
        if self.state.loading {
            warn!("submission refused while a request is in flight");
            return SubmitStart::Busy;
        }

        let Some(api_key) = self.state.credential.current().map(str::to_string) else {
            info!("no credential set; asking for one");
            self.state.pending_input = text.to_string();
            self.state.phase = Phase::AwaitingCredential;
            self.state.settings_open = true;
            hook.request_render(&self.state);
            return SubmitStart::CredentialRequired;
        };

        self.state
            .messages
            .append(Message::user(trimmed, now_millis()));
        self.state.pending_input.clear();
        self.state.loading = true;
        self.state.notice = None;
        self.state.phase = Phase::InFlight;
        hook.request_render(&self.state);

        let request = self.build_request();
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "request prepared"
        );
        SubmitStart::Dispatched(PendingRequest { api_key, request })
    }

    /// Second half of a submission: append the reply (or the failure) and
    /// return to idle.
    pub fn complete(
        &mut self,
        result: Result<String, CompletionError>,
        hook: &mut dyn RenderHook,
    ) {
        let now = now_millis();
        let reply = match result {
            Ok(content) => {
                info!(chars = content.len(), "assistant replied");
                Message::assistant(content, now)
            }
            Err(err) => {
                warn!(error = %err, "completion failed");
                Message::assistant(failure_message(&err), now)
            }
        };
        self.state.messages.append(reply);
        self.state.loading = false;
        self.settle_phase();
        hook.request_render(&self.state);
    }

    /// Run one full round-trip.
    pub async fn submit(
        &mut self,
        text: &str,
        client: &dyn CompletionClient,
        hook: &mut dyn RenderHook,
    ) -> SubmitOutcome {
        let pending = match self.begin_submit(text, hook) {
            SubmitStart::Dispatched(pending) => pending,
            SubmitStart::Ignored => return SubmitOutcome::Ignored,
            SubmitStart::Busy => return SubmitOutcome::Busy,
            SubmitStart::CredentialRequired => return SubmitOutcome::CredentialRequired,
        };

        let result = client.complete(&pending.api_key, &pending.request).await;
        let outcome = match result {
            Ok(_) => SubmitOutcome::Replied,
            Err(_) => SubmitOutcome::Failed,
        };
        self.complete(result, hook);
        outcome
    }

    /// The persona followed by whatever the history policy selects.
    pub fn build_request(&self) -> ChatRequest {
        let history = self.history.select(self.state.messages.all());
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage {
            role: Role::System.as_str().to_string(),
            content: self.settings.persona.clone(),
        });
        messages.extend(history.iter().map(Message::to_api));

        ChatRequest {
            model: self.settings.model.clone(),
            messages,
        }
    }

    /// Store a new credential. On success the settings surface closes and a
    /// confirmation notice is set; on failure nothing changes.
    pub fn save_credential(
        &mut self,
        value: &str,
        hook: &mut dyn RenderHook,
    ) -> Result<(), CredentialError> {
        self.state.credential.save(value)?;
        self.state.settings_open = false;
        let notice = if self.state.credential.persists() {
            CREDENTIAL_STORED
        } else {
            CREDENTIAL_SESSION_ONLY
        };
        self.state.notice = Some(notice.to_string());
        self.settle_phase();
        hook.request_render(&self.state);
        Ok(())
    }

    pub fn open_settings(&mut self, hook: &mut dyn RenderHook) {
        self.state.settings_open = true;
        hook.request_render(&self.state);
    }

    pub fn close_settings(&mut self, hook: &mut dyn RenderHook) {
        self.state.settings_open = false;
        if self.state.phase == Phase::AwaitingCredential {
            self.settle_phase();
        }
        hook.request_render(&self.state);
    }

    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
    }

    fn settle_phase(&mut self) {
        self.state.phase = if self.state.loading {
            Phase::InFlight
        } else if self.state.pending_input.trim().is_empty() {
            Phase::Idle
        } else {
            Phase::Composing
        };
    }
}

/// Transcript text for a failed round-trip.
pub fn failure_message(err: &CompletionError) -> String {
    format!("Error: {}. \n\n{}", err.reason(), CREDENTIAL_HINT)
}
