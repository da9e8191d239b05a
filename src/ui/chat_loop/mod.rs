//! Main chat event loop.
//!
//! The loop owns the [`Orchestrator`] on a single task. Outbound calls run on
//! spawned Tokio tasks and report back over a channel, so the UI keeps
//! drawing while a request is pending.

mod lifecycle;
mod view;

use std::{error::Error, sync::Arc, time::Duration};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::client::{CompletionClient, CompletionError};
use crate::core::config::Config;
use crate::core::credential::{CredentialError, CredentialHolder};
use crate::core::history::policy_for;
use crate::core::message::now_millis;
use crate::core::orchestrator::{
    ChatState, Orchestrator, PendingRequest, RenderHook, RequestSettings, SubmitStart,
};
use crate::ui::render::TranscriptRenderer;

use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use self::view::{draw, ChatView};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type ReplyResult = Result<String, CompletionError>;

#[derive(Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Quit,
}

/// Marks the frame dirty; the loop redraws on its next pass.
struct RedrawFlag(bool);

impl RenderHook for RedrawFlag {
    fn request_render(&mut self, _state: &ChatState) {
        self.0 = true;
    }
}

struct ChatSession {
    orchestrator: Orchestrator,
    view: ChatView,
    renderer: TranscriptRenderer,
    client: Arc<dyn CompletionClient>,
    reply_tx: mpsc::UnboundedSender<ReplyResult>,
    redraw: RedrawFlag,
    title: String,
}

pub async fn run_chat(
    config: Config,
    credential: CredentialHolder,
    client: Arc<dyn CompletionClient>,
) -> Result<(), Box<dyn Error>> {
    let (mut session, reply_rx) = ChatSession::new(&config, credential, client);

    let mut terminal = setup_terminal()?;
    let result = session.run(&mut terminal, reply_rx);
    restore_terminal(&mut terminal)?;
    result
}

impl ChatSession {
    fn new(
        config: &Config,
        credential: CredentialHolder,
        client: Arc<dyn CompletionClient>,
    ) -> (Self, mpsc::UnboundedReceiver<ReplyResult>) {
        let orchestrator = Orchestrator::new(
            ChatState::new(credential, now_millis()),
            RequestSettings::from_config(config),
            policy_for(config.history_window),
        );
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let session = Self {
            orchestrator,
            view: ChatView::new(),
            renderer: TranscriptRenderer::local(),
            client,
            reply_tx,
            redraw: RedrawFlag(true),
            title: format!(
                "{} v{} • {}",
                config.title(),
                env!("CARGO_PKG_VERSION"),
                config.model()
            ),
        };
        (session, reply_rx)
    }

    /// Prefill the key field; without a key, open settings straight away.
    fn start(&mut self) {
        let credential = self.orchestrator.state().credential();
        let current = credential.current().map(str::to_string);
        let missing = !credential.is_set();
        self.view.prefill_credential(current.as_deref());
        if missing {
            self.orchestrator.open_settings(&mut self.redraw);
        }
    }

    fn run(
        &mut self,
        terminal: &mut ChatTerminal,
        mut reply_rx: mpsc::UnboundedReceiver<ReplyResult>,
    ) -> Result<(), Box<dyn Error>> {
        self.start();

        loop {
            while let Ok(result) = reply_rx.try_recv() {
                self.orchestrator.complete(result, &mut self.redraw);
            }

            if self.redraw.0 {
                terminal.draw(|frame| {
                    draw(
                        frame,
                        self.orchestrator.state(),
                        &mut self.view,
                        &self.renderer,
                        &self.title,
                    )
                })?;
                self.redraw.0 = false;
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let control = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                Event::Paste(text) => {
                    self.handle_paste(&text);
                    LoopControl::Continue
                }
                Event::Resize(..) => {
                    self.redraw.0 = true;
                    LoopControl::Continue
                }
                _ => LoopControl::Continue,
            };
            if control == LoopControl::Quit {
                debug!("quit requested");
                return Ok(());
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> LoopControl {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return LoopControl::Quit;
        }
        self.redraw.0 = true;

        if self.orchestrator.state().settings_open() {
            self.handle_settings_key(key);
        } else {
            self.handle_composer_key(key);
        }
        LoopControl::Continue
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.view.error = None;
                self.orchestrator.close_settings(&mut self.redraw);
            }
            KeyCode::Enter => {
                let value = self.view.credential_text();
                match self.orchestrator.save_credential(&value, &mut self.redraw) {
                    Ok(()) => {
                        self.view.error = None;
                        let saved = self.orchestrator.state().credential().current();
                        self.view.prefill_credential(saved);
                    }
                    Err(CredentialError::Empty) => {}
                    Err(err) => {
                        warn!(error = %err, "credential save failed");
                        self.view.error = Some(err.to_string());
                    }
                }
            }
            _ => {
                self.view.credential_input.input(key);
            }
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent) {
        let newline = key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Enter if newline => self.view.composer.insert_newline(),
            KeyCode::Enter => self.submit(),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let current = self.orchestrator.state().credential().current();
                self.view.prefill_credential(current);
                self.orchestrator.open_settings(&mut self.redraw);
            }
            KeyCode::Esc => self.orchestrator.dismiss_notice(),
            _ => {
                self.view.composer.input(key);
            }
        }
        self.orchestrator.set_input(self.view.composer_text());
    }

    fn handle_paste(&mut self, text: &str) {
        if self.orchestrator.state().settings_open() {
            // Keys are a single line.
            self.view
                .credential_input
                .insert_str(text.replace(['\r', '\n'], ""));
        } else {
            self.view.composer.insert_str(text.replace("\r\n", "\n"));
            self.orchestrator.set_input(self.view.composer_text());
        }
        self.redraw.0 = true;
    }

    fn submit(&mut self) {
        let text = self.view.composer_text();
        match self.orchestrator.begin_submit(&text, &mut self.redraw) {
            SubmitStart::Dispatched(pending) => {
                self.view.reset_composer();
                self.spawn_request(pending);
            }
            SubmitStart::CredentialRequired => self.view.prefill_credential(None),
            SubmitStart::Busy | SubmitStart::Ignored => {}
        }
    }

    fn spawn_request(&self, pending: PendingRequest) {
        let client = Arc::clone(&self.client);
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let result = client.complete(&pending.api_key, &pending.request).await;
            let _ = reply_tx.send(result);
        });
    }
}
