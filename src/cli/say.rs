//! TUI-less "say" command

use std::error::Error;

use crate::cli::Session;
use crate::core::history::policy_for;
use crate::core::message::now_millis;
use crate::core::orchestrator::{
    ChatState, NoRender, Orchestrator, RequestSettings, SubmitOutcome,
};
use crate::ui::html::to_html;
use crate::ui::render::TranscriptRenderer;

/// What to print once the exchange finishes: the bare reply, or the whole
/// conversation as an HTML fragment.
fn render_output(state: &ChatState, html: bool) -> String {
    if html {
        let output =
            TranscriptRenderer::local().render_messages(state.messages(), state.loading());
        return to_html(&output);
    }
    state
        .last_message()
        .map(|message| message.content.clone())
        .unwrap_or_default()
}

pub async fn run_say(
    session: Session,
    prompt: Vec<String>,
    html: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: abz say <prompt>");
        std::process::exit(1);
    }

    let Session {
        config,
        credential,
        client,
    } = session;
    let mut orchestrator = Orchestrator::new(
        ChatState::new(credential, now_millis()),
        RequestSettings::from_config(&config),
        policy_for(config.history_window),
    );

    match orchestrator.submit(&prompt, client.as_ref(), &mut NoRender).await {
        SubmitOutcome::Replied => {
            println!("{}", render_output(orchestrator.state(), html));
            Ok(())
        }
        SubmitOutcome::Failed => {
            if html {
                println!("{}", render_output(orchestrator.state(), true));
            }
            eprintln!("❌ {}", render_output(orchestrator.state(), false));
            std::process::exit(1);
        }
        SubmitOutcome::CredentialRequired => {
            eprintln!("❌ No API key is set.");
            eprintln!();
            eprintln!("💡 Quick fixes:");
            eprintln!("  • abz auth");
            eprintln!("  • export ABZ_API_KEY=<your key>");
            std::process::exit(1);
        }
        SubmitOutcome::Ignored | SubmitOutcome::Busy => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{CompletionClient, CompletionError};
    use crate::api::ChatRequest;
    use crate::core::config::Config;
    use crate::core::credential::{CredentialHolder, MemoryCredentialStore};
    use async_trait::async_trait;

    struct FixedReply(&'static str);

    #[async_trait]
    impl CompletionClient for FixedReply {
        async fn complete(
            &self,
            _api_key: &str,
            _request: &ChatRequest,
        ) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    fn orchestrator() -> Orchestrator {
        let credential =
            CredentialHolder::load(Box::new(MemoryCredentialStore::with_value("sk-test")));
        let config = Config::default();
        Orchestrator::new(
            ChatState::new(credential, 0),
            RequestSettings::from_config(&config),
            policy_for(None),
        )
    }

    #[tokio::test]
    async fn plain_output_is_the_reply() {
        let mut orchestrator = orchestrator();
        let outcome = orchestrator
            .submit("hi", &FixedReply("hello <b>there</b>"), &mut NoRender)
            .await;
        assert_eq!(outcome, SubmitOutcome::Replied);
        assert_eq!(render_output(orchestrator.state(), false), "hello <b>there</b>");
    }

    #[tokio::test]
    async fn html_output_escapes_the_conversation() {
        let mut orchestrator = orchestrator();
        orchestrator
            .submit("hi", &FixedReply("hello <b>there</b>"), &mut NoRender)
            .await;

        let html = render_output(orchestrator.state(), true);
        assert!(html.starts_with("<div id=\"chat-container\""));
        assert!(html.contains("hello &lt;b&gt;there&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
        // Welcome, the prompt and the reply.
        assert_eq!(html.matches("class=\"message ").count(), 3);
    }
}
