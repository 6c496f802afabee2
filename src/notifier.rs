use tracing::{info, warn};

use crate::ci::{build_ci_summary, CiEvent, CiVars};
use crate::config::{process_env, ConfigError, NotifierConfig};
use crate::platform::telegram::TelegramClient;
use crate::platform::{OutgoingMessage, ParseMode};

pub const SUCCESS_FOLLOW_UP: &str = "🚀 CI/CD pipeline finished successfully!";
pub const FAILURE_FOLLOW_UP: &str = "⚠️ Warning! Problems detected in the CI/CD pipeline!";

/// Posts CI run summaries to the configured chat.
///
/// CI variables are resolved once, at construction. Defaults for absent
/// values are filled in each time a summary is assembled.
#[derive(Debug)]
pub struct CiNotifier {
    client: TelegramClient,
    vars: CiVars,
}

impl CiNotifier {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = NotifierConfig::from_lookup(lookup)?;
        let vars = CiVars::resolve(&config.profile, lookup);
        Ok(Self::new(TelegramClient::new(&config), vars))
    }

    pub fn new(client: TelegramClient, vars: CiVars) -> Self {
        Self { client, vars }
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    pub fn ci_event(&self) -> CiEvent {
        CiEvent::now(&self.vars)
    }

    /// Send the CI summary, then a short follow-up saying whether it got
    /// through. Returns whether the summary itself was delivered.
    pub async fn send_ci_notification(&self, additional_info: Option<&str>) -> bool {
        let event = self.ci_event();
        info!(
            "Sending CI notification for {} ({}) on {}",
            event.project, event.status, event.branch
        );

        let summary = build_ci_summary(&event, additional_info);
        let message = OutgoingMessage::new(summary).with_parse_mode(Some(ParseMode::MarkdownV2));
        let delivered = self.client.send(&message).await;

        let follow_up = if delivered {
            SUCCESS_FOLLOW_UP
        } else {
            warn!("CI notification was not delivered, sending warning");
            FAILURE_FOLLOW_UP
        };
        if !self.client.send_text(follow_up, None, true, false).await {
            warn!("Follow-up message was not delivered");
        }

        delivered
    }
}
