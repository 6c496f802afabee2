//! Telegram Bot API client for outbound notifications.
//!
//! Delivery failures never escape this module: every send reports a plain
//! `bool` and logs the reason when it is `false`. Nothing is retried.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::NotifierConfig;
use crate::platform::{OutgoingMessage, ParseMode};

pub const TEXT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    disable_web_page_preview: bool,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Error)]
enum DeliveryError {
    #[error("request failed")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP {status}: {description}")]
    Status {
        status: reqwest::StatusCode,
        description: String,
    },
    #[error("Telegram API error: {0}")]
    Api(String),
    #[error("invalid API response")]
    Decode(#[source] serde_json::Error),
    #[error("cannot read {path}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for DeliveryError {
    // The request URL carries the bot token; never let it reach a log line.
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Transport(e.without_url())
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

/// Send a prepared request and interpret the Bot API acknowledgement.
async fn execute(request: reqwest::RequestBuilder) -> Result<(), DeliveryError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    let parsed = serde_json::from_str::<ApiResponse>(&body);

    if !status.is_success() {
        let description = parsed.ok().and_then(|r| r.description).unwrap_or(body);
        return Err(DeliveryError::Status {
            status,
            description,
        });
    }

    let parsed = parsed.map_err(DeliveryError::Decode)?;
    if !parsed.ok {
        return Err(DeliveryError::Api(
            parsed
                .description
                .unwrap_or_else(|| "no description".to_string()),
        ));
    }
    Ok(())
}

pub struct TelegramClient {
    client: reqwest::Client,
    token: SecretString,
    chat_id: String,
    api_url: String,
    text_timeout: Duration,
    document_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("text_timeout", &self.text_timeout)
            .field("document_timeout", &self.document_timeout)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &NotifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
            api_url: config.api_url.clone(),
            text_timeout: TEXT_TIMEOUT,
            document_timeout: DOCUMENT_TIMEOUT,
        }
    }

    /// Replace the underlying HTTP client (proxy, TLS or pool settings).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Override the per-request timeouts for text messages and uploads.
    pub fn with_timeouts(mut self, text: Duration, document: Duration) -> Self {
        self.text_timeout = text;
        self.document_timeout = document;
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method)
    }

    /// Send a text message. Returns true only when the API acknowledges it.
    pub async fn send(&self, message: &OutgoingMessage) -> bool {
        info!("Sending message: {}...", preview(&message.text));

        let payload = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode,
            disable_web_page_preview: message.disable_web_page_preview,
            disable_notification: message.silent,
        };
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .timeout(self.text_timeout);

        match execute(request).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send message: {:#}", anyhow::Error::from(e));
                false
            }
        }
    }

    /// Send `text`, taking the formatting mode by name. Unrecognized mode
    /// names are dropped and the text goes out as plain text.
    pub async fn send_text(
        &self,
        text: &str,
        parse_mode: Option<&str>,
        disable_web_page_preview: bool,
        silent: bool,
    ) -> bool {
        let parse_mode = parse_mode.and_then(|name| {
            let mode = ParseMode::parse(name);
            if mode.is_none() {
                debug!("Ignoring unsupported parse mode: {}", name);
            }
            mode
        });
        let message = OutgoingMessage::new(text)
            .with_parse_mode(parse_mode)
            .with_link_preview(!disable_web_page_preview)
            .silent(silent);
        self.send(&message).await
    }

    /// Upload a file as a document. The file is streamed from disk.
    pub async fn send_document(
        &self,
        path: impl AsRef<Path>,
        caption: Option<&str>,
        silent: bool,
    ) -> bool {
        let path = path.as_ref();
        info!("Sending document: {}", path.display());

        match self.upload_document(path, caption, silent).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Failed to send document {}: {:#}",
                    path.display(),
                    anyhow::Error::from(e)
                );
                false
            }
        }
    }

    async fn upload_document(
        &self,
        path: &Path,
        caption: Option<&str>,
        silent: bool,
    ) -> Result<(), DeliveryError> {
        let file_error = |source: std::io::Error| DeliveryError::File {
            path: path.display().to_string(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(file_error)?;
        let length = file.metadata().await.map_err(file_error)?.len();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let document = Part::stream_with_length(file, length).file_name(file_name);

        let mut form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("disable_notification", silent.to_string());
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            form = form.text("caption", caption.to_string());
        }
        let form = form.part("document", document);

        let request = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .timeout(self.document_timeout);
        execute(request).await
    }
}
