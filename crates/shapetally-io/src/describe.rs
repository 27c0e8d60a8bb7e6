//! Optional free-text description of the annotated image.
//!
//! The description is best effort: it runs after the counts and the
//! artifact exist, and a failure here never changes either of them.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use shapetally_pipeline::Locale;

use crate::config::DescriptionConfig;

/// Produces a textual description of a JPEG image.
pub trait Describer {
    /// Describe the image encoded in `jpeg`.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptionError`] if no description could be
    /// obtained.
    fn describe(&self, jpeg: &[u8]) -> Result<String, DescriptionError>;
}

/// Why a description could not be obtained.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// Connection, TLS or timeout failure.
    #[error("description request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("description service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed description response: {0}")]
    MalformedResponse(String),

    /// The response held no text.
    #[error("description response contained no text")]
    EmptyResponse,
}

/// Longest error body kept in [`DescriptionError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Chat-completions client sending the image as a base64 data URL.
#[derive(Debug, Clone)]
pub struct ChatDescriber {
    client: reqwest::blocking::Client,
    config: DescriptionConfig,
    locale: Locale,
}

impl ChatDescriber {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptionError::Transport`] if the HTTP client cannot
    /// be constructed (e.g. no TLS backend).
    pub fn new(config: DescriptionConfig) -> Result<Self, DescriptionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shapetally/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            locale: Locale::default(),
        })
    }

    /// Ask for the description in `locale`.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// JSON request body for `jpeg`.
    #[must_use]
    pub fn request_body(&self, jpeg: &[u8]) -> serde_json::Value {
        let (system, user) = prompts(self.locale);
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": user },
                        { "type": "image_url", "image_url": { "url": data_url(jpeg) } },
                    ],
                },
            ],
        })
    }
}

impl Describer for ChatDescriber {
    fn describe(&self, jpeg: &[u8]) -> Result<String, DescriptionError> {
        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            bytes = jpeg.len(),
            "requesting description"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(jpeg))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DescriptionError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        parse_response(&body)
    }
}

/// System and user prompt for `locale`.
const fn prompts(locale: Locale) -> (&'static str, &'static str) {
    match locale {
        Locale::English => (
            "You are a teacher who recognizes geometric shapes in images.",
            "Count how many triangles, squares and circles are in this image.",
        ),
        Locale::Romanian => (
            "Ești un profesor care recunoaște forme geometrice din imagini.",
            "Numără câte triunghiuri, pătrate și cercuri sunt în această imagine.",
        ),
    }
}

/// `data:` URL carrying a JPEG.
#[must_use]
pub fn data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Extract the first choice's text from a chat-completions response.
///
/// # Errors
///
/// Returns [`DescriptionError::MalformedResponse`] for bodies that do
/// not parse and [`DescriptionError::EmptyResponse`] when there is no
/// non-blank text.
pub fn parse_response(body: &str) -> Result<String, DescriptionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| DescriptionError::MalformedResponse(err.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or(DescriptionError::EmptyResponse)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}
