use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::engine::event::Event;
use crate::engine::state::{ChatTurn, Expression};

/// What the remote responder sends back: an expression tag from a fixed
/// vocabulary plus the line to display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReply {
    pub expression: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    message: String,
    history: Vec<ChatTurn>,
}

/// Errors are carried back into the engine as data; nothing here is
/// retried or fatal.
#[derive(Debug, Clone, Error)]
pub enum ResponderError {
    #[error("responder transport failed: {0}")]
    Transport(String),
    #[error("responder returned status {0}")]
    Status(u16),
    #[error("responder reply was malformed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ResponderError {
    fn from(err: reqwest::Error) -> Self {
        ResponderError::Transport(err.to_string())
    }
}

#[derive(Clone)]
pub struct Responder {
    client: Client,
    base_url: String,
    tx: mpsc::Sender<Event>,
}

impl Responder {
    pub fn new(base_url: String, timeout_ms: u64, tx: mpsc::Sender<Event>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            base_url,
            tx,
        }
    }

    /// Fire the round-trip on its own task. The result re-enters the
    /// engine as an event tagged with the generation captured here, so
    /// a reply that outlives its activity is rejected at application
    /// time, not awaited inline.
    pub fn dispatch(&self, generation: u64, user_text: String, history: Vec<ChatTurn>) {
        let client = self.client.clone();
        let url = format!("{}/chat", self.base_url);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = request(&client, &url, user_text, history).await;
            if let Err(err) = &result {
                warn!("responder round-trip failed: {err}");
            }
            let _ = tx.send(Event::ResponderResult { generation, result }).await;
        });
    }
}

async fn request(
    client: &Client,
    url: &str,
    message: String,
    history: Vec<ChatTurn>,
) -> Result<AiReply, ResponderError> {
    let response = client
        .post(url)
        .json(&ChatRequest { message, history })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ResponderError::Status(status.as_u16()));
    }

    response
        .json::<AiReply>()
        .await
        .map_err(|err| ResponderError::Parse(err.to_string()))
}

/// Fixed lookup from the responder's tag vocabulary to the display
/// enum. Unrecognized tags fall back to Neutral.
pub fn expression_for_tag(tag: &str) -> Expression {
    match tag {
        "NEUTRAL" => Expression::Neutral,
        "HAPPY" => Expression::Happy,
        "SMILE" => Expression::Smile,
        "SAD" => Expression::Sad,
        "ANGRY" => Expression::Angry,
        "CONFUSE" => Expression::Confuse,
        "CRY" => Expression::Cry,
        "THINKING" => Expression::Thinking,
        "SLEEPING" => Expression::Sleeping,
        "EXCITED" => Expression::Excited,
        "PLAYFUL" => Expression::Playful,
        "LOVING" => Expression::Loving,
        "PROUD" => Expression::Proud,
        "RELAXED" => Expression::Relaxed,
        "FRUSTRATED" => Expression::Frustrated,
        "EMBARRASSED" => Expression::Embarrassed,
        "SCARED" => Expression::Scared,
        _ => Expression::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_fall_back_to_neutral() {
        assert_eq!(expression_for_tag("HAPPY"), Expression::Happy);
        assert_eq!(expression_for_tag("GLORIOUS"), Expression::Neutral);
        assert_eq!(expression_for_tag(""), Expression::Neutral);
    }
}
