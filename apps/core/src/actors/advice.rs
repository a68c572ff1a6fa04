use crate::actors::messages::{ActorError, AdviceMessage, AppError};
use crate::actors::traits::AdviceActor;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

// --- Constants ---
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HANDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// A handle to the `AdviceActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running advice actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct AdviceActorHandle {
    sender: mpsc::Sender<AdviceMessage>,
}

impl AdviceActorHandle {
    /// Creates a new `AdviceActor` for `endpoint` and returns a handle to it.
    ///
    /// This will spawn the `AdviceActorRunner` in a new Tokio task.
    pub fn new(endpoint: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint)?;
        let (sender, receiver) = mpsc::channel(8);
        let actor = AdviceActorRunner::new(receiver, endpoint)?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self { sender })
    }
}

#[async_trait]
impl AdviceActor for AdviceActorHandle {
    async fn fetch_advice(&self) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(AdviceMessage::Fetch { responder: send })
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(HANDLE_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))?
    }
}

/// Body returned by the advice service: `{"slip": {"advice": "..."}}`.
#[derive(Debug, Deserialize)]
struct AdviceSlip {
    slip: Slip,
}

#[derive(Debug, Deserialize)]
struct Slip {
    advice: String,
}

// --- Actor Runner (Internal Logic) ---
struct AdviceActorRunner {
    receiver: mpsc::Receiver<AdviceMessage>,
    endpoint: Url,
    client: Client,
}

impl AdviceActorRunner {
    fn new(receiver: mpsc::Receiver<AdviceMessage>, endpoint: Url) -> Result<Self, AppError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            receiver,
            endpoint,
            client,
        })
    }

    async fn run(mut self) {
        info!("AdviceActor started ({})", self.endpoint);
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }
        info!("AdviceActor stopped");
    }

    async fn handle_message(&mut self, msg: AdviceMessage) {
        match msg {
            AdviceMessage::Fetch { responder } => {
                let result = self.fetch().await;
                if let Err(e) = &result {
                    warn!("Advice fetch failed: {}", e);
                }
                let _ = responder.send(result);
            }
        }
    }

    async fn fetch(&self) -> Result<String, AppError> {
        debug!("Fetching advice from {}", self.endpoint);

        let res = self.client.get(self.endpoint.clone()).send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ActorError::AdviceError(format!(
                "Advice request failed with status {}: {}",
                status, body
            ))
            .into());
        }

        let slip: AdviceSlip = res
            .json()
            .await
            .map_err(|e| ActorError::AdviceError(format!("Unexpected advice payload: {}", e)))?;

        let advice = slip.slip.advice.trim().to_string();
        if advice.is_empty() {
            return Err(ActorError::AdviceError("Advice service returned empty advice".to_string()).into());
        }
        Ok(advice)
    }
}
