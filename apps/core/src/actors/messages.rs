use crate::models::{ChatEntry, Prediction, Reply, Thought};
use serde::Serialize;
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// An error originating from the advice actor.
    #[error("Advice request failed: {0}")]
    AdviceError(String),
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `AdviceActor`.
#[derive(Debug)]
pub enum AdviceMessage {
    /// A request for one piece of advice.
    Fetch {
        /// A channel to send the advice text back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// Snapshot of the supervisor's session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BrainStatus {
    /// Number of learned phrase/response pairs.
    pub phrases: usize,
    /// Whether a model matching the current memory is available.
    pub model_ready: bool,
    /// How many times the model has been retrained since start.
    pub trainings: usize,
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A user submission: learn it if new, then answer it.
    ProcessUserMessage {
        content: String,
        /// A channel to send the crafted reply back.
        responder: oneshot::Sender<Result<Reply, AppError>>,
    },
    /// One unattended self-thought cycle. `None` when nothing has been learned yet.
    SelfThought {
        responder: oneshot::Sender<Result<Option<Thought>, AppError>>,
    },
    /// The learned phrase → response pairs, oldest first.
    ListTaught {
        responder: oneshot::Sender<Vec<(String, String)>>,
    },
    /// The prediction behind the most recent answer, for charting.
    LastPrediction {
        responder: oneshot::Sender<Option<Prediction>>,
    },
    /// The newest `limit` chat log entries.
    ChatLog {
        limit: usize,
        responder: oneshot::Sender<Result<Vec<ChatEntry>, AppError>>,
    },
    Status {
        responder: oneshot::Sender<BrainStatus>,
    },
    /// A command to stop the supervisor loop.
    Shutdown,
}
