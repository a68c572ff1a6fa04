use crate::actors::advice::AdviceActorHandle;
use crate::actors::messages::{AppError, BrainStatus, SupervisorMessage};
use crate::actors::traits::AdviceActor;
use crate::brain::{craft, infer, train, Inference, Model, TrainingOptions};
use crate::config::BrainConfig;
use crate::database;
use crate::models::{echo_response, ChatEntry, Memory, Prediction, Reply, Thought};
use rand::seq::SliceRandom;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

// --- Constants ---
const PROCESS_TIMEOUT: Duration = Duration::from_secs(120);
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const SELF_THOUGHT_PREFIX: &str = "[self-thought] ";

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for all business logic in the application. The
/// actor behind it owns the session (memory, model and store) and handles one
/// message at a time, so user submissions and self-thoughts never interleave.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
}

impl SupervisorHandle {
    /// Loads the session from `pool` and spawns the supervisor with a live advice actor.
    pub async fn start(config: BrainConfig, pool: SqlitePool) -> Result<Self, AppError> {
        let advice = Arc::new(AdviceActorHandle::new(&config.advice_url)?);
        Self::start_with_advice(config, pool, advice).await
    }

    /// Same as [`SupervisorHandle::start`] with a caller-provided advice source.
    ///
    /// The persisted memory is loaded, trimmed to the configured cap and, when
    /// it holds at least two phrases, trained before the first message is served.
    pub async fn start_with_advice<A>(
        config: BrainConfig,
        pool: SqlitePool,
        advice: Arc<A>,
    ) -> Result<Self, AppError>
    where
        A: AdviceActor,
    {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner::load(receiver, config, pool, advice).await?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self { sender })
    }

    async fn request<T>(
        &self,
        msg: SupervisorMessage,
        recv: oneshot::Receiver<T>,
        limit: Duration,
    ) -> Result<T, AppError> {
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(limit, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// Processes a user submission.
    ///
    /// 1. Learns the phrase (persist, trim, retrain) if it has never been seen.
    /// 2. Runs inference, falling back to the warm-up answer without a model.
    /// 3. Crafts the final reply and appends the exchange to the chat log.
    #[instrument(skip(self))]
    pub async fn process_message(&self, content: String) -> Result<Reply, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessUserMessage {
            content,
            responder: send,
        };
        self.request(msg, recv, PROCESS_TIMEOUT).await?
    }

    /// Runs one self-thought cycle over a randomly chosen learned phrase.
    #[instrument(skip(self))]
    pub async fn self_thought(&self) -> Result<Option<Thought>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::SelfThought { responder: send }, recv, PROCESS_TIMEOUT)
            .await?
    }

    pub async fn taught(&self) -> Result<Vec<(String, String)>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::ListTaught { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn last_prediction(&self) -> Result<Option<Prediction>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::LastPrediction { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn chat_log(&self, limit: usize) -> Result<Vec<ChatEntry>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(
            SupervisorMessage::ChatLog {
                limit,
                responder: send,
            },
            recv,
            QUERY_TIMEOUT,
        )
        .await?
    }

    pub async fn status(&self) -> Result<BrainStatus, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::Status { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))
    }
}

/// Spawns the periodic self-thought trigger.
///
/// Every `period` a [`SupervisorMessage::SelfThought`] is queued behind any
/// pending user message; `on_thought` receives each completed thought.
pub fn spawn_thinker<F>(handle: SupervisorHandle, period: Duration, on_thought: F) -> JoinHandle<()>
where
    F: Fn(Thought) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = thinker_interval(period);
        loop {
            ticker.tick().await;
            match handle.self_thought().await {
                Ok(Some(thought)) => on_thought(thought),
                Ok(None) => debug!("Nothing to think about yet"),
                Err(AppError::Actor(e)) => {
                    info!("Supervisor is gone, stopping self-thought timer: {}", e);
                    break;
                }
                Err(e) => warn!("Self-thought failed: {}", e),
            }
        }
    })
}

/// First tick one `period` from now. Ticks missed during a long retrain are
/// not replayed back to back.
fn thinker_interval(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

// --- Actor Runner ---
struct SupervisorRunner<A>
where
    A: AdviceActor,
{
    receiver: mpsc::Receiver<SupervisorMessage>,
    config: BrainConfig,
    pool: SqlitePool,
    advice: Arc<A>,
    memory: Memory,
    model: Option<Model>,
    last_prediction: Option<Prediction>,
    trainings: usize,
}

impl<A> SupervisorRunner<A>
where
    A: AdviceActor,
{
    async fn load(
        receiver: mpsc::Receiver<SupervisorMessage>,
        config: BrainConfig,
        pool: SqlitePool,
        advice: Arc<A>,
    ) -> Result<Self, AppError> {
        let mut memory = database::load_memory(&pool).await?;
        let evicted = memory.trim(config.max_memory);

        let mut runner = Self {
            receiver,
            config,
            pool,
            advice,
            memory,
            model: None,
            last_prediction: None,
            trainings: 0,
        };

        if evicted > 0 {
            info!("Evicted {} phrases above the memory cap", evicted);
            runner.persist_memory().await;
        }
        if runner.memory.len() >= 2 {
            runner.retrain().await;
        }

        Ok(runner)
    }

    async fn run(mut self) {
        info!("Supervisor started with {} learned phrases", self.memory.len());
        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, SupervisorMessage::Shutdown) {
                info!("Supervisor shutting down...");
                break;
            }
            self.handle_message(msg).await;
        }
        info!("Supervisor stopped");
    }

    #[instrument(skip(self, msg))]
    async fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::ProcessUserMessage { content, responder } => {
                let result = self.handle_user_message(content).await;
                if let Err(e) = &result {
                    warn!("Error processing user message: {}", e);
                }
                let _ = responder.send(result);
            }
            SupervisorMessage::SelfThought { responder } => {
                let result = self.handle_self_thought().await;
                let _ = responder.send(result);
            }
            SupervisorMessage::ListTaught { responder } => {
                let pairs = self
                    .memory
                    .pairs()
                    .map(|(p, r)| (p.to_string(), r.to_string()))
                    .collect();
                let _ = responder.send(pairs);
            }
            SupervisorMessage::LastPrediction { responder } => {
                let _ = responder.send(self.last_prediction.clone());
            }
            SupervisorMessage::ChatLog { limit, responder } => {
                let result = database::load_chat_log(&self.pool).await.map(|mut log| {
                    let skip = log.len().saturating_sub(limit);
                    log.split_off(skip)
                });
                let _ = responder.send(result);
            }
            SupervisorMessage::Status { responder } => {
                let _ = responder.send(BrainStatus {
                    phrases: self.memory.len(),
                    model_ready: self
                        .model
                        .as_ref()
                        .is_some_and(|m| m.classes() == self.memory.len()),
                    trainings: self.trainings,
                });
            }
            SupervisorMessage::Shutdown => {}
        }
    }

    #[instrument(skip(self))]
    async fn handle_user_message(&mut self, content: String) -> Result<Reply, AppError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation("Message is empty".to_string()));
        }
        info!("Supervisor received: {}", content);

        let learned = self.learn(&content).await;
        let (text, prediction) = self.answer(&content).await;
        self.record(ChatEntry::now(content, text.clone())).await;

        Ok(Reply {
            text,
            learned,
            prediction,
        })
    }

    async fn handle_self_thought(&mut self) -> Result<Option<Thought>, AppError> {
        if self.memory.is_empty() {
            debug!("Memory is empty, skipping self-thought");
            return Ok(None);
        }
        let phrase = {
            let mut rng = rand::thread_rng();
            self.memory.phrases().choose(&mut rng).cloned()
        };
        let Some(phrase) = phrase else {
            return Ok(None);
        };

        let (text, prediction) = self.answer(&phrase).await;
        info!("Self-thought: {} -> {}", phrase, text);
        self.record(ChatEntry::now(format!("{}{}", SELF_THOUGHT_PREFIX, phrase), text.clone()))
            .await;

        if self.config.self_thought_teaches && prediction.is_some() {
            self.learn(&text).await;
        }

        Ok(Some(Thought {
            phrase,
            text,
            prediction,
        }))
    }

    /// Inference followed by crafting. The warm-up answer is returned as-is.
    async fn answer(&mut self, input: &str) -> (String, Option<Prediction>) {
        let inference = infer(self.model.as_ref(), &self.memory, input);
        let text = match &inference {
            Inference::WarmingUp => inference.text().to_string(),
            Inference::Answer { response, .. } => {
                craft(response, input, self.advice.as_ref()).await
            }
        };
        let prediction = inference.prediction().cloned();
        if prediction.is_some() {
            self.last_prediction = prediction.clone();
        }
        (text, prediction)
    }

    /// Teaches `phrase` if unseen. Returns whether memory changed.
    async fn learn(&mut self, phrase: &str) -> bool {
        if !self.memory.learn(phrase, echo_response(phrase)) {
            debug!("Phrase already known, no retraining");
            return false;
        }
        let evicted = self.memory.trim(self.config.max_memory);
        if evicted > 0 {
            debug!("Evicted {} oldest phrases", evicted);
        }
        self.persist_memory().await;
        self.retrain().await;
        true
    }

    async fn persist_memory(&self) {
        if let Err(e) = database::save_memory(&self.pool, &self.memory).await {
            warn!("Failed to persist memory, continuing in-memory only: {}", e);
        }
    }

    async fn record(&self, entry: ChatEntry) {
        if let Err(e) = database::append_chat_log(&self.pool, entry, self.config.max_memory).await {
            warn!("Failed to append to chat log: {}", e);
        }
    }

    /// Drops the current model and trains a new one from the whole memory.
    async fn retrain(&mut self) {
        self.model = None;
        self.trainings += 1;

        let memory = self.memory.clone();
        let options = TrainingOptions::from(&self.config);
        match tokio::task::spawn_blocking(move || train(&memory, &options)).await {
            Ok(model) => {
                if let Some(model) = &model {
                    debug!(
                        classes = model.classes(),
                        policy = %model.policy(),
                        "Model ready, final loss {:.4}",
                        model.final_loss()
                    );
                }
                self.model = model;
            }
            Err(e) => error!("Training task failed: {}", AppError::from(e)),
        }
    }
}
