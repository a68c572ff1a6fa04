use crate::actors::messages::AppError;
use crate::actors::supervisor::{spawn_thinker, SupervisorHandle};
use crate::actors::traits::AdviceActor;
use crate::brain::inference::WARMING_UP;
use crate::config::BrainConfig;
use crate::database;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

// --- Mock Components ---

struct MockAdviceActor {
    calls: AtomicUsize,
}

impl MockAdviceActor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AdviceActor for MockAdviceActor {
    async fn fetch_advice(&self) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Take a walk.".to_string())
    }
}

fn test_config() -> BrainConfig {
    BrainConfig {
        think_interval_secs: 0,
        seed: Some(7),
        ..BrainConfig::default()
    }
}

async fn start(config: BrainConfig) -> (SupervisorHandle, SqlitePool, Arc<MockAdviceActor>) {
    let pool = database::init_db(None).await.unwrap();
    let advice = MockAdviceActor::new();
    let supervisor = SupervisorHandle::start_with_advice(config, pool.clone(), advice.clone())
        .await
        .unwrap();
    (supervisor, pool, advice)
}

#[tokio::test]
async fn test_first_phrase_gets_warm_up_answer() {
    let (supervisor, _pool, _) = start(test_config()).await;

    let reply = supervisor.process_message("hello".to_string()).await.unwrap();

    assert!(reply.learned);
    assert_eq!(reply.text, WARMING_UP);
    assert!(reply.prediction.is_none());

    let taught = supervisor.taught().await.unwrap();
    assert_eq!(
        taught,
        vec![("hello".to_string(), "You said: \"hello\"".to_string())]
    );
}

#[tokio::test]
async fn test_second_phrase_trains_and_echoes() {
    let (supervisor, pool, _) = start(test_config()).await;

    supervisor.process_message("hello".to_string()).await.unwrap();
    let reply = supervisor.process_message("world".to_string()).await.unwrap();

    assert!(reply.learned);
    assert!(reply.text.starts_with("You said: \""));
    assert!(reply.text.ends_with("(and now you said \"world\")"));

    let prediction = reply.prediction.expect("a trained model answers");
    assert_eq!(prediction.labels.len(), 2);
    assert_eq!(
        supervisor.last_prediction().await.unwrap(),
        Some(prediction)
    );

    let status = supervisor.status().await.unwrap();
    assert_eq!(status.phrases, 2);
    assert!(status.model_ready);

    let log = database::load_chat_log(&pool).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].response, WARMING_UP);
    assert_eq!(log[1].prompt, "world");
}

#[tokio::test]
async fn test_known_phrase_does_not_retrain() {
    let (supervisor, _pool, _) = start(test_config()).await;

    supervisor.process_message("hello".to_string()).await.unwrap();
    supervisor.process_message("world".to_string()).await.unwrap();
    let before = supervisor.status().await.unwrap();

    let reply = supervisor.process_message("hello".to_string()).await.unwrap();

    assert!(!reply.learned);
    assert!(reply.prediction.is_some());
    assert_eq!(supervisor.status().await.unwrap(), before);
}

#[tokio::test]
async fn test_input_is_trimmed_and_empty_rejected() {
    let (supervisor, pool, _) = start(test_config()).await;

    let result = supervisor.process_message("   ".to_string()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    supervisor.process_message("  padded  ".to_string()).await.unwrap();
    let taught = supervisor.taught().await.unwrap();
    assert_eq!(taught[0].0, "padded");
    assert_eq!(database::load_chat_log(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_memory_is_capped_to_newest_phrases() {
    let config = BrainConfig {
        max_memory: 3,
        ..test_config()
    };
    let (supervisor, pool, _) = start(config).await;

    for phrase in ["a", "b", "c", "d", "e"] {
        supervisor.process_message(phrase.to_string()).await.unwrap();
    }

    let phrases: Vec<String> = supervisor
        .taught()
        .await
        .unwrap()
        .into_iter()
        .map(|(p, _)| p)
        .collect();
    assert_eq!(phrases, vec!["c", "d", "e"]);

    let stored = database::load_memory(&pool).await.unwrap();
    assert_eq!(stored.phrases(), ["c", "d", "e"].map(String::from));
    assert_eq!(database::load_chat_log(&pool).await.unwrap().len(), 3);
    assert!(supervisor.status().await.unwrap().model_ready);
}

#[tokio::test]
async fn test_session_reloads_from_store() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("echomind.sqlite");

    {
        let pool = database::init_db(Some(&path)).await.unwrap();
        let supervisor =
            SupervisorHandle::start_with_advice(test_config(), pool.clone(), MockAdviceActor::new())
                .await
                .unwrap();
        for phrase in ["one", "two", "three"] {
            supervisor.process_message(phrase.to_string()).await.unwrap();
        }
        supervisor.shutdown().await.unwrap();
        pool.close().await;
    }

    let pool = database::init_db(Some(&path)).await.unwrap();
    let supervisor = SupervisorHandle::start_with_advice(test_config(), pool, MockAdviceActor::new())
        .await
        .unwrap();

    let status = supervisor.status().await.unwrap();
    assert_eq!(status.phrases, 3);
    assert!(status.model_ready);
    assert_eq!(status.trainings, 1);

    let reply = supervisor.process_message("two".to_string()).await.unwrap();
    assert!(!reply.learned);
    assert!(reply.prediction.is_some());
}

#[tokio::test]
async fn test_reload_trims_oversized_store() {
    let pool = database::init_db(None).await.unwrap();
    database::set_raw(&pool, database::PHRASES_KEY, r#"["a", "b", "c", "d"]"#)
        .await
        .unwrap();
    database::set_raw(&pool, database::RESPONSES_KEY, r#"["A", "B", "C", "D"]"#)
        .await
        .unwrap();

    let config = BrainConfig {
        max_memory: 2,
        ..test_config()
    };
    let supervisor = SupervisorHandle::start_with_advice(config, pool.clone(), MockAdviceActor::new())
        .await
        .unwrap();

    assert_eq!(supervisor.status().await.unwrap().phrases, 2);
    let stored = database::load_memory(&pool).await.unwrap();
    assert_eq!(stored.responses(), ["C", "D"].map(String::from));
}

#[tokio::test]
async fn test_advice_rule_calls_advice_actor() {
    let (supervisor, _pool, advice) = start(test_config()).await;

    let first = supervisor
        .process_message("any advice?".to_string())
        .await
        .unwrap();
    // warm-up answers are not crafted
    assert_eq!(first.text, WARMING_UP);
    assert_eq!(advice.calls.load(Ordering::SeqCst), 0);

    supervisor.process_message("hello".to_string()).await.unwrap();
    let reply = supervisor
        .process_message("any advice?".to_string())
        .await
        .unwrap();

    assert_eq!(reply.text, "Here's some advice: Take a walk.");
    assert_eq!(advice.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_arithmetic_overrides_classifier() {
    let (supervisor, _pool, _) = start(test_config()).await;

    supervisor.process_message("hello".to_string()).await.unwrap();
    let reply = supervisor.process_message("what is 6 * 7".to_string()).await.unwrap();

    assert_eq!(reply.text, "The answer is 42.");
}

#[tokio::test]
async fn test_self_thought_with_empty_memory() {
    let (supervisor, pool, _) = start(test_config()).await;

    assert!(supervisor.self_thought().await.unwrap().is_none());
    assert!(database::load_chat_log(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_self_thought_is_logged_but_not_learned() {
    let (supervisor, pool, _) = start(test_config()).await;

    supervisor.process_message("hello".to_string()).await.unwrap();
    supervisor.process_message("world".to_string()).await.unwrap();

    let thought = supervisor.self_thought().await.unwrap().expect("a phrase to think about");

    assert!(["hello", "world"].contains(&thought.phrase.as_str()));
    assert!(thought.prediction.is_some());
    assert_eq!(supervisor.status().await.unwrap().phrases, 2);

    let log = database::load_chat_log(&pool).await.unwrap();
    let last = log.last().unwrap();
    assert_eq!(last.prompt, format!("[self-thought] {}", thought.phrase));
    assert_eq!(last.response, thought.text);
}

#[tokio::test]
async fn test_self_thought_teaching_grows_memory() {
    let config = BrainConfig {
        self_thought_teaches: true,
        ..test_config()
    };
    let (supervisor, _pool, _) = start(config).await;

    supervisor.process_message("hello".to_string()).await.unwrap();
    supervisor.process_message("world".to_string()).await.unwrap();

    let thought = supervisor.self_thought().await.unwrap().unwrap();

    let taught = supervisor.taught().await.unwrap();
    assert_eq!(taught.len(), 3);
    assert_eq!(taught[2].0, thought.text);
}

#[tokio::test]
async fn test_warm_up_self_thought_is_never_taught() {
    let config = BrainConfig {
        self_thought_teaches: true,
        ..test_config()
    };
    let (supervisor, _pool, _) = start(config).await;

    supervisor.process_message("alone".to_string()).await.unwrap();
    let thought = supervisor.self_thought().await.unwrap().unwrap();

    assert_eq!(thought.text, WARMING_UP);
    assert_eq!(supervisor.status().await.unwrap().phrases, 1);
}

#[tokio::test]
async fn test_thinker_delivers_thoughts() {
    let (supervisor, _pool, _) = start(test_config()).await;
    supervisor.process_message("ping".to_string()).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let thinker = spawn_thinker(supervisor.clone(), Duration::from_millis(20), move |thought| {
        let _ = tx.send(thought);
    });

    let thought = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("thinker should fire")
        .unwrap();
    assert_eq!(thought.phrase, "ping");

    thinker.abort();
}

#[tokio::test]
async fn test_chat_log_query_returns_newest_entries() {
    let (supervisor, _pool, _) = start(test_config()).await;

    for phrase in ["a", "b", "c"] {
        supervisor.process_message(phrase.to_string()).await.unwrap();
    }

    let recent = supervisor.chat_log(2).await.unwrap();
    let prompts: Vec<&str> = recent.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["b", "c"]);
}

#[tokio::test]
async fn test_shutdown_closes_mailbox() {
    let (supervisor, _pool, _) = start(test_config()).await;
    supervisor.shutdown().await.unwrap();

    // the runner drops its receiver once the loop exits
    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = supervisor.status().await;
    assert!(matches!(result, Err(AppError::Actor(_))));
}
