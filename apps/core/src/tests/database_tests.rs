//! Database Module Tests
//!
//! Persistence of memory and the chat log in the key-value store.

use crate::database;
use crate::models::{ChatEntry, Memory};
use sqlx::sqlite::SqlitePool;
use tempfile::tempdir;

/// Create a test database pool backed by memory
async fn create_test_pool() -> SqlitePool {
    database::init_db(None)
        .await
        .expect("Failed to create test pool")
}

fn memory_of(pairs: &[(&str, &str)]) -> Memory {
    let mut memory = Memory::default();
    for (phrase, response) in pairs {
        memory.learn(phrase, response.to_string());
    }
    memory
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load_memory() {
        let pool = create_test_pool().await;
        let memory = memory_of(&[("hello", "You said: \"hello\""), ("world", "You said: \"world\"")]);

        database::save_memory(&pool, &memory).await.unwrap();
        let loaded = database::load_memory(&pool).await.unwrap();

        assert_eq!(loaded, memory);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_memory() {
        let pool = create_test_pool().await;
        database::save_memory(&pool, &memory_of(&[("a", "1"), ("b", "2")]))
            .await
            .unwrap();
        database::save_memory(&pool, &memory_of(&[("c", "3")]))
            .await
            .unwrap();

        let loaded = database::load_memory(&pool).await.unwrap();
        assert_eq!(loaded.phrases(), ["c".to_string()]);
    }

    #[tokio::test]
    async fn test_stored_as_json_arrays() {
        let pool = create_test_pool().await;
        database::save_memory(&pool, &memory_of(&[("hi", "You said: \"hi\"")]))
            .await
            .unwrap();

        let raw = database::get_raw(&pool, database::PHRASES_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw, r#"["hi"]"#);
    }

    #[tokio::test]
    async fn test_malformed_entry_loads_as_empty() {
        let pool = create_test_pool().await;
        database::set_raw(&pool, database::PHRASES_KEY, "{not json")
            .await
            .unwrap();
        database::set_raw(&pool, database::RESPONSES_KEY, r#"["x"]"#)
            .await
            .unwrap();

        let loaded = database::load_memory(&pool).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_lists_are_truncated() {
        let pool = create_test_pool().await;
        database::set_raw(&pool, database::PHRASES_KEY, r#"["a", "b", "c"]"#)
            .await
            .unwrap();
        database::set_raw(&pool, database::RESPONSES_KEY, r#"["A"]"#)
            .await
            .unwrap();

        let loaded = database::load_memory(&pool).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.pairs().collect::<Vec<_>>(), vec![("a", "A")]);
    }

    #[tokio::test]
    async fn test_memory_survives_reopening_the_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("echomind.sqlite");
        let memory = memory_of(&[("first", "1"), ("second", "2")]);

        {
            let pool = database::init_db(Some(&path)).await.unwrap();
            database::save_memory(&pool, &memory).await.unwrap();
            pool.close().await;
        }

        let pool = database::init_db(Some(&path)).await.unwrap();
        assert_eq!(database::load_memory(&pool).await.unwrap(), memory);
    }
}

#[cfg(test)]
mod chat_log_tests {
    use super::*;

    #[tokio::test]
    async fn test_append_keeps_order() {
        let pool = create_test_pool().await;
        database::append_chat_log(&pool, ChatEntry::now("hi", "r1"), 10)
            .await
            .unwrap();
        database::append_chat_log(&pool, ChatEntry::now("there", "r2"), 10)
            .await
            .unwrap();

        let log = database::load_chat_log(&pool).await.unwrap();
        let prompts: Vec<&str> = log.iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["hi", "there"]);
        assert!(log.iter().all(|e| e.timestamp.is_some()));
    }

    #[tokio::test]
    async fn test_append_drops_oldest_beyond_cap() {
        let pool = create_test_pool().await;
        for i in 0..5 {
            database::append_chat_log(&pool, ChatEntry::now(format!("p{}", i), "r"), 3)
                .await
                .unwrap();
        }

        let log = database::load_chat_log(&pool).await.unwrap();
        let prompts: Vec<&str> = log.iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["p2", "p3", "p4"]);
    }

    #[tokio::test]
    async fn test_legacy_entries_without_timestamp() {
        let pool = create_test_pool().await;
        database::set_raw(
            &pool,
            database::CHAT_LOG_KEY,
            r#"[{"prompt": "old", "response": "entry"}]"#,
        )
        .await
        .unwrap();

        database::append_chat_log(&pool, ChatEntry::now("new", "entry"), 10)
            .await
            .unwrap();

        let log = database::load_chat_log(&pool).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].timestamp, None);
        assert_eq!(log[1].prompt, "new");
    }

    #[tokio::test]
    async fn test_chat_log_does_not_touch_memory() {
        let pool = create_test_pool().await;
        database::append_chat_log(&pool, ChatEntry::now("hi", "there"), 10)
            .await
            .unwrap();
        assert!(database::load_memory(&pool).await.unwrap().is_empty());
    }
}
