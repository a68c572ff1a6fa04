//! Key-value persistence for memory and the chat log.
//!
//! Each entry is a JSON document stored under a fixed key in a single
//! `kv_store` table. There is no schema versioning.

use crate::error::AppError;
use crate::models::{ChatEntry, Memory};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const PHRASES_KEY: &str = "phrases";
pub const RESPONSES_KEY: &str = "responses";
pub const CHAT_LOG_KEY: &str = "chatLog";

/// Opens (creating if needed) the store at `path`, or a private in-memory store when `None`.
pub async fn init_db(path: Option<&Path>) -> Result<SqlitePool, sqlx::Error> {
    let (options, max_connections) = match path {
        Some(path) => {
            info!("Initializing database at: {:?}", path);
            (
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true),
                5,
            )
        }
        None => {
            debug!("Initializing in-memory database");
            // Every connection to :memory: is a separate database, so stay on one.
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        }
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database initialized.");

    Ok(pool)
}

// --- Raw entries ---

pub async fn get_raw(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
pub async fn set_raw(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

async fn set_json_in<T: Serialize + ?Sized>(
    tx: &mut Transaction<'_, Sqlite>,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(json)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Reads a JSON entry. Absent or malformed entries yield `T::default()`.
async fn get_json_or_default<T>(pool: &SqlitePool, key: &str) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = get_raw(pool, key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Stored entry '{}' is malformed, treating it as empty: {}", key, e);
            Ok(T::default())
        }
    }
}

// --- Memory ---

/// Loads the learned phrases and responses. A fresh store yields an empty memory.
pub async fn load_memory(pool: &SqlitePool) -> Result<Memory, AppError> {
    let phrases: Vec<String> = get_json_or_default(pool, PHRASES_KEY).await?;
    let responses: Vec<String> = get_json_or_default(pool, RESPONSES_KEY).await?;

    if phrases.len() != responses.len() {
        warn!(
            "Stored memory is inconsistent ({} phrases, {} responses); truncating to the shorter list",
            phrases.len(),
            responses.len()
        );
    }

    let memory = Memory::from_parts(phrases, responses);
    info!("Loaded {} learned phrases", memory.len());
    Ok(memory)
}

/// Writes both lists in one transaction; the last writer wins.
pub async fn save_memory(pool: &SqlitePool, memory: &Memory) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    set_json_in(&mut tx, PHRASES_KEY, memory.phrases()).await?;
    set_json_in(&mut tx, RESPONSES_KEY, memory.responses()).await?;
    tx.commit().await?;
    debug!("Saved {} learned phrases", memory.len());
    Ok(())
}

// --- Chat log ---

pub async fn load_chat_log(pool: &SqlitePool) -> Result<Vec<ChatEntry>, AppError> {
    get_json_or_default(pool, CHAT_LOG_KEY).await
}

/// Appends one exchange, dropping the oldest entries beyond `cap`.
pub async fn append_chat_log(
    pool: &SqlitePool,
    entry: ChatEntry,
    cap: usize,
) -> Result<(), AppError> {
    let mut log = load_chat_log(pool).await?;
    log.push(entry);
    if log.len() > cap {
        let excess = log.len() - cap;
        log.drain(..excess);
    }

    let mut tx = pool.begin().await?;
    set_json_in(&mut tx, CHAT_LOG_KEY, &log).await?;
    tx.commit().await?;
    Ok(())
}
