// EchoMind Entry Point
// A tiny chatbot that learns every phrase it is told and answers with a toy classifier.

mod actors;
mod brain;
mod chart;
mod config;
mod database;
mod error;
mod fs_manager;
mod models;
mod telemetry;

#[cfg(test)]
mod tests;

use actors::supervisor::{spawn_thinker, SupervisorHandle};
use anyhow::Context;
use config::BrainConfig;
use fs_manager::PortablePathManager;
use std::io::Write;
use telemetry::LogFormat;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const CHAT_LOG_PREVIEW: usize = 10;

const HELP: &str = "\
Commands:
  /taught   list every phrase learned so far
  /chart    confidence chart of the last answer
  /log      the last few exchanges
  /status   memory size and model state
  /help     this message
  /quit     leave
Anything else is a message: I learn it, then answer it.";

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Taught,
    Chart,
    Log,
    Status,
    Help,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line {
            "/taught" => Command::Taught,
            "/chart" => Command::Chart,
            "/log" => Command::Log,
            "/status" => Command::Status,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other if other.starts_with('/') => Command::Unknown(other),
            other => Command::Message(other),
        };
        Some(command)
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Runs one REPL command. Returns `false` when the session should end.
async fn dispatch(supervisor: &SupervisorHandle, command: Command<'_>) -> anyhow::Result<bool> {
    match command {
        Command::Message(text) => match supervisor.process_message(text.to_string()).await {
            Ok(reply) => println!("{}", reply.text),
            Err(e) => {
                warn!("Message failed: {}", e);
                println!("(error: {})", e);
            }
        },
        Command::Taught => {
            let pairs = supervisor.taught().await?;
            if pairs.is_empty() {
                println!("Nothing learned yet.");
            }
            for (i, (phrase, response)) in pairs.iter().enumerate() {
                println!("{:>3}. {} => {}", i + 1, phrase, response);
            }
        }
        Command::Chart => match supervisor.last_prediction().await? {
            Some(prediction) => print!("{}", chart::render(&prediction)),
            None => println!("No prediction yet. Teach me at least two phrases."),
        },
        Command::Log => {
            for entry in supervisor.chat_log(CHAT_LOG_PREVIEW).await? {
                let when = entry
                    .timestamp
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "--:--:--".to_string());
                println!("[{}] {} -> {}", when, entry.prompt, entry.response);
            }
        }
        Command::Status => {
            let status = supervisor.status().await?;
            println!(
                "{} phrases learned, model {}, {} trainings this session",
                status.phrases,
                if status.model_ready { "ready" } else { "warming up" },
                status.trainings
            );
        }
        Command::Help => println!("{}", HELP),
        Command::Unknown(other) => println!("Unknown command {}. Try /help.", other),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(LogFormat::from_env())?;

    let config = BrainConfig::from_env().context("invalid configuration")?;

    PortablePathManager::init().context("failed to initialize the data directory")?;
    let pool = database::init_db(Some(&PortablePathManager::db_file()))
        .await
        .context("failed to open the store")?;

    let supervisor = SupervisorHandle::start(config.clone(), pool)
        .await
        .context("failed to start the brain")?;

    let thinker = config.think_interval().map(|period| {
        info!("Self-thought every {:?}", period);
        spawn_thinker(supervisor.clone(), period, |thought| {
            println!("\n[thinking] {} -> {}", thought.phrase, thought.text);
            prompt();
        })
    });

    println!("EchoMind is listening. Type /help for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(command) = Command::parse(&line) {
            match dispatch(&supervisor, command).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => error!("Command failed: {:#}", e),
            }
        }
        prompt();
    }

    if let Some(thinker) = thinker {
        thinker.abort();
    }
    supervisor.shutdown().await?;
    println!("Bye!");
    Ok(())
}
