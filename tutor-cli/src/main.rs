//! `lingua`: practise French with the tutor from a terminal.

mod command;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tutor_adapters::completion::{AdapterCompletion, CompletionParams, RetryPolicy};
use tutor_adapters::openai::{OpenAiAdapter, OpenAiConfig};
use tutor_config::{ENV_API_KEY, TutorConfig};
use tutor_kernel::{Reply, SessionController};
use tutor_primitives::{ExerciseKind, Topic};

use command::{Command, HELP};

#[derive(Parser, Debug)]
#[command(
    name = "lingua",
    version,
    about = "Interactive French tutor backed by a chat-completion API"
)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chat model identifier
    #[arg(long)]
    model: Option<String>,

    /// Exercise to start with (fill-blank, qa, conversation, vocab-match)
    #[arg(short, long)]
    kind: Option<ExerciseKind>,

    /// Topic for the first exercise; empty lets the tutor choose
    #[arg(short, long, default_value = "")]
    topic: String,

    /// Log filter directive, e.g. `info` or `tutor_kernel=debug`
    #[arg(long)]
    log_filter: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<TutorConfig> {
        let mut config = TutorConfig::load(self.config.as_deref())?;
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(filter) = &self.log_filter {
            config.log_filter.clone_from(filter);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    tutor_telemetry::init_tracing(&config.log_filter)?;

    let mut session = build_session(&config)?;
    info!(session_id = %session.id(), model = %config.model, "tutor ready");

    println!("{HELP}\n");
    if let Some(kind) = cli.kind {
        let reply = session.reset(Topic::new(&cli.topic), kind).await?;
        show(&reply);
    }

    run(&mut session).await
}

fn build_session(config: &TutorConfig) -> Result<SessionController> {
    let api_key = config
        .api_key
        .clone()
        .with_context(|| format!("{ENV_API_KEY} is not set"))?;

    let openai = OpenAiConfig::new(config.model.clone())
        .with_api_key(api_key)
        .with_base_url(&config.base_url)?
        .with_default_temperature(config.temperature)
        .with_timeout(config.request_timeout());
    let adapter = OpenAiAdapter::new(openai)?;

    let policy = RetryPolicy::new(config.request_timeout())
        .with_max_retries(config.max_retries)
        .with_backoff(config.retry_backoff())
        .with_max_delay(config.request_timeout());
    let completion = AdapterCompletion::new(Arc::new(adapter)).with_policy(policy);

    let params = CompletionParams {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    Ok(SessionController::new(Arc::new(completion), params))
}

async fn run(session: &mut SessionController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Blank => {}
            Command::Help => println!("{HELP}"),
            Command::Invalid(message) => println!("{message}"),
            Command::New { kind, topic } => show(&session.reset(topic, kind).await?),
            Command::Say(text) => show(&session.respond(text).await?),
        }
    }

    info!(session_id = %session.id(), "tutor closed");
    Ok(())
}

fn show(reply: &Reply) {
    println!("{reply}\n");
}
