// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Refit main entry point - CLI commands.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use refit::config::{load_settings, PromptSettings};
use refit::handler::{ChatHandler, ChatRequest};
use refit::manifest::sync_commands;
use refit::prompt::BUILTIN_TEMPLATES;
use refit::providers::{create_provider, ProviderConfig};
use refit::stream::{ChatSink, EditBuffer, TextBuffer};
use refit::telemetry::{init_telemetry, TelemetryConfig};
use refit::types::{BoxedProvider, ModelSelector, RequestOptions};

/// Refit - slash-command chat assistant for code refactoring.
#[derive(Parser)]
#[command(name = "refit")]
#[command(author, version, about = "Slash-command chat assistant for code refactoring", long_about = None)]
struct Cli {
    /// Model vendor (openai, ollama, openai-compatible)
    #[arg(long, env = "REFIT_VENDOR", default_value = "openai")]
    vendor: String,

    /// Model family within the vendor
    #[arg(long, env = "REFIT_FAMILY", default_value = "gpt-4o")]
    family: String,

    /// Override the model identifier
    #[arg(short, long, env = "REFIT_MODEL")]
    model: Option<String>,

    /// Base URL for the API
    #[arg(long, env = "REFIT_BASE_URL")]
    base_url: Option<String>,

    /// Maximum tokens the model may generate
    #[arg(long, env = "REFIT_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one chat turn and stream the response to stdout
    Chat {
        /// The prompt; an embedded /command is routed to its template
        prompt: String,

        /// Attach a file as context (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Slash command to apply (defaults to detecting one in the prompt)
        #[arg(short, long)]
        command: Option<String>,
    },

    /// Rewrite a file in place from the model's response to its contents
    Edit {
        /// File to rewrite
        file: PathBuf,
    },

    /// List built-in and configured commands
    Commands,

    /// Reconcile a manifest's command list with the prompt configuration
    SyncCommands {
        /// Path to the manifest file
        #[arg(long, default_value = "package.json")]
        manifest: PathBuf,
    },
}

/// Streams chat output to the terminal.
struct TerminalSink;

impl ChatSink for TerminalSink {
    fn markdown(&mut self, fragment: &str) {
        use std::io::Write;
        print!("{fragment}");
        let _ = std::io::stdout().flush();
    }

    fn progress(&mut self, message: &str) {
        eprintln!("{}", message.dimmed());
    }

    fn reference(&mut self, path: &Path) {
        eprintln!("{} {}", "reference:".dimmed(), path.display());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::development()
    } else {
        TelemetryConfig::default()
    };
    let _guard = init_telemetry(&telemetry)?;

    match &cli.command {
        Command::Chat {
            prompt,
            files,
            command,
        } => run_chat(&cli, prompt, files, command.as_deref()).await,
        Command::Edit { file } => run_edit(&cli, file).await,
        Command::Commands => run_commands(),
        Command::SyncCommands { manifest } => run_sync(manifest),
    }
}

fn build_handler(cli: &Cli) -> anyhow::Result<ChatHandler> {
    let selector = ModelSelector::new(&cli.vendor, &cli.family);

    let config = ProviderConfig {
        api_key: std::env::var("OPENAI_API_KEY").ok(),
        base_url: cli
            .base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok()),
        model: cli.model.clone(),
        timeout_ms: None,
    };

    let provider: BoxedProvider = create_provider(&selector, config)?;

    let mut options = RequestOptions::default();
    options.max_tokens = cli.max_tokens;

    Ok(ChatHandler::new(provider).with_options(options))
}

fn workspace_settings() -> anyhow::Result<PromptSettings> {
    let cwd = std::env::current_dir()?;
    Ok(load_settings(&cwd)?)
}

async fn run_chat(
    cli: &Cli,
    prompt: &str,
    files: &[PathBuf],
    command: Option<&str>,
) -> anyhow::Result<()> {
    let handler = build_handler(cli)?;
    let settings = workspace_settings()?;

    // An explicit --command wins; otherwise a /command embedded in the
    // prompt routes through the custom meta-command, and plain text is
    // free-form chat.
    let command = match command {
        Some(command) => command.to_string(),
        None if prompt.contains('/') => "custom".to_string(),
        None => String::new(),
    };

    let request = ChatRequest {
        command,
        prompt: prompt.to_string(),
        attachments: files.to_vec(),
        active_document: None,
    };

    let mut sink = TerminalSink;
    let outcome = handler.handle(&request, &settings, &mut sink).await?;
    println!();

    if !outcome.command.is_empty() {
        eprintln!("{} {}", "command:".dimmed(), outcome.command);
    }
    Ok(())
}

async fn run_edit(cli: &Cli, file: &Path) -> anyhow::Result<()> {
    let handler = build_handler(cli)?;

    let text = std::fs::read_to_string(file)?;
    let mut buffer = TextBuffer::from_text(&text);

    handler.rewrite_buffer(&mut buffer).await?;

    std::fs::write(file, buffer.contents())?;
    eprintln!("{} {}", "rewrote".green(), file.display());
    Ok(())
}

fn run_commands() -> anyhow::Result<()> {
    let settings = workspace_settings()?;
    let overrides = settings.string_overrides();

    println!("{}", "Built-in commands:".bold());
    for (name, _) in BUILTIN_TEMPLATES {
        if overrides.get(name).is_some() {
            println!("  /{name} {}", "(overridden)".yellow());
        } else {
            println!("  /{name}");
        }
    }

    let configured: Vec<_> = overrides
        .iter()
        .filter(|(name, _)| BUILTIN_TEMPLATES.iter().all(|(builtin, _)| builtin != name))
        .collect();

    if !configured.is_empty() {
        println!();
        println!("{}", "Configured commands:".bold());
        for (name, _) in configured {
            println!("  /{name}");
        }
    }
    Ok(())
}

fn run_sync(manifest: &Path) -> anyhow::Result<()> {
    let settings = workspace_settings()?;
    let entries = sync_commands(manifest, &settings)?;

    println!(
        "{} {} ({} commands)",
        "synchronized".green(),
        manifest.display(),
        entries.len()
    );
    Ok(())
}
