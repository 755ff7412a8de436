use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use erpa_application::ChatUseCase;
use erpa_core::backend::Attachment;
use erpa_core::config::ClientConfig;
use erpa_core::session::{ChatContext, ChatTurn, MessageRole};
use erpa_infrastructure::ConfigStorage;
use erpa_interaction::HttpBackend;

mod commands;
mod terminal;

use commands::{COMMANDS, ReplCommand, help_text, hint_for, is_unknown_command};
use terminal::to_terminal_text;

#[derive(Parser)]
#[command(name = "erpa")]
#[command(about = "ERPA - chat with your ERP assistant from the terminal", long_about = None)]
struct Args {
    /// ERP base URL, overrides config file and environment
    #[arg(long)]
    base_url: Option<String>,

    /// Path to config.toml (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Rustyline helper: command and path completion, argument hints, and
/// highlighting that flags unknown commands.
struct CliHelper {
    files: FilenameCompleter,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];

        if typed.starts_with("/attach ") {
            return self.files.complete(line, pos, ctx);
        }
        if typed.starts_with('/') && !typed.contains(' ') {
            let candidates: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(name, _)| name.starts_with(typed))
                .map(|(name, _)| Pair {
                    display: name.to_string(),
                    replacement: name.to_string(),
                })
                .collect();
            return Ok((0, candidates));
        }
        Ok((0, vec![]))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if is_unknown_command(line) {
            Owned(line.red().to_string())
        } else if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        hint_for(line)
    }
}

impl Validator for CliHelper {}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let storage = match &args.config {
        Some(path) => ConfigStorage::new(path.clone()),
        None => ConfigStorage::default_location()?,
    };
    let mut config = storage
        .load_with_env()
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &ClientConfig, verbose: bool) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Tracks which parts of the conversation have already been printed.
struct Printer {
    shown: usize,
}

impl Printer {
    fn new() -> Self {
        Self { shown: 0 }
    }

    /// Prints turns appended since the last call, then any notices.
    fn flush(&mut self, ctx: &mut ChatContext) {
        let transcript = ctx.transcript();
        if transcript.len() < self.shown {
            self.shown = 0;
        }
        for turn in &transcript[self.shown..] {
            print_turn(turn);
        }
        self.shown = transcript.len();

        for notice in ctx.drain_notices() {
            println!("{}", format!("ℹ {}", notice.message).yellow());
        }
    }
}

fn print_turn(turn: &ChatTurn) {
    let text = to_terminal_text(&turn.content);
    match turn.role {
        MessageRole::User => {
            for line in text.lines() {
                println!("{}", format!("> {line}").green());
            }
        }
        MessageRole::Assistant if turn.is_failure() => {
            for line in text.lines() {
                println!("{}", line.red());
            }
        }
        MessageRole::Assistant => {
            for line in text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }

    if let Some(usage) = turn.token_usage {
        println!(
            "{}",
            format!(
                "(tokens: {} in / {} out / {} total)",
                usage.input, usage.output, usage.total
            )
            .bright_black()
        );
    }
    for (index, affordance) in turn.affordances.iter().enumerate() {
        println!(
            "{}",
            format!("  [{}] {}", index + 1, affordance.label()).bright_yellow()
        );
    }
    println!();
}

async fn handle(
    usecase: &ChatUseCase,
    ctx: &mut ChatContext,
    attachment: &mut Option<Attachment>,
    command: ReplCommand,
) {
    match command {
        ReplCommand::Quit => {}
        ReplCommand::Help => println!("{}", help_text().bright_black()),
        ReplCommand::Invalid(message) => println!("{}", message.yellow()),
        ReplCommand::Message(text) => {
            if let Err(err) = usecase.submit_message(ctx, &text, attachment.take()).await {
                println!("{}", err.user_message().yellow());
            }
        }
        ReplCommand::Attach(path) => match std::fs::read(&path) {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let file = Attachment::new(file_name, bytes);
                println!(
                    "{}",
                    format!(
                        "📎 {} will be sent with your next message. Type '.' to send it on its own.",
                        file.file_name
                    )
                    .bright_black()
                );
                *attachment = Some(file);
            }
            Err(err) => println!("{}", format!("Cannot read {}: {err}", path.display()).red()),
        },
        ReplCommand::Run(number) => match ctx.latest_affordances().get(number - 1).cloned() {
            Some(affordance) => usecase.invoke_affordance(ctx, &affordance).await,
            None => println!("{}", format!("There is no suggestion {number}.").yellow()),
        },
        ReplCommand::Workflow(command) => usecase.respond_to_extraction(ctx, command).await,
        ReplCommand::NewChat => {
            usecase.new_chat(ctx);
            println!("{}", "Started a new chat.".bright_green());
        }
        ReplCommand::ClearHistory => usecase.clear_history(ctx).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config, args.verbose);

    tracing::info!(target: "session", "[Repl] Connecting to {}", config.base_url);
    let backend = Arc::new(HttpBackend::new(config.clone())?);
    let usecase = ChatUseCase::new(backend).with_config(&config);
    let mut ctx = ChatContext::new();
    let mut printer = Printer::new();
    let mut attachment: Option<Attachment> = None;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== ERPA ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Connected to {}. Type '/help' for commands, or 'quit' to exit.", config.base_url)
            .bright_black()
    );
    println!();

    loop {
        let prompt = if attachment.is_some() { "📎>> " } else { ">> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                // A lone "." sends the pending attachment without text.
                let command = if trimmed == "." && attachment.is_some() {
                    ReplCommand::Message(String::new())
                } else {
                    ReplCommand::parse(trimmed)
                };
                if command == ReplCommand::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                handle(&usecase, &mut ctx, &mut attachment, command).await;
                printer.flush(&mut ctx);
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
