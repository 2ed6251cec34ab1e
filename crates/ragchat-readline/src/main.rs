use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use ragchat_core::{Backend, ChatConfig, MessageRole, Prefixes};
use ragchat_interaction::{InteractionManager, InteractionResult, greeting};

mod logging;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Terminal chat for RagFlow agents, RAG endpoints and Gemini", long_about = None)]
struct Cli {
    /// Remote service to talk to (ragflow, rag-chat, gemini)
    #[arg(long, env = "RAGCHAT_BACKEND", default_value_t = Backend::Ragflow)]
    backend: Backend,

    /// Delay between typed characters in milliseconds (0 prints replies at once)
    #[arg(long, default_value_t = 8)]
    typing_delay_ms: u64,

    /// Request timeout in seconds, overriding RAGCHAT_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// RagFlow session to resume, overriding RAGFLOW_SESSION_ID
    #[arg(long)]
    session_id: Option<String>,

    /// Gemini system instruction, overriding GEMINI_SYSTEM_INSTRUCTION
    #[arg(long)]
    system_instruction: Option<String>,
}

const COMMANDS: &[(&str, &str)] = &[
    ("/help", "show this help"),
    ("/session", "show the current session id"),
    ("/reset", "start a new conversation"),
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(cmd, _)| cmd.to_string()).collect(),
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
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Prints a reply with a typing effect.
///
/// Each prefix replaces the previous one; on a terminal that means printing
/// only the characters the new prefix adds.
async fn type_out(prefixes: Prefixes, is_error: bool, delay: Duration) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut shown = 0;

    for prefix in prefixes {
        let added = &prefix[shown..];
        let painted = if is_error {
            added.red()
        } else {
            added.bright_blue()
        };
        write!(stdout, "{painted}")?;
        stdout.flush()?;
        shown = prefix.len();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    writeln!(stdout)?;
    Ok(())
}

fn print_help() {
    for (cmd, description) in COMMANDS {
        println!("  {} {}", cmd.bright_cyan(), description.bright_black());
    }
    println!("  {} {}", "quit".bright_cyan(), "exit the chat".bright_black());
}

/// The main entry point for the ragchat REPL.
///
/// Reads a line, resolves it against the configured backend, then replays the
/// reply character by character.
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads RAGCHAT_BACKEND
    ragchat_core::config::load_dotenv();
    let cli = Cli::parse();
    let _log_guard = logging::init()?;

    let mut config = ChatConfig::load(cli.backend)?;
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(session_id) = cli.session_id {
        config = config.with_session_id(session_id);
    }
    if let Some(instruction) = cli.system_instruction {
        config = config.with_system_instruction(instruction);
    }

    let backend = config.backend();
    let manager = InteractionManager::from_config(config);
    let delay = Duration::from_millis(cli.typing_delay_ms);
    tracing::info!("Starting ragchat with backend {}", backend);

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!(
        "{}",
        format!("=== ragchat ({}) ===", manager.expertise()).bright_magenta().bold()
    );
    println!(
        "{}",
        "Type a question, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();
    println!("{}", format!("[{}]", MessageRole::System.display_name()).bright_magenta());
    println!("{}", greeting(backend).bright_blue());

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match trimmed {
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/session" => {
                        match manager.session_id().await {
                            Some(id) => println!("{}", format!("Session: {id}").bright_black()),
                            None => println!("{}", "No session yet".bright_black()),
                        }
                        continue;
                    }
                    "/reset" => {
                        manager.reset_session().await;
                        println!("{}", "Started a new conversation".bright_black());
                        continue;
                    }
                    _ => {}
                }

                match manager.handle_input(trimmed, MessageRole::User).await {
                    InteractionResult::NoOp => {}
                    InteractionResult::Reply { turn, prefixes } => {
                        println!(
                            "{}",
                            format!("[{}]", MessageRole::Assistant.display_name()).bright_magenta()
                        );
                        if turn.is_empty_answer() {
                            println!("{}", "(no content)".bright_black());
                        } else {
                            type_out(prefixes, turn.is_error(), delay).await?;
                        }
                        println!();
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
