use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use chatmind::batch::TestBatchController;
use chatmind::cases::{read_text_lossy, write_csv_template};
use chatmind::chat::{ApiStatus, ChatController};
use chatmind::cli::{parse_chat_input, Args, ChatInput, Command};
use chatmind::client::{Backend, HttpBackend};
use chatmind::config::ClientConfig;
use chatmind::models::ModelSelector;
use chatmind::render::{html, terminal};
use chatmind::view::bubble_view;
use chatmind::Result;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }
    init_tracing();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatmind=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    if let Command::Completions { shell } = args.command {
        clap_complete::generate(shell, &mut Args::command(), "chatmind", &mut io::stdout());
        return Ok(());
    }

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(url) = args.base_url {
        config = config.with_base_url(url).validated()?;
    }
    debug!(base_url = %config.base_url, "configuration loaded");

    if let Command::Template { out } = &args.command {
        let dir = out.clone().unwrap_or_else(|| config.export_dir.clone());
        let path = write_csv_template(&dir)?;
        println!("{} {}", "✓ Template written to".bright_green(), path.display());
        return Ok(());
    }

    let backend = HttpBackend::new(&config)?;
    match args.command {
        Command::Chat { message: Some(message) } => {
            let mut chat = ChatController::new(&backend);
            send_and_print(&mut chat, &message).await;
        }
        Command::Chat { message: None } => interactive_chat(&backend).await?,
        Command::History => {
            let mut chat = ChatController::new(&backend);
            if chat.load_history().await? == 0 {
                println!("{}", "No conversation history in this session.".dimmed());
            }
            for message in chat.transcript() {
                print!("{}", terminal::bubble(&bubble_view(message)));
            }
        }
        Command::ClearHistory { yes } => {
            let mut chat = ChatController::new(&backend);
            let cleared = chat
                .clear_history(|| yes || confirm("Are you sure you want to clear the chat history?"))
                .await?;
            if cleared {
                println!("{}", "✓ Chat history cleared".bright_green());
            } else {
                println!("{}", "Chat history left unchanged".dimmed());
            }
        }
        Command::Models => {
            let mut selector = ModelSelector::new();
            selector.load(&backend).await?;
            print!("{}", terminal::model_registry(selector.registry(), selector.current_id()));
            print!("{}", terminal::active_model(selector.active().as_ref()));
        }
        Command::SetModel { id } => {
            let mut selector = ModelSelector::new();
            let notice = selector.switch(&backend, &id).await?;
            println!("{}", notice.system_line().bright_green());
            print!("{}", terminal::active_model(selector.active().as_ref()));
        }
        Command::Test { cases, csv, samples, export, html } => {
            run_batch(&backend, &config, cases, csv, samples, export, html).await?;
        }
        Command::Template { .. } | Command::Completions { .. } => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

async fn send_and_print<B: Backend>(chat: &mut ChatController<B>, text: &str) {
    eprintln!("{}", "AI is typing...".dimmed());
    if let Some(reply) = chat.send(text).await {
        print!("{}", terminal::bubble(&bubble_view(reply)));
    }
    if chat.status() == ApiStatus::Error {
        eprintln!("{} {}", "Status:".dimmed(), terminal::status(chat.status()));
    }
}

fn print_last<B: Backend>(chat: &ChatController<B>) {
    if let Some(message) = chat.transcript().last() {
        print!("{}", terminal::bubble(&bubble_view(message)));
    }
}

async fn interactive_chat(backend: &HttpBackend) -> Result<()> {
    let mut selector = ModelSelector::new();
    if let Err(e) = selector.load(backend).await {
        warn!(error = %e, "could not load model registry");
    }

    let mut chat = ChatController::new(backend);
    match chat.load_history().await {
        Ok(_) => {
            for message in chat.transcript() {
                print!("{}", terminal::bubble(&bubble_view(message)));
            }
        }
        Err(e) => warn!(error = %e, "could not load chat history"),
    }

    println!("{}", "CHATMIND".bright_cyan().bold());
    print!("{}", terminal::active_model(selector.active().as_ref()));
    println!("{}", "Type a message. Commands: /model <id>, /clear, /quit".dimmed());
    println!("{}", "=".repeat(50).bright_blue());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bright_blue().bold());
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_chat_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Message(text) => send_and_print(&mut chat, &text).await,
            ChatInput::Model(None) => {
                print!("{}", terminal::model_registry(selector.registry(), selector.current_id()));
            }
            ChatInput::Model(Some(id)) => match selector.switch(backend, &id).await {
                Ok(notice) => {
                    chat.push_system(notice.system_line());
                    print_last(&chat);
                }
                Err(e) => eprintln!("{} {}", "✗".bright_red(), e),
            },
            ChatInput::Clear => {
                print!("{} ", "Are you sure you want to clear the chat history? [y/N]".bright_yellow());
                io::stdout().flush()?;
                let answer = lines.next_line().await?.unwrap_or_default();
                match chat.clear_history(|| is_yes(&answer)).await {
                    Ok(true) => println!("{}", "✓ Chat history cleared".bright_green()),
                    Ok(false) => println!("{}", "Chat history left unchanged".dimmed()),
                    Err(e) => eprintln!("{} {}", "✗".bright_red(), e),
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Batch testing
// ---------------------------------------------------------------------------

async fn run_batch(
    backend: &HttpBackend,
    config: &ClientConfig,
    cases: Option<PathBuf>,
    csv: Option<PathBuf>,
    samples: bool,
    export: bool,
    html_out: Option<PathBuf>,
) -> Result<()> {
    let mut controller = TestBatchController::new(backend);
    if let Some(path) = cases {
        let text = read_text_lossy(&path)?;
        let n = controller.replace_from_pipe_text(&text);
        eprintln!("{} {n} test cases from {}", "✓ Loaded".bright_green(), path.display());
    }
    if let Some(path) = csv {
        let n = controller.import_csv_file(&path)?;
        eprintln!("{} {n} test cases from CSV", "✓ Imported".bright_green());
    }
    if samples {
        controller.seed_samples();
    }
    print!("{}", terminal::case_list(&controller.case_list_view()));

    let view = controller
        .run_with_progress(|p| {
            eprintln!("{} {}", format!("[{}%]", p.percent).bright_yellow(), p.text);
        })
        .await?
        .view();
    print!("{}", terminal::batch(&view));

    if let Some(path) = html_out {
        let written = html::write_report(&view, &path, Utc::now())?;
        eprintln!("{} {}", "✓ HTML report written to".bright_green(), written.display());
    }
    if export {
        let written = controller.export(&config.export_dir, Utc::now())?;
        eprintln!("{} {}", "✓ Results exported to".bright_green(), written.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn confirm(prompt: &str) -> bool {
    eprint!("{} ", format!("{prompt} [y/N]").bright_yellow());
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}
