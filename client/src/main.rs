use std::io::Write;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use shoepao_chat_client::commands::{Command, HELP};
use shoepao_chat_client::models::{Message, MessageRole};
use shoepao_chat_client::view::{preview, updated_label};
use shoepao_chat_client::{ChatState, ChatStore, DEFAULT_API_BASE, HttpGateway};

type Input = Lines<BufReader<Stdin>>;

fn print_conversations(state: &ChatState) {
    let visible = state.visible_conversations();
    if visible.is_empty() {
        if state.search_query.trim().is_empty() {
            println!("No conversations yet. Type /new to start one.");
        } else {
            println!("No conversations match '{}'.", state.search_query.trim());
        }
        return;
    }
    let now = Local::now();
    let current_id = state.current.as_ref().map(|c| c.id);
    for conv in visible {
        let marker = if Some(conv.id) == current_id { '*' } else { ' ' };
        println!(
            "{marker} #{:<5} {:>9}  {}",
            conv.id,
            updated_label(conv.updated_at, now),
            preview(conv)
        );
    }
}

fn print_messages(messages: &[Message]) {
    for msg in messages {
        println!("[{}] {}", msg.role, msg.content);
    }
}

fn prompt(state: &ChatState) {
    match &state.current {
        Some(c) if c.is_draft => print!("(new) > "),
        Some(c) => print!("(#{}) > ", c.id),
        None => print!("> "),
    }
    let _ = std::io::stdout().flush();
}

/// Shows the last error, if any, and dismisses it.
fn report_error(store: &ChatStore<HttpGateway>) {
    if let Some(err) = store.snapshot().error {
        eprintln!("! {err}");
        store.clear_error();
    }
}

async fn confirm(input: &mut Input, question: &str) -> anyhow::Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Runs one command. Returns `false` when the session should end.
async fn run_command(
    store: &ChatStore<HttpGateway>,
    input: &mut Input,
    command: Command,
) -> anyhow::Result<bool> {
    match command {
        Command::List => {
            store.load_conversations().await;
            print_conversations(&store.snapshot());
        }
        Command::New => {
            store.create_draft();
            println!("New conversation. Say something!");
        }
        Command::Open(id) => {
            store.select_conversation(id).await;
            let state = store.snapshot();
            if state.error.is_none() {
                print_messages(state.messages());
            }
        }
        Command::Delete(id) => {
            if confirm(input, &format!("Delete conversation #{id}?")).await? {
                store.delete_conversation(id).await;
                print_conversations(&store.snapshot());
            }
        }
        Command::Search(query) => {
            store.set_search_query(query);
            print_conversations(&store.snapshot());
        }
        Command::Dismiss => store.clear_error(),
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
        Command::Send(text) => {
            let before = store.snapshot().messages().len();
            println!("…");
            store.send_message(&text).await;
            let state = store.snapshot();
            if let Some(new) = state.messages().get(before..) {
                // The user's own line is already on screen.
                for msg in new.iter().filter(|m| m.role != MessageRole::User) {
                    println!("[{}] {}", msg.role, msg.content);
                }
            }
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoepao_chat_client=info".into()),
        )
        .init();

    let base_url =
        std::env::var("CHAT_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let store = ChatStore::new(HttpGateway::new(base_url));
    info!("Using chat API at {}", store.gateway().base_url());

    println!("Shoepao chat. Type /help for commands.");
    store.load_conversations().await;
    print_conversations(&store.snapshot());
    report_error(&store);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&store.snapshot());
        let line = tokio::select! {
            line = input.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => {
                if !run_command(&store, &mut input, command).await? {
                    break;
                }
            }
            Err(e) => eprintln!("{e}"),
        }
        report_error(&store);
    }

    println!("Bye!");
    Ok(())
}
