//! CLI chat client for the marketplace messaging core.
//!
//! Connects one authenticated session over WebSocket, shows presence,
//! typing and incoming messages, and posts messages over the REST API.
//!
//! Commands:
//! ```not_rust
//! /list                      list conversations
//! /new <company> <freelancer> create a conversation
//! /open <conversation_id>    open a conversation (joins its room)
//! /close                     close the open conversation
//! /history                   show the open conversation's history
//! /read                      mark the open conversation as read
//! /quit                      exit
//! ```
//! Plain lines are posted as messages to the open conversation.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin renraku-client -- --user-id yuki --token dev-token
//! ```

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use renraku_client::{
    ApiClient, ChatSession, ConnectionState, ReconnectPolicy, RoomGuard, SessionConfig,
    formatter::MessageFormatter, ui::redisplay_prompt,
};
use renraku_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "renraku-client")]
#[command(about = "CLI chat client with presence and unread tracking", long_about = None)]
struct Args {
    /// User ID to connect as
    #[arg(short = 'c', long)]
    user_id: String,

    /// Opaque session token
    #[arg(short = 't', long)]
    token: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// REST API base URL
    #[arg(short = 'a', long, default_value = "http://127.0.0.1:8080")]
    api_url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let session = match ChatSession::connect(SessionConfig {
        ws_url: args.url,
        user_id: args.user_id.clone(),
        token: args.token,
        policy: ReconnectPolicy::default(),
    })
    .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let api = ApiClient::new(args.api_url);

    println!(
        "\nYou are '{}'. /open a conversation, then type messages. Ctrl+C to exit.\n",
        args.user_id
    );

    if let Err(e) = run_repl(session, api).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

/// Read commands from stdin and print session events until the user quits.
async fn run_repl(session: ChatSession, api: ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = session.user_id().to_string();

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_user = user_id.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        rl.add_history_entry(&line).ok();
                        if input_tx.send(line).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut presence_rx = session.subscribe_presence();
    let mut message_rx = session.subscribe_messages();
    let mut summary_rx = session.subscribe_summaries();
    let mut typing_rx = session.subscribe_typing();
    let mut state_rx = session.watch_state();

    // The conversation the user currently has open, if any
    let mut open_room: Option<RoomGuard> = None;

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                if !handle_line(&line, &session, &api, &user_id, &mut open_room).await {
                    break;
                }
            }
            event = presence_rx.recv() => {
                if let Ok(event) = event {
                    print!("{}", MessageFormatter::format_presence(&event));
                    redisplay_prompt(&user_id);
                }
            }
            message = message_rx.recv() => {
                if let Ok(message) = message {
                    print!("{}", MessageFormatter::format_message(&message));
                    redisplay_prompt(&user_id);
                }
            }
            summary = summary_rx.recv() => {
                if let Ok(summary) = summary {
                    print!("{}", MessageFormatter::format_summary(&summary, &user_id));
                    redisplay_prompt(&user_id);
                }
            }
            typing = typing_rx.recv() => {
                if let Ok(event) = typing {
                    print!("{}", MessageFormatter::format_typing(
                        &event.conversation_id, &event.user_id, event.typing,
                    ));
                    redisplay_prompt(&user_id);
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                match *state_rx.borrow() {
                    ConnectionState::Connected => println!("\n(connected)"),
                    ConnectionState::Reconnecting { attempt } => {
                        println!("\n(reconnecting, attempt {})", attempt);
                    }
                    ConnectionState::GivenUp => {
                        println!("\n(connection given up)");
                        break;
                    }
                }
                redisplay_prompt(&user_id);
            }
        }
    }

    Ok(())
}

/// Execute one input line. Returns `false` when the REPL should exit.
async fn handle_line(
    line: &str,
    session: &ChatSession,
    api: &ApiClient,
    user_id: &str,
    open_room: &mut Option<RoomGuard>,
) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("/quit") => return false,
        Some("/list") => match api.list_conversations(user_id).await {
            Ok(summaries) => {
                for summary in &summaries {
                    print!("{}", MessageFormatter::format_summary(summary, user_id));
                }
                if summaries.is_empty() {
                    println!("(no conversations)");
                }
            }
            Err(e) => tracing::error!("Failed to list conversations: {}", e),
        },
        Some("/new") => {
            let (Some(company), Some(freelancer)) = (parts.next(), parts.next()) else {
                println!("usage: /new <company> <freelancer>");
                return true;
            };
            match api.create_conversation(company, freelancer).await {
                Ok(summary) => print!("{}", MessageFormatter::format_summary(&summary, user_id)),
                Err(e) => tracing::error!("Failed to create conversation: {}", e),
            }
        }
        Some("/open") => {
            let Some(conversation_id) = parts.next() else {
                println!("usage: /open <conversation_id>");
                return true;
            };
            // Dropping the previous guard leaves its room
            *open_room = Some(session.open_conversation(conversation_id));
            println!("(opened {})", conversation_id);
        }
        Some("/close") => {
            if open_room.take().is_some() {
                println!("(closed)");
            } else {
                println!("(nothing open)");
            }
        }
        Some("/history") => {
            let Some(room) = open_room.as_ref() else {
                println!("(open a conversation first)");
                return true;
            };
            match api.message_history(room.conversation_id(), user_id).await {
                Ok(messages) => {
                    for message in &messages {
                        print!("{}", MessageFormatter::format_message(message));
                    }
                    if messages.is_empty() {
                        println!("(no messages)");
                    }
                }
                Err(e) => tracing::error!("Failed to fetch history: {}", e),
            }
        }
        Some("/read") => {
            let Some(room) = open_room.as_ref() else {
                println!("(open a conversation first)");
                return true;
            };
            match api.mark_read(room.conversation_id(), user_id).await {
                Ok(summary) => print!("{}", MessageFormatter::format_summary(&summary, user_id)),
                Err(e) => tracing::error!("Failed to mark read: {}", e),
            }
        }
        Some(command) if command.starts_with('/') => {
            println!("unknown command: {}", command);
        }
        _ => {
            // Plain line: post as a message to the open conversation
            let Some(room) = open_room.as_ref() else {
                println!("(open a conversation first)");
                return true;
            };
            match api
                .post_message(room.conversation_id(), user_id, line, None)
                .await
            {
                Ok(message) => {
                    // The WebSocket echo of our own post must not redisplay it
                    session.note_local_message(message.id);
                    print!("{}", MessageFormatter::format_sent_confirmation(message.sent_at));
                }
                Err(e) => tracing::error!("Failed to post message: {}", e),
            }
        }
    }
    true
}
