use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crier_core::content::{BroadcastContent, Button, ContentInput};
use crier_core::delivery::MessageSender;
use crier_core::draft::DraftState;
use crier_core::errors::SendError;
use crier_core::events::{EngineReply, OperatorEvent};
use crier_core::ids::{OperatorId, RecipientId};
use crier_engine::{ConversationEngine, DeliveryDispatcher};
use crier_store::{Database, DraftStore, RecipientRepo};

/// Operator console for assembling and dispatching broadcasts against
/// a local recipient roster.
#[derive(Parser)]
#[command(name = "crier")]
struct Args {
    /// Path to the recipient roster database.
    #[arg(long, default_value = "crier.db")]
    database: PathBuf,

    /// Operator identity allowed to drive broadcasts.
    #[arg(long, default_value = "admin")]
    admin: String,

    /// Pacing between consecutive sends, in milliseconds.
    #[arg(long, default_value_t = 50)]
    pacing_ms: u64,
}

/// Dry-run transport: logs each delivery instead of handing it to a
/// real chat backend.
struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send(
        &self,
        recipient: &RecipientId,
        content: &BroadcastContent,
        button: Option<&Button>,
    ) -> Result<(), SendError> {
        info!(
            recipient = %recipient,
            kind = content.kind(),
            button = button.map(|b| b.label.as_str()).unwrap_or("-"),
            "delivered (dry run)"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let db = Database::open(&args.database).expect("Failed to open database");
    let repo = Arc::new(RecipientRepo::new(db));

    let dispatcher = DeliveryDispatcher::new(repo.clone(), Arc::new(ConsoleSender))
        .with_pacing(Duration::from_millis(args.pacing_ms));
    let admin = OperatorId::from_raw(args.admin);
    let engine = ConversationEngine::new(admin.clone(), DraftStore::new(), dispatcher);

    println!("crier console: /register <id>, /broadcast, /preview, /confirm, /cancel, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_owned();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        if let Some(id) = line.strip_prefix("/register ") {
            match repo.register(&RecipientId::from_raw(id.trim())) {
                Ok(true) => println!("registered {id}"),
                Ok(false) => println!("{id} already registered"),
                Err(e) => eprintln!("register failed: {e}"),
            }
            continue;
        }

        let Some(event) = to_event(&line, engine.state(&admin)) else {
            println!("nothing to do with that here; try /broadcast");
            continue;
        };

        match engine.handle(&admin, event).await {
            Ok(reply) => print_reply(reply),
            Err(e) => eprintln!("broadcast failed: {e}"),
        }
    }
}

/// Map a console line to an operator event, routing plain lines by the
/// current dialog state the way a chat frontend would.
fn to_event(line: &str, state: Option<DraftState>) -> Option<OperatorEvent> {
    match line {
        "/broadcast" => return Some(OperatorEvent::StartBroadcast),
        "/preview" => return Some(OperatorEvent::Preview),
        "/confirm" => return Some(OperatorEvent::Confirm),
        "/cancel" => return Some(OperatorEvent::Cancel),
        _ => {}
    }

    match state? {
        DraftState::AwaitingContent => Some(OperatorEvent::SubmitContent {
            input: parse_content(line),
        }),
        DraftState::AwaitingButtonLabel => Some(OperatorEvent::SubmitButtonLabel {
            text: line.to_owned(),
        }),
        DraftState::AwaitingButtonLink { .. } => Some(OperatorEvent::SubmitButtonLink {
            text: line.to_owned(),
        }),
        DraftState::AwaitingConfirmation => None,
    }
}

/// Content lines: `photo <ref> | <caption>`, `video <ref> | <caption>`,
/// anything else is plain text.
fn parse_content(line: &str) -> ContentInput {
    for (prefix, is_photo) in [("photo ", true), ("video ", false)] {
        if let Some(rest) = line.strip_prefix(prefix) {
            let (file_ref, caption) = match rest.split_once('|') {
                Some((r, c)) => (r.trim().to_owned(), Some(c.trim().to_owned())),
                None => (rest.trim().to_owned(), None),
            };
            return if is_photo {
                ContentInput::photo(file_ref, caption)
            } else {
                ContentInput::video(file_ref, caption)
            };
        }
    }
    ContentInput::text(line)
}

fn print_reply(reply: EngineReply) {
    match reply {
        EngineReply::Silent => {}
        EngineReply::Prompt { text }
        | EngineReply::Retry { text }
        | EngineReply::Cancelled { text } => println!("{text}"),
        EngineReply::Preview { rendering } => println!("{rendering}"),
        EngineReply::Completed { result } => println!("{result}"),
    }
}
