//! Aryu channel client binary.
//!
//! # Usage
//!
//! ```bash
//! # Follow a chat room, reading commands from stdin
//! aryu --session session.json --kind chat --resource 12
//!
//! # Run a quiz room against a deployment
//! aryu --origin https://portal.aryu.in --session admin.json --kind quiz --resource 4
//! ```

use std::{path::PathBuf, time::Duration};

use aryu_app::{Draft, DraftAttachment, Intent, Runtime};
use aryu_cli::{
    command::{self, Command},
    surface::LogSurface,
};
use aryu_client::{HttpBackend, WsTransport};
use aryu_core::{ChannelConfig, SessionContext};
use aryu_proto::{Resource, ResourceId, ResourceKind};
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Aryu realtime channel client
#[derive(Parser, Debug)]
#[command(name = "aryu")]
#[command(about = "Follow an Aryu chat room, notification feed, or quiz room")]
#[command(version)]
struct Args {
    /// Page origin the socket address is derived from
    #[arg(long, default_value = "http://localhost:8000")]
    origin: String,

    /// REST API base URL (defaults to `<origin>/api`)
    #[arg(long)]
    api_base: Option<String>,

    /// Path to the persisted session JSON (`{ token, loginType, user }`)
    #[arg(short, long)]
    session: PathBuf,

    /// Resource kind (chat, notifications, quiz)
    #[arg(short, long, default_value = "chat")]
    kind: ResourceKind,

    /// Resource id
    #[arg(short, long)]
    resource: String,

    /// Seconds between background refetches
    #[arg(long, default_value = "30")]
    poll_secs: u64,

    /// Seconds to wait for the socket to connect
    #[arg(long, default_value = "10")]
    connect_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let session = SessionContext::load(&args.session)?;
    let resource = Resource::new(args.kind, ResourceId::new(args.resource)?);

    let mut config = ChannelConfig::for_origin(args.origin);
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }
    config.poll_interval = Duration::from_secs(args.poll_secs);
    config.connect_timeout = Duration::from_secs(args.connect_secs);
    config.validate()?;

    tracing::info!(%resource, user_id = session.user_id(), "Aryu client starting");

    let transport = WsTransport::new(&config);
    let backend = HttpBackend::new(&config, &session)?;
    let runtime = Runtime::new(transport, backend, LogSurface::new(), config, session);

    let (intents, rx) = mpsc::channel(64);
    intents.send(Intent::Open(resource)).await?;
    tokio::spawn(read_commands(intents));

    runtime.run(rx).await?;
    Ok(())
}

/// Forward stdin commands to the runtime until EOF or `quit`.
async fn read_commands(intents: mpsc::Sender<Intent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            },
        };

        let intent = match command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Intent(intent))) => intent,
            Ok(Some(Command::Upload { path, body })) => match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let name = path
                        .file_name()
                        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                    let attachment =
                        DraftAttachment { kind: command::attachment_kind(&path), name, bytes };
                    Intent::Send(Draft::text(body).with_attachment(attachment))
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read attachment");
                    continue;
                },
            },
            Err(e) => {
                tracing::warn!("{e}");
                continue;
            },
        };

        let quit = intent == Intent::Quit;
        if intents.send(intent).await.is_err() || quit {
            return;
        }
    }

    let _ = intents.send(Intent::Quit).await;
}
