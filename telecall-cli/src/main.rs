use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dialoguer::{Input, Select};
use telecall_client::{
    CallConfig, CallHandle, CategoryOrder, ConnectionStatus, DEFAULT_RELAY_URL, SyntheticMedia,
    connect_call,
};
use tracing_subscriber::EnvFilter;

const IDENTITIES: [&str; 2] = ["doctor", "patient"];

#[derive(Parser, Debug)]
#[command(name = "telecall", version, about = "Join a two-party call from the terminal")]
struct Args {
    #[arg(long, env = "TELECALL_RELAY", default_value = DEFAULT_RELAY_URL)]
    relay: String,

    /// Room to join. Asked for when missing.
    #[arg(short, long)]
    room: Option<String>,

    /// `doctor` or `patient`. Asked for when missing.
    #[arg(short, long)]
    identity: Option<String>,

    /// Offer loopback candidates, for two calls on the same machine.
    #[arg(long)]
    loopback: bool,

    #[arg(long)]
    audio_only: bool,
}

fn prompt_room() -> Result<String> {
    let room = Input::<String>::new()
        .with_prompt("Room")
        .interact_text()
        .context("Failed to read room")?;
    Ok(room)
}

fn prompt_identity() -> Result<String> {
    let index = Select::new()
        .with_prompt("Join as")
        .items(&IDENTITIES)
        .default(0)
        .interact()
        .context("Failed to read identity")?;
    Ok(IDENTITIES[index].to_string())
}

fn paint(status: &ConnectionStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ConnectionStatus::Connected => text.green().bold(),
        ConnectionStatus::Failed { retrying: true, .. } => text.yellow(),
        ConnectionStatus::Failed { .. } => text.red().bold(),
        _ => text.cyan(),
    }
}

/// Prints every status change until the call ends or Ctrl-C.
async fn follow(call: &mut CallHandle) -> Result<()> {
    let mut status = call.status();
    let mut tracks = call.remote_tracks();

    println!("   {}", paint(&status.borrow_and_update()));
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = status.borrow_and_update().clone();
                println!("   {}", paint(&current));
                if current.is_terminal() {
                    return Ok(());
                }
            }
            Some(track) = async {
                match tracks.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                println!("   🎧 Remote {:?} track {}", track.kind, track.id.dimmed());
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                println!("{}", "👋 Hanging up...".cyan());
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let room = match args.room {
        Some(room) => room,
        None => tokio::task::spawn_blocking(prompt_room).await??,
    };
    let identity = match args.identity {
        Some(identity) => identity,
        None => tokio::task::spawn_blocking(prompt_identity).await??,
    };

    let config = CallConfig {
        relay_url: args.relay,
        include_loopback_candidates: args.loopback,
        ..CallConfig::default()
    };
    let media = if args.audio_only {
        SyntheticMedia::audio_only()
    } else {
        SyntheticMedia::default()
    };

    println!(
        "{}",
        format!("📞 Calling into {room} as {identity}...").green().bold()
    );
    let mut call = connect_call(
        config,
        room.as_str().into(),
        identity.as_str().into(),
        &CategoryOrder::default(),
        &media,
    )
    .await?;
    println!("   Role: {:?}", call.role());

    let outcome = follow(&mut call).await;
    call.hang_up().await;
    println!("{}", "✨ Call ended".green().bold());

    outcome
}
