// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! courier: terminal tail for a messaging session.
//!
//! Logs in, opens one conversation and prints messages, typing indicators
//! and connection changes until Ctrl-C.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use courier::{Config, Credentials, Notice, Session, SessionHandle, SessionView};
use courier_core::{Message, MessageId, UserId};

/// courier: follow a conversation from the terminal
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Follow a messaging conversation from the terminal")]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer credential for the hub and API
    #[arg(long, env = "COURIER_TOKEN", hide_env_values = true)]
    token: String,

    /// Id of the logged-in user
    #[arg(short, long)]
    user: UserId,

    /// Peer whose conversation to follow
    #[arg(short, long)]
    peer: UserId,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> courier::Result<Config> {
    match path.or_else(Config::default_path) {
        Some(path) => Config::load_or_default(&path),
        None => Ok(Config::default()),
    }
}

async fn run(args: Args) -> courier::Result<()> {
    let config = load_config(args.config)?;
    let session = Session::login(&config, Credentials::new(args.token, args.user)).await?;
    info!(peer = %args.peer, "following conversation");

    if let Err(e) = session.open_conversation(args.peer.clone()).await {
        warn!(error = %e, "initial fetch failed, showing live updates only");
    }

    tokio::select! {
        _ = tail(&session) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
        }
    }

    session.logout().await;
    Ok(())
}

async fn tail(session: &SessionHandle) {
    let mut view = session.view();
    let mut notices = session.notices();
    let mut last = view.borrow_and_update().clone();
    let mut printed = HashSet::new();
    print_new(&last, &mut printed);

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    return;
                }
                let next = view.borrow_and_update().clone();
                if next.connection != last.connection {
                    println!("-- {}", next.connection);
                }
                if next.typing != last.typing && !next.typing.is_empty() {
                    let names: Vec<&str> = next.typing.iter().map(|p| p.as_str()).collect();
                    println!("-- {} typing...", names.join(", "));
                }
                print_new(&next, &mut printed);
                last = next;
            }
            notice = notices.recv() => match notice {
                Ok(Notice::FetchFailed(e)) => println!("-- fetch failed: {}", e),
                Ok(Notice::Reconnected) => println!("-- reconnected"),
                Ok(Notice::ReconnectBlocked) => {
                    println!("-- credential rejected, log in again");
                    return;
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            },
        }
    }
}

/// Messages not shown yet, wherever they landed in the list.
fn unseen<'a>(messages: &'a [Message], printed: &mut HashSet<MessageId>) -> Vec<&'a Message> {
    messages.iter().filter(|m| printed.insert(m.id)).collect()
}

fn print_new(view: &SessionView, printed: &mut HashSet<MessageId>) {
    for msg in unseen(&view.messages, printed) {
        println!(
            "[{}] {}: {}",
            msg.sent_at.format("%H:%M:%S"),
            msg.sender_id,
            msg.content
        );
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
