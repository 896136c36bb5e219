// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session-scoped context.
//!
//! A session is created on login and torn down on logout. All of its state
//! (hub channel, message store, synchronizer, typing trackers) lives on one
//! task; callers hold a [`SessionHandle`] and issue intents as commands.
//! Push events, API completions, timers and commands interleave on that
//! task and never run concurrently, so the store only changes through its
//! own operations.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use courier_core::{ClientMessage, ConversationSummary, Message, ServerMessage, User, UserId};

use crate::api::{ApiError, HttpApi, MessagingApi};
use crate::channel::{ChannelEvent, ConnectionState, HubChannel, ReconnectPolicy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sender::{SendCoordinator, SendOutcome};
use crate::store::{MessageStore, StoreEvent};
use crate::synchronizer::{Completion, ConversationSynchronizer};
use crate::transport::{Transport, WebSocketTransport};
use crate::typing::{TypingDebouncer, TypingTracker};

/// What the auth provider hands to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Credentials {
            token: token.into(),
            user_id: user_id.into(),
        }
    }
}

/// Non-fatal conditions surfaced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A background fetch failed; the previous state is still shown.
    FetchFailed(ApiError),
    /// The hub connection came back and the session is catching up.
    Reconnected,
    /// The hub rejected the credential while reconnecting.
    ReconnectBlocked,
}

/// Read-only snapshot of the session for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub connection: ConnectionState,
    pub active: Option<UserId>,
    pub messages: Vec<Message>,
    pub conversations: Vec<ConversationSummary>,
    /// Unread messages from the active peer.
    pub unread: usize,
    pub typing: Vec<UserId>,
}

impl SessionView {
    fn empty() -> Self {
        SessionView {
            connection: ConnectionState::Disconnected,
            active: None,
            messages: Vec::new(),
            conversations: Vec::new(),
            unread: 0,
            typing: Vec::new(),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Open { peer: UserId, reply: Reply<()> },
    Close { reply: Reply<()> },
    Send {
        recipient: UserId,
        content: String,
        reply: Reply<Message>,
    },
    Refresh { reply: Reply<Vec<ConversationSummary>> },
    MarkRead { peer: UserId, reply: Reply<()> },
    Typing { peer: UserId, reply: Reply<()> },
    Logout { reply: oneshot::Sender<()> },
}

/// Entry point for creating sessions.
pub struct Session;

impl Session {
    /// Log in against the configured hub and API.
    pub async fn login(config: &Config, credentials: Credentials) -> Result<SessionHandle> {
        let api: Arc<dyn MessagingApi> =
            Arc::new(HttpApi::new(config.api_url.clone(), credentials.token.clone()));
        Session::login_with(config, credentials, WebSocketTransport::new(), api).await
    }

    /// Log in with a custom transport and API (for testing).
    pub async fn login_with<T>(
        config: &Config,
        credentials: Credentials,
        transport: T,
        api: Arc<dyn MessagingApi>,
    ) -> Result<SessionHandle>
    where
        T: Transport + 'static,
    {
        config.validate()?;
        if credentials.user_id.is_empty() {
            return Err(Error::Authentication("no user identity supplied".to_string()));
        }

        let mut channel = HubChannel::with_transport(
            config.hub_url.clone(),
            ReconnectPolicy::new(config.reconnect_delays()),
            transport,
        );
        channel.connect(Some(&credentials.token)).await?;
        info!(user = %credentials.user_id, "session started");

        let channel_state = channel.subscribe();
        let store = MessageStore::new(credentials.user_id.clone());
        let (commands_tx, commands) = mpsc::channel(config.command_buffer);
        let (view_tx, view) = watch::channel(SessionView::empty());
        let (notices, _) = broadcast::channel(64);

        let handle = SessionHandle {
            me: credentials.user_id.clone(),
            commands: commands_tx,
            api: Arc::clone(&api),
            view,
            connection: channel.subscribe(),
            transitions: channel.transition_sender(),
            notices: notices.clone(),
            store_events: store.event_sender(),
        };

        let mut task = SessionTask {
            channel,
            store,
            sync: ConversationSynchronizer::new(Arc::clone(&api), config.page_size),
            sender: SendCoordinator::new(api),
            typing: TypingTracker::new(config.typing_timeout()),
            debouncer: TypingDebouncer::new(config.typing_quiet()),
            connection: channel_state,
            commands,
            view: view_tx,
            notices,
        };
        task.sync.refresh(None);
        task.publish_view();
        tokio::spawn(task.run());

        Ok(handle)
    }
}

/// Handle to a running session. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    me: UserId,
    commands: mpsc::Sender<Command>,
    api: Arc<dyn MessagingApi>,
    view: watch::Receiver<SessionView>,
    connection: watch::Receiver<ConnectionState>,
    transitions: broadcast::Sender<ConnectionState>,
    notices: broadcast::Sender<Notice>,
    store_events: broadcast::Sender<StoreEvent>,
}

impl SessionHandle {
    /// The local user.
    pub fn me(&self) -> &UserId {
        &self.me
    }

    /// Watch the session view. Updated after every change the session task
    /// applies.
    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Watch the latest hub connection state. Changes that follow each
    /// other quickly may be observed only as the last one.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    /// Receive every hub connection transition, in order.
    pub fn transitions(&self) -> broadcast::Receiver<ConnectionState> {
        self.transitions.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Store change notifications, including rejected malformed entries.
    pub fn store_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.store_events.subscribe()
    }

    async fn request<R>(&self, make: impl FnOnce(oneshot::Sender<R>) -> Command) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Open `peer`'s conversation and wait for its snapshot.
    ///
    /// Returns `Ok` without applying anything if another conversation was
    /// opened before the snapshot arrived.
    pub async fn open_conversation(&self, peer: impl Into<UserId>) -> Result<()> {
        let peer = peer.into();
        if peer.is_empty() {
            return Err(Error::Validation("peer id is empty".to_string()));
        }
        self.request(|reply| Command::Open { peer, reply }).await?
    }

    pub async fn close_conversation(&self) -> Result<()> {
        self.request(|reply| Command::Close { reply }).await?
    }

    /// Send a message. On `Error::Send` the content is handed back.
    pub async fn send(&self, recipient: impl Into<UserId>, content: impl Into<String>) -> Result<Message> {
        let recipient = recipient.into();
        let content = content.into();
        self.request(|reply| Command::Send {
            recipient,
            content,
            reply,
        })
        .await?
    }

    /// Re-fetch the conversation summaries.
    pub async fn refresh_conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.request(|reply| Command::Refresh { reply }).await?
    }

    /// Mark `peer`'s messages as read.
    pub async fn mark_read(&self, peer: impl Into<UserId>) -> Result<()> {
        let peer = peer.into();
        self.request(|reply| Command::MarkRead { peer, reply }).await?
    }

    /// Register a keystroke in the composer for `peer`.
    ///
    /// Fails with `ChannelUnavailable` when a typing signal is due but the
    /// hub is not connected.
    pub async fn typing(&self, peer: impl Into<UserId>) -> Result<()> {
        let peer = peer.into();
        self.request(|reply| Command::Typing { peer, reply }).await?
    }

    /// Search users by name. Does not touch session state.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("search query is empty".to_string()));
        }
        self.api.search_users(query).await.map_err(Error::Fetch)
    }

    /// Disconnect, drop all session state and wait for the session task to
    /// finish. Logging out twice is a no-op.
    pub async fn logout(&self) {
        if let Err(e) = self.request(|reply| Command::Logout { reply }).await {
            debug!(error = %e, "session already closed");
        }
    }
}

struct SessionTask<T: Transport> {
    channel: HubChannel<T>,
    store: MessageStore,
    sync: ConversationSynchronizer,
    sender: SendCoordinator,
    typing: TypingTracker,
    debouncer: TypingDebouncer,
    connection: watch::Receiver<ConnectionState>,
    commands: mpsc::Receiver<Command>,
    view: watch::Sender<SessionView>,
    notices: broadcast::Sender<Notice>,
}

impl<T: Transport + 'static> SessionTask<T> {
    async fn run(mut self) {
        loop {
            let live = self.channel.is_live();
            let next_timer = [self.typing.next_deadline(), self.debouncer.next_deadline()]
                .into_iter()
                .flatten()
                .min();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Logout { reply }) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        return;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.teardown().await;
                        return;
                    }
                },
                Some(event) = self.channel.next_event(), if live => {
                    self.on_channel_event(event).await;
                }
                // Reconnect progress happens inside next_event; republish it
                Ok(()) = self.connection.changed() => {}
                Some(completion) = self.sync.next_completion(), if self.sync.has_pending() => {
                    self.on_completion(completion);
                }
                Some(outcome) = self.sender.next_outcome(), if self.sender.has_pending() => {
                    self.on_send_outcome(outcome);
                }
                _ = time::sleep_until(next_timer.unwrap_or_else(Instant::now)), if next_timer.is_some() => {
                    self.on_timers(Instant::now()).await;
                }
            }

            self.publish_view();
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Open { peer, reply } => {
                if self.store.active() != Some(&peer) {
                    if let Some(stop) = self.debouncer.stop() {
                        self.send_quietly(stop).await;
                    }
                }
                self.sync.open(&mut self.store, peer, Some(reply));
            }
            Command::Close { reply } => {
                if let Some(stop) = self.debouncer.stop() {
                    self.send_quietly(stop).await;
                }
                self.sync.close(&mut self.store);
                let _ = reply.send(Ok(()));
            }
            Command::Send {
                recipient,
                content,
                reply,
            } => {
                if SendCoordinator::validate(&recipient, &content).is_ok() {
                    if let Some(stop) = self.debouncer.sent(&recipient) {
                        self.send_quietly(stop).await;
                    }
                }
                self.sender.send(recipient, content, Some(reply));
            }
            Command::Refresh { reply } => self.sync.refresh(Some(reply)),
            Command::MarkRead { peer, reply } => self.sync.mark_read(peer, Some(reply)),
            Command::Typing { peer, reply } => {
                let _ = reply.send(self.on_keystroke(peer).await);
            }
            Command::Logout { .. } => {}
        }
    }

    async fn on_keystroke(&mut self, peer: UserId) -> Result<()> {
        for invocation in self.debouncer.keystroke(peer, Instant::now()) {
            if let Err(e) = self.channel.send(invocation).await {
                // Forget the target so the next keystroke tries again
                let _ = self.debouncer.stop();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Typing signals are best effort.
    async fn send_quietly(&mut self, invocation: ClientMessage) {
        if let Err(e) = self.channel.send(invocation).await {
            debug!(error = %e, "dropping typing signal");
        }
    }

    async fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Hub(msg) => self.on_hub_message(msg),
            ChannelEvent::Reconnected => {
                self.notify(Notice::Reconnected);
                self.sync.resync(&self.store);
            }
            ChannelEvent::ReconnectBlocked => {
                warn!("hub rejected the session credential");
                self.typing.clear();
                let _ = self.debouncer.stop();
                self.notify(Notice::ReconnectBlocked);
            }
        }
    }

    fn on_hub_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::MessageReceived(wire) | ServerMessage::MessageSendConfirmed(wire) => {
                self.store.append(wire);
                self.sync.refresh(None);
            }
            ServerMessage::MessagesMarkedRead { reader_id } => {
                let changed = self.store.mark_read_by(&reader_id, Utc::now());
                debug!(reader = %reader_id, changed, "peer read our messages");
            }
            ServerMessage::TypingStarted { peer_id } => {
                self.typing.started(peer_id, Instant::now());
            }
            ServerMessage::TypingStopped { peer_id } => {
                self.typing.stopped(&peer_id);
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        for notice in self.sync.apply(&mut self.store, completion) {
            self.notify(notice);
        }
    }

    fn on_send_outcome(&mut self, outcome: SendOutcome) {
        if self.sender.apply(&mut self.store, outcome) {
            self.sync.refresh(None);
        }
    }

    async fn on_timers(&mut self, now: Instant) {
        self.typing.expire(now);
        if let Some(stop) = self.debouncer.expire(now) {
            self.send_quietly(stop).await;
        }
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }

    fn publish_view(&self) {
        let next = SessionView {
            connection: self.channel.state(),
            active: self.store.active().cloned(),
            messages: self.store.messages().to_vec(),
            conversations: self.store.conversations().to_vec(),
            unread: self
                .store
                .active()
                .map_or(0, |peer| self.store.unread_from(peer)),
            typing: self.typing.typing(),
        };
        self.view.send_if_modified(|view| {
            if *view == next {
                return false;
            }
            *view = next;
            true
        });
    }

    async fn teardown(&mut self) {
        if let Some(stop) = self.debouncer.stop() {
            self.send_quietly(stop).await;
        }
        self.sync.abort();
        self.sender.abort();
        self.channel.disconnect().await;
        self.store.clear();
        self.typing.clear();
        self.publish_view();
        info!(user = %self.store.me(), "session ended");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
