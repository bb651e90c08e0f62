//! Client facade — the public contract UI code consumes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use parkpulse_core::config::realtime::RealtimeConfig;
use parkpulse_core::types::id::SubscriptionId;
use parkpulse_core::AppError;

use crate::connection::driver::{Command, ConnectionDriver};
use crate::connection::state::{ConnectionState, ConnectionStatus};
use crate::message::types::RealtimeMessage;
use crate::subscription::{MessageCallback, SubscriberRegistry};
use crate::transport::endpoint::EndpointKind;
use crate::transport::ws::WsTransport;
use crate::transport::Transport;

/// State shared between the facade and the driver task.
///
/// Accessors are synchronous and read-mostly; every lock here guards a
/// short critical section, so facade calls never block the caller for long.
pub(crate) struct Shared {
    state: RwLock<ConnectionState>,
    last_message: RwLock<Option<RealtimeMessage>>,
    last_error: RwLock<Option<AppError>>,
    connected_at: RwLock<Option<DateTime<Utc>>>,
    pub(crate) subscribers: SubscriberRegistry,
    disposed: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Idle),
            last_message: RwLock::new(None),
            last_error: RwLock::new(None),
            connected_at: RwLock::new(None),
            subscribers: SubscriberRegistry::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a state transition. After disposal only `Closed` sticks, so a
    /// late driver transition cannot resurrect a disposed client's status.
    pub(crate) fn set_state(&self, state: ConnectionState) {
        if self.is_disposed() && state != ConnectionState::Closed {
            return;
        }
        if state == ConnectionState::Open {
            let mut at = self.connected_at.write().unwrap_or_else(|e| e.into_inner());
            *at = Some(Utc::now());
        }
        let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
        *current = state;
    }

    pub(crate) fn record_error(&self, error: AppError) {
        let mut last = self.last_error.write().unwrap_or_else(|e| e.into_inner());
        *last = Some(error);
    }

    /// Deliver a forwarded message: retain it for pull consumers, then fan
    /// out to subscribers in registration order.
    pub(crate) fn publish(&self, message: RealtimeMessage) {
        if self.is_disposed() {
            return;
        }
        {
            let mut last = self.last_message.write().unwrap_or_else(|e| e.into_inner());
            *last = Some(message.clone());
        }
        self.subscribers.dispatch(&message);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("state", &self.state())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Handle to one active subscription.
///
/// Removal is explicit: dropping the handle keeps the feed alive, calling
/// [`unsubscribe`](Self::unsubscribe) guarantees no further delivery.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    shared: Arc<Shared>,
}

impl Subscription {
    /// This subscription's identifier.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the subscription. Returns whether it was still registered.
    pub fn unsubscribe(self) -> bool {
        self.shared.subscribers.remove(self.id)
    }
}

/// Resilient realtime client for the dashboard.
///
/// Construction starts the connection driver; the client then self-heals
/// across disconnects until [`dispose`](Self::dispose) is called.
#[derive(Debug)]
pub struct RealtimeClient {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    url: String,
}

impl RealtimeClient {
    /// Connect to a dashboard feed over WebSocket.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: &RealtimeConfig, ws_base_url: &str, endpoint: EndpointKind) -> Self {
        Self::with_transport(config.clone(), endpoint.url(ws_base_url), WsTransport::new())
    }

    /// Connect over a custom transport. This is the seam tests use to
    /// script connections.
    pub fn with_transport<T: Transport>(config: RealtimeConfig, url: String, transport: T) -> Self {
        let shared = Arc::new(Shared::new());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let driver = ConnectionDriver::new(
            transport,
            url.clone(),
            config,
            Arc::clone(&shared),
            command_rx,
            cancel.clone(),
        );
        tokio::spawn(driver.run());

        Self {
            shared,
            commands,
            cancel,
            url,
        }
    }

    /// The URL this client connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Collapsed status view (`connected | connecting | disconnected`).
    pub fn status(&self) -> ConnectionStatus {
        self.shared.state().status()
    }

    /// The most recently forwarded message, for late subscribers and
    /// polling consumers.
    pub fn last_message(&self) -> Option<RealtimeMessage> {
        self.shared
            .last_message
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent connection error, if any.
    pub fn last_error(&self) -> Option<AppError> {
        self.shared
            .last_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Register a callback for every forwarded inbound message.
    ///
    /// Delivery is in registration order; liveness replies never reach
    /// subscribers.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&RealtimeMessage) + Send + Sync + 'static,
    {
        let callback: MessageCallback = Box::new(callback);
        let id = self.shared.subscribers.add(callback);
        Subscription {
            id,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Send a domain command over the channel.
    ///
    /// Returns `false` immediately — without blocking or throwing — when
    /// the channel is not open. A send against an outright-closed channel
    /// additionally nudges a reconnect attempt (but not while a retry is
    /// already pending, to avoid racing the in-flight timer).
    pub fn send<P: Serialize>(&self, payload: &P) -> bool {
        if self.shared.is_disposed() {
            return false;
        }

        let state = self.shared.state();
        if !state.is_open() {
            if state == ConnectionState::Closed {
                let _ = self.commands.send(Command::Reconnect);
            }
            return false;
        }

        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound payload");
                return false;
            }
        };
        self.commands.send(Command::Send(raw)).is_ok()
    }

    /// Manual reconnect: valid from any state. Cancels any pending backoff
    /// timer, resets the retry counter, and moves straight to connecting.
    pub fn reconnect(&self) {
        if self.shared.is_disposed() {
            return;
        }
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Idempotent teardown.
    ///
    /// Cancels all timers, closes the channel with normal-closure
    /// semantics, unregisters every subscriber, and moves to `Closed`.
    /// Once this returns, no subscriber callback fires again.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        self.shared.subscribers.clear();
        self.shared.set_state(ConnectionState::Closed);
    }

    /// Whether the client has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Point-in-time snapshot of the client, for status panes and logs.
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            url: self.url.clone(),
            state: self.state(),
            status: self.status(),
            connected_at: *self
                .shared
                .connected_at
                .read()
                .unwrap_or_else(|e| e.into_inner()),
            subscribers: self.shared.subscribers.len(),
            last_error: self.last_error().map(|e| e.to_string()),
        }
    }
}

/// Serializable snapshot of a client's current condition.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    /// Connection URL.
    pub url: String,
    /// Full lifecycle state.
    pub state: ConnectionState,
    /// Collapsed status.
    pub status: ConnectionStatus,
    /// When the channel last opened.
    pub connected_at: Option<DateTime<Utc>>,
    /// Registered subscriber count.
    pub subscribers: usize,
    /// Most recent error, stringified.
    pub last_error: Option<String>,
}
