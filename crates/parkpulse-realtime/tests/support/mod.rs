//! Shared test helpers: a scripted transport standing in for the WebSocket.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use parkpulse_core::{AppError, AppResult};
use parkpulse_realtime::transport::{FrameSink, FrameStream, Transport, TransportEvent};

/// One scripted connect outcome.
enum Outcome {
    Fail(String),
    Succeed(FakeConnection),
}

struct FakeConnection {
    events: mpsc::UnboundedReceiver<AppResult<TransportEvent>>,
    sent: mpsc::UnboundedSender<String>,
}

/// Test-side handle to one scripted connection: inject inbound events,
/// observe outbound frames.
pub struct ConnHandle {
    events: mpsc::UnboundedSender<AppResult<TransportEvent>>,
    sent: mpsc::UnboundedReceiver<String>,
}

impl ConnHandle {
    /// Inject an inbound text frame.
    pub fn push_frame(&self, raw: &str) {
        let _ = self.events.send(Ok(TransportEvent::Frame(raw.to_string())));
    }

    /// Inject a close event from the peer.
    pub fn push_close(&self, code: u16, reason: &str) {
        let _ = self.events.send(Ok(TransportEvent::Closed {
            code,
            reason: reason.to_string(),
        }));
    }

    /// Inject a transport error.
    pub fn push_error(&self, message: &str) {
        let _ = self.events.send(Err(AppError::transport(message)));
    }

    /// Await the next frame the client sent.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Drain whatever the client has sent so far.
    pub fn drain_sent(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.sent.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

/// Scripted [`Transport`]: each connect attempt pops the next outcome.
/// With an empty script, a connect attempt hangs until the driver's
/// connect timeout fires.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

struct Inner {
    script: Mutex<VecDeque<Outcome>>,
    attempt_times: Mutex<Vec<tokio::time::Instant>>,
    attempts_tx: watch::Sender<usize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let (attempts_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(VecDeque::new()),
                attempt_times: Mutex::new(Vec::new()),
                attempts_tx,
            }),
        }
    }

    /// Script a failed connect attempt.
    pub fn push_failure(&self, message: &str) {
        self.inner
            .script
            .lock()
            .unwrap()
            .push_back(Outcome::Fail(message.to_string()));
    }

    /// Script a successful connect attempt; returns the test-side handle.
    pub fn push_connection(&self) -> ConnHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        self.inner
            .script
            .lock()
            .unwrap()
            .push_back(Outcome::Succeed(FakeConnection {
                events: event_rx,
                sent: sent_tx,
            }));
        ConnHandle {
            events: event_tx,
            sent: sent_rx,
        }
    }

    /// Number of connect attempts made so far.
    pub fn attempts(&self) -> usize {
        *self.inner.attempts_tx.borrow()
    }

    /// Virtual timestamps of every connect attempt.
    pub fn attempt_times(&self) -> Vec<tokio::time::Instant> {
        self.inner.attempt_times.lock().unwrap().clone()
    }

    /// Wait until at least `n` connect attempts have been made.
    pub async fn wait_for_attempts(&self, n: usize) {
        let mut rx = self.inner.attempts_tx.subscribe();
        loop {
            if *rx.borrow_and_update() >= n {
                return;
            }
            rx.changed().await.expect("transport dropped");
        }
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, _url: &str) -> AppResult<(Box<dyn FrameSink>, Box<dyn FrameStream>)> {
        self.inner
            .attempt_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        self.inner.attempts_tx.send_modify(|n| *n += 1);

        let outcome = self.inner.script.lock().unwrap().pop_front();
        match outcome {
            Some(Outcome::Fail(message)) => Err(AppError::transport(message)),
            Some(Outcome::Succeed(conn)) => Ok((
                Box::new(FakeSink { sent: conn.sent }),
                Box::new(FakeStream {
                    events: conn.events,
                }),
            )),
            // Nothing scripted: hang until the connect timeout.
            None => std::future::pending().await,
        }
    }
}

struct FakeSink {
    sent: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl FrameSink for FakeSink {
    async fn send(&mut self, raw: String) -> AppResult<()> {
        self.sent
            .send(raw)
            .map_err(|_| AppError::transport("test sink closed"))
    }

    async fn close(&mut self) {}
}

struct FakeStream {
    events: mpsc::UnboundedReceiver<AppResult<TransportEvent>>,
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_event(&mut self) -> Option<AppResult<TransportEvent>> {
        self.events.recv().await
    }
}
