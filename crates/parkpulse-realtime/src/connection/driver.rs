//! Connection driver — the single owner of the channel handle.
//!
//! One driver task runs per client instance. It owns the sink/stream pair,
//! both timers (backoff and heartbeat), and every state transition; facade
//! calls arrive as commands over a channel, so transitions are strictly
//! serialized and the machine is never in two states at once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parkpulse_core::config::realtime::RealtimeConfig;
use parkpulse_core::AppError;

use crate::client::Shared;
use crate::connection::backoff::ReconnectBackoff;
use crate::connection::heartbeat::{HeartbeatMonitor, ProbeDecision};
use crate::connection::state::ConnectionState;
use crate::message::envelope::{classify, InboundFrame};
use crate::message::types::OutboundFrame;
use crate::transport::{FrameSink, FrameStream, Transport, TransportEvent, NORMAL_CLOSE_CODE};

/// Commands sent from the facade to the driver.
#[derive(Debug)]
pub(crate) enum Command {
    /// Deliver a pre-serialized frame over the open channel.
    Send(String),
    /// Cancel any pending timer, reset the retry counter, and connect now.
    Reconnect,
}

/// How a connect attempt resolved.
enum ConnectOutcome {
    Connected(Box<dyn FrameSink>, Box<dyn FrameStream>),
    Failed(AppError),
    /// A manual reconnect arrived mid-attempt; retry immediately.
    Retry,
    Teardown,
}

/// Why the open-state loop exited.
enum OpenExit {
    Teardown,
    ManualReconnect,
    NormalClose,
    Failure(AppError),
}

/// The connection state machine, driven as a task.
pub(crate) struct ConnectionDriver<T> {
    transport: T,
    url: String,
    config: RealtimeConfig,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<Command>,
    backoff: ReconnectBackoff,
    cancel: CancellationToken,
}

impl<T: Transport> ConnectionDriver<T> {
    pub(crate) fn new(
        transport: T,
        url: String,
        config: RealtimeConfig,
        shared: Arc<Shared>,
        commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        let backoff = ReconnectBackoff::new(&config);
        Self {
            transport,
            url,
            config,
            shared,
            commands,
            backoff,
            cancel,
        }
    }

    /// Run the machine until teardown.
    pub(crate) async fn run(mut self) {
        loop {
            self.shared.set_state(ConnectionState::Connecting);

            match self.connect_attempt().await {
                ConnectOutcome::Connected(sink, stream) => {
                    self.backoff.reset();
                    self.shared.set_state(ConnectionState::Open);
                    info!(url = %self.url, "Realtime channel open");

                    match self.drive_open(sink, stream).await {
                        OpenExit::Teardown => break,
                        OpenExit::ManualReconnect => {
                            self.backoff.reset();
                            continue;
                        }
                        OpenExit::NormalClose => {
                            self.shared.set_state(ConnectionState::Closing);
                            self.shared.set_state(ConnectionState::Closed);
                            if !self.idle_closed().await {
                                return;
                            }
                            continue;
                        }
                        OpenExit::Failure(err) => {
                            if !self.handle_failure(err).await {
                                return;
                            }
                            continue;
                        }
                    }
                }
                ConnectOutcome::Failed(err) => {
                    if !self.handle_failure(err).await {
                        return;
                    }
                }
                ConnectOutcome::Retry => continue,
                ConnectOutcome::Teardown => break,
            }
        }

        self.shared.set_state(ConnectionState::Closed);
        debug!("Connection driver stopped");
    }

    /// One connect attempt, bounded by the configured timeout and
    /// interruptible by commands or teardown.
    async fn connect_attempt(&mut self) -> ConnectOutcome {
        debug!(url = %self.url, "Connecting");
        let timeout = self.config.connect_timeout();

        let connect = self.transport.connect(&self.url);
        tokio::pin!(connect);
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return ConnectOutcome::Teardown,
                result = &mut connect => {
                    return match result {
                        Ok((sink, stream)) => ConnectOutcome::Connected(sink, stream),
                        Err(e) => ConnectOutcome::Failed(e),
                    };
                }
                _ = &mut deadline => {
                    return ConnectOutcome::Failed(AppError::transport(format!(
                        "Connect attempt timed out after {}s",
                        timeout.as_secs()
                    )));
                }
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        self.backoff.reset();
                        return ConnectOutcome::Retry;
                    }
                    // The channel is not open; sends are dropped.
                    Some(Command::Send(_)) => continue,
                    None => return ConnectOutcome::Teardown,
                },
            }
        }
    }

    /// The open-state loop: pump inbound frames, outbound commands, and the
    /// heartbeat until something ends the connection.
    async fn drive_open(
        &mut self,
        mut sink: Box<dyn FrameSink>,
        mut stream: Box<dyn FrameStream>,
    ) -> OpenExit {
        let mut heartbeat = HeartbeatMonitor::new(&self.config, Instant::now());

        // Fresh status snapshot right away, instead of waiting out the
        // first heartbeat tick.
        if let Err(e) = sink.send(OutboundFrame::Status.to_json()).await {
            sink.close().await;
            return OpenExit::Failure(e);
        }

        let period = self.config.heartbeat_interval();
        let mut probe = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        probe.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    sink.close().await;
                    return OpenExit::Teardown;
                }
                command = self.commands.recv() => match command {
                    Some(Command::Send(raw)) => {
                        if let Err(e) = sink.send(raw).await {
                            sink.close().await;
                            return OpenExit::Failure(e);
                        }
                    }
                    Some(Command::Reconnect) => {
                        sink.close().await;
                        return OpenExit::ManualReconnect;
                    }
                    None => {
                        sink.close().await;
                        return OpenExit::Teardown;
                    }
                },
                _ = probe.tick() => {
                    match heartbeat.check(Instant::now()) {
                        ProbeDecision::Stale => {
                            let elapsed = heartbeat.elapsed(Instant::now());
                            warn!(
                                elapsed_secs = elapsed.as_secs(),
                                "Connection stale, no liveness reply"
                            );
                            sink.close().await;
                            return OpenExit::Failure(AppError::transport(format!(
                                "No liveness reply for {}s",
                                elapsed.as_secs()
                            )));
                        }
                        ProbeDecision::SendProbe => {
                            if let Err(e) = sink.send(OutboundFrame::Ping.to_json()).await {
                                sink.close().await;
                                return OpenExit::Failure(e);
                            }
                        }
                    }
                }
                event = stream.next_event() => match event {
                    Some(Ok(TransportEvent::Frame(raw))) => {
                        self.handle_frame(&raw, &mut heartbeat);
                    }
                    Some(Ok(TransportEvent::Closed { code, reason })) => {
                        sink.close().await;
                        if code == NORMAL_CLOSE_CODE {
                            info!(code, "Server closed the connection normally");
                            return OpenExit::NormalClose;
                        }
                        warn!(code, reason = %reason, "Abnormal close");
                        return OpenExit::Failure(AppError::transport(format!(
                            "Abnormal close (code {code}): {reason}"
                        )));
                    }
                    Some(Err(e)) => {
                        sink.close().await;
                        return OpenExit::Failure(e);
                    }
                    None => {
                        sink.close().await;
                        return OpenExit::Failure(AppError::transport(
                            "Connection ended unexpectedly",
                        ));
                    }
                },
            }
        }
    }

    /// Classify one inbound frame: liveness replies feed the heartbeat
    /// clock, everything else well-formed goes to subscribers. A malformed
    /// frame is logged and dropped, never fatal.
    fn handle_frame(&self, raw: &str, heartbeat: &mut HeartbeatMonitor) {
        match classify(raw) {
            Ok(InboundFrame::Pong) => {
                heartbeat.record_reply(Instant::now());
                debug!("Liveness reply");
            }
            Ok(InboundFrame::Message(message)) => self.shared.publish(message),
            Err(e) => warn!(error = %e, "Dropping malformed frame"),
        }
    }

    /// Involuntary-close path: count the failure, then either give up or
    /// wait out the backoff delay. Returns `false` when the driver should
    /// exit entirely.
    async fn handle_failure(&mut self, err: AppError) -> bool {
        let attempts = self.backoff.record_failure();
        warn!(attempt = attempts, error = %err, "Connection failed");
        self.shared.record_error(err);

        if attempts >= self.config.reconnect_max_attempts {
            warn!(attempts, "Reconnect attempts exhausted, giving up");
            self.shared.record_error(AppError::exhausted_retries(format!(
                "Gave up after {attempts} failed connection attempts"
            )));
            self.shared.set_state(ConnectionState::Closed);
            return self.idle_closed().await;
        }

        let delay = self.next_delay();
        info!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );
        self.shared.set_state(ConnectionState::ReconnectPending);

        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = &mut timer => return true,
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        // Manual override: drop the pending timer and start
                        // over from a clean counter.
                        self.backoff.reset();
                        return true;
                    }
                    Some(Command::Send(_)) => continue,
                    None => return false,
                },
            }
        }
    }

    /// Park in `Closed` until a manual reconnect revives the machine or
    /// teardown ends it. Returns `true` to revive.
    async fn idle_closed(&mut self) -> bool {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        self.backoff.reset();
                        return true;
                    }
                    Some(Command::Send(_)) => continue,
                    None => return false,
                },
            }
        }
    }

    /// Backoff delay for the current attempt, with bounded jitter when
    /// configured.
    fn next_delay(&self) -> std::time::Duration {
        let mut delay = self.backoff.next_delay();
        if self.config.reconnect_jitter_ms > 0 {
            use rand::RngExt;
            let jitter = rand::rng().random_range(0..=self.config.reconnect_jitter_ms);
            delay += std::time::Duration::from_millis(jitter);
        }
        delay
    }
}
