//! Resilient suggestion client and its background driver

use super::protocol::{parse_inbound, Inbound, Outbound, RemoteEntry};
use super::state::{
    ConnectionEvent, ConnectionMachine, ConnectionPhase, Effect, ReconnectPolicy, CLOSE_ABNORMAL,
};
use super::transport::{ChannelEvent, Connector, DuplexChannel};
use crate::config::CompletionConfig;
use crate::language::Language;
use crate::types::{CompletionError, CompletionResult};
use futures::future::BoxFuture;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Receives connection status changes
pub trait ConnectionObserver: Send + Sync {
    fn connection_changed(&self, connected: bool);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConnectionObserver for NoopObserver {
    fn connection_changed(&self, _connected: bool) {}
}

/// The most recent suggestion batch, replaced wholesale on every message
pub type SuggestionBatch = Arc<Vec<RemoteEntry>>;

enum Command {
    Connect,
    Send(String),
    Destroy,
}

/// Client for the remote suggestion backend
///
/// All connection state lives in a background task. The handle only sends
/// commands and reads snapshots, so none of its methods block.
pub struct RemoteSuggestionClient {
    commands: mpsc::UnboundedSender<Command>,
    phase: watch::Receiver<ConnectionPhase>,
    batch: watch::Receiver<SuggestionBatch>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteSuggestionClient {
    /// Spawn the driver task; the client starts `Disconnected`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        endpoint: impl Into<String>,
        policy: ReconnectPolicy,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Disconnected);
        let (batch_tx, batch_rx) = watch::channel(SuggestionBatch::default());

        let driver = Driver {
            machine: ConnectionMachine::new(policy),
            endpoint: endpoint.into(),
            connector,
            observer,
            commands: command_rx,
            phase: phase_tx,
            batch: batch_tx,
            channel: None,
            pending_connect: None,
            timeout_at: None,
            reconnect_at: None,
        };
        let handle = tokio::spawn(driver.run());

        Self {
            commands: command_tx,
            phase: phase_rx,
            batch: batch_rx,
            driver: Mutex::new(Some(handle)),
        }
    }

    /// Spawn a client using the endpoint and retry settings of `config`
    pub fn from_config(
        config: &CompletionConfig,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Self {
        let policy = ReconnectPolicy::new()
            .with_base_delay(config.reconnect_base_delay())
            .with_connect_timeout(config.connection_timeout())
            .with_max_attempts(config.max_reconnect_attempts);
        Self::spawn(config.endpoint.clone(), policy, connector, observer)
    }

    /// Start connecting; ignored unless disconnected or waiting to retry
    pub fn connect(&self) {
        if self.commands.send(Command::Connect).is_err() {
            debug!("Connect requested after the client was destroyed");
        }
    }

    /// Send a search request without waiting for the answer
    ///
    /// Returns `false` when the channel is not open. The answer, if any,
    /// shows up in [`RemoteSuggestionClient::batch`] later.
    pub fn query(&self, word: &str, language: Language) -> bool {
        match self.try_query(word, language) {
            Ok(()) => true,
            Err(e) if e.is_transport() => false,
            Err(e) => {
                error!(error_type = e.error_type(), "Failed to send search request: {}", e);
                false
            }
        }
    }

    /// Same as [`RemoteSuggestionClient::query`], reporting why nothing was sent
    pub fn try_query(&self, word: &str, language: Language) -> CompletionResult<()> {
        if !self.is_connected() {
            return Err(CompletionError::NotConnected);
        }

        let payload = Outbound::search(word, language).to_json()?;
        self.commands
            .send(Command::Send(payload))
            .map_err(|_| CompletionError::ConnectionError("client driver stopped".to_string()))
    }

    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.phase().is_open()
    }

    /// Snapshot of the cached suggestion batch
    pub fn batch(&self) -> SuggestionBatch {
        self.batch.borrow().clone()
    }

    /// Watch phase transitions
    pub fn subscribe(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase.clone()
    }

    /// Watch batch replacements
    pub fn subscribe_batch(&self) -> watch::Receiver<SuggestionBatch> {
        self.batch.clone()
    }

    /// Cancel timers, close the channel cleanly and stop the driver
    ///
    /// Safe to call more than once.
    pub async fn destroy(&self) {
        let Some(handle) = self.driver.lock().await.take() else {
            return;
        };

        let _ = self.commands.send(Command::Destroy);
        if let Err(e) = handle.await {
            warn!("Suggestion client driver ended abnormally: {}", e);
        }
    }
}

type PendingConnect = BoxFuture<'static, CompletionResult<Box<dyn DuplexChannel>>>;

struct Driver {
    machine: ConnectionMachine,
    endpoint: String,
    connector: Arc<dyn Connector>,
    observer: Arc<dyn ConnectionObserver>,
    commands: mpsc::UnboundedReceiver<Command>,
    phase: watch::Sender<ConnectionPhase>,
    batch: watch::Sender<SuggestionBatch>,
    channel: Option<Box<dyn DuplexChannel>>,
    pending_connect: Option<PendingConnect>,
    timeout_at: Option<Instant>,
    reconnect_at: Option<Instant>,
}

impl Driver {
    async fn run(mut self) {
        debug!(endpoint = %self.endpoint, "Suggestion client driver started");

        while self.machine.phase() != ConnectionPhase::Shutdown {
            let events = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => vec![ConnectionEvent::Connect],
                    Some(Command::Send(payload)) => {
                        self.send(payload).await;
                        Vec::new()
                    }
                    // A dropped handle counts as destroy
                    Some(Command::Destroy) | None => vec![ConnectionEvent::Destroy],
                },
                result = wait_connect(&mut self.pending_connect) => {
                    self.pending_connect = None;
                    match result {
                        Ok(channel) => {
                            self.channel = Some(channel);
                            vec![ConnectionEvent::Opened]
                        }
                        Err(e) => {
                            warn!(endpoint = %self.endpoint, "Connection failed: {}", e);
                            vec![
                                ConnectionEvent::TransportError,
                                ConnectionEvent::Closed { code: CLOSE_ABNORMAL },
                            ]
                        }
                    }
                },
                event = wait_channel(&mut self.channel) => self.on_channel_event(event),
                _ = wait_deadline(self.timeout_at) => {
                    self.timeout_at = None;
                    let err = CompletionError::TimeoutError(
                        self.machine.policy().connect_timeout.as_millis() as u64,
                    );
                    warn!(endpoint = %self.endpoint, error_type = err.error_type(), "{}", err);
                    vec![ConnectionEvent::Timeout]
                },
                _ = wait_deadline(self.reconnect_at) => {
                    self.reconnect_at = None;
                    vec![ConnectionEvent::ReconnectTimerFired]
                },
            };

            for event in events {
                let effects = self.machine.handle(event);
                for effect in effects {
                    self.apply(effect).await;
                }
            }
            self.publish_phase();
        }

        debug!("Suggestion client driver stopped");
    }

    fn on_channel_event(&mut self, event: ChannelEvent) -> Vec<ConnectionEvent> {
        match event {
            ChannelEvent::Message(payload) => {
                self.on_message(&payload);
                Vec::new()
            }
            ChannelEvent::Error(e) => {
                error!("WebSocket error: {}", e);
                vec![ConnectionEvent::TransportError]
            }
            ChannelEvent::Closed(code) => {
                self.channel = None;
                warn!(code, "Connection closed");
                vec![ConnectionEvent::Closed { code }]
            }
        }
    }

    fn on_message(&mut self, payload: &str) {
        match parse_inbound(payload) {
            Inbound::Pong => debug!("Heartbeat acknowledged"),
            Inbound::Error(message) => {
                warn!(message = message.as_deref().unwrap_or(""), "Backend error");
            }
            Inbound::Batch(entries) if !entries.is_empty() => {
                debug!(count = entries.len(), "Received suggestion batch");
                self.batch.send_replace(Arc::new(entries));
            }
            Inbound::Batch(_) | Inbound::Unrecognized => {
                self.batch.send_replace(SuggestionBatch::default());
            }
            Inbound::Malformed(e) => {
                let err = CompletionError::ProtocolError(e);
                warn!(error_type = err.error_type(), "{}", err);
                self.batch.send_replace(SuggestionBatch::default());
            }
        }
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ArmTimeout(after) => self.timeout_at = Some(Instant::now() + after),
            Effect::CancelTimeout => self.timeout_at = None,
            Effect::OpenChannel => {
                self.channel = None;
                let connector = Arc::clone(&self.connector);
                let endpoint = self.endpoint.clone();
                info!(endpoint = %endpoint, "Connecting to suggestion backend");
                self.pending_connect =
                    Some(Box::pin(async move { connector.connect(&endpoint).await }));
            }
            Effect::DropChannel => {
                self.pending_connect = None;
                self.channel = None;
            }
            Effect::CloseChannel { code } => {
                self.pending_connect = None;
                if let Some(mut channel) = self.channel.take() {
                    if let Err(e) = channel.close(code, "client shutdown").await {
                        debug!("Close handshake failed: {}", e);
                    }
                }
            }
            Effect::SendPing => match Outbound::Ping.to_json() {
                Ok(payload) => self.send(payload).await,
                Err(e) => warn!("Failed to encode ping: {}", e),
            },
            Effect::NotifyStatus(connected) => {
                if connected {
                    info!(endpoint = %self.endpoint, "Connected to suggestion backend");
                }
                self.observer.connection_changed(connected);
            }
            Effect::ScheduleReconnect(delay) => {
                info!(
                    attempt = self.machine.attempts(),
                    max_attempts = self.machine.policy().max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            Effect::CancelReconnect => self.reconnect_at = None,
        }
    }

    async fn send(&mut self, payload: String) {
        if !self.machine.phase().is_open() {
            debug!("Dropping outbound message, channel not open");
            return;
        }
        if let Some(channel) = self.channel.as_mut() {
            if let Err(e) = channel.send(payload).await {
                warn!("Failed to send to backend: {}", e);
            }
        }
    }

    fn publish_phase(&self) {
        let phase = self.machine.phase();
        let changed = self.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
        if changed && phase == ConnectionPhase::ClosedPermanently {
            error!(
                attempts = self.machine.policy().max_attempts,
                "Giving up on suggestion backend, continuing with local suggestions only"
            );
        }
    }
}

async fn wait_connect(
    pending_connect: &mut Option<PendingConnect>,
) -> CompletionResult<Box<dyn DuplexChannel>> {
    match pending_connect {
        Some(connect) => connect.await,
        None => pending().await,
    }
}

async fn wait_channel(channel: &mut Option<Box<dyn DuplexChannel>>) -> ChannelEvent {
    match channel {
        Some(channel) => channel.next_event().await,
        None => pending().await,
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
