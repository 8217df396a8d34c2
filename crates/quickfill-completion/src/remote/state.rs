//! Connection lifecycle as a pure state machine
//!
//! [`ConnectionMachine::handle`] never touches the network or a clock. It
//! consumes one [`ConnectionEvent`] and returns the [`Effect`]s the driver
//! must apply, in order.

use std::time::Duration;

/// Close code of a clean, intentional shutdown
pub const CLOSE_NORMAL: u16 = 1000;
/// Close frame without a status code
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Connection dropped without a close frame
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Linear reconnect backoff configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry; retry `n` waits `n` times this
    pub base_delay: Duration,
    /// Retries allowed before giving up for good
    pub max_attempts: u32,
    /// How long a connect may stay pending
    pub connect_timeout: Duration,
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self {
            base_delay: Duration::from_millis(5_000),
            max_attempts: 5,
            connect_timeout: Duration::from_millis(45_000),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the connection currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No channel and no retry pending
    Disconnected,
    /// Channel requested, waiting for it to open
    Connecting,
    Open,
    /// Transport error seen, waiting for the close that follows it
    Faulted,
    /// Retry `attempt` fires after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// Retry budget exhausted; no further connects
    ClosedPermanently,
    /// Destroyed by the owner
    Shutdown,
}

impl ConnectionPhase {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionPhase::Open)
    }

    /// Phases that will never connect again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionPhase::ClosedPermanently | ConnectionPhase::Shutdown
        )
    }
}

/// Inputs to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Owner asked for a connection
    Connect,
    /// The pending channel finished opening
    Opened,
    /// The channel closed with the given code
    Closed { code: u16 },
    TransportError,
    /// The connect timeout elapsed
    Timeout,
    ReconnectTimerFired,
    Destroy,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ArmTimeout(Duration),
    CancelTimeout,
    /// Start opening a fresh channel, abandoning any previous one
    OpenChannel,
    /// Abandon the channel or pending connect without a close handshake
    DropChannel,
    /// Close the channel cleanly with `code`
    CloseChannel { code: u16 },
    SendPing,
    NotifyStatus(bool),
    ScheduleReconnect(Duration),
    CancelReconnect,
}

/// Connection state plus retry bookkeeping
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    phase: ConnectionPhase,
    attempts: u32,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            phase: ConnectionPhase::Disconnected,
            attempts: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Retries scheduled since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Apply one event and return the effects to run
    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<Effect> {
        use ConnectionEvent as E;
        use ConnectionPhase as P;

        match (self.phase, event) {
            (P::Shutdown, _) => Vec::new(),

            (_, E::Destroy) => {
                let was_open = self.phase.is_open();
                self.phase = P::Shutdown;
                let mut effects = vec![
                    Effect::CancelTimeout,
                    Effect::CancelReconnect,
                    Effect::CloseChannel { code: CLOSE_NORMAL },
                ];
                if was_open {
                    effects.push(Effect::NotifyStatus(false));
                }
                effects
            }

            (P::Disconnected, E::Connect) => self.begin_connect(),
            (P::Reconnecting { .. }, E::Connect) => {
                let mut effects = vec![Effect::CancelReconnect];
                effects.extend(self.begin_connect());
                effects
            }
            (P::Reconnecting { .. }, E::ReconnectTimerFired) => self.begin_connect(),

            (P::Connecting, E::Opened) => {
                self.phase = P::Open;
                self.attempts = 0;
                vec![
                    Effect::CancelTimeout,
                    Effect::SendPing,
                    Effect::NotifyStatus(true),
                ]
            }

            (P::Connecting | P::Open, E::TransportError) => {
                self.phase = P::Faulted;
                vec![Effect::NotifyStatus(false)]
            }

            (P::Connecting | P::Open | P::Faulted, E::Closed { code }) => {
                self.phase = P::Disconnected;
                let mut effects = vec![
                    Effect::CancelTimeout,
                    Effect::DropChannel,
                    Effect::NotifyStatus(false),
                ];
                if code != CLOSE_NORMAL {
                    effects.extend(self.schedule_reconnect());
                }
                effects
            }

            (P::Connecting | P::Faulted, E::Timeout) => {
                self.phase = P::Disconnected;
                let mut effects = vec![Effect::DropChannel, Effect::NotifyStatus(false)];
                effects.extend(self.schedule_reconnect());
                effects
            }

            // Stale timers and events for channels already abandoned
            _ => Vec::new(),
        }
    }

    fn begin_connect(&mut self) -> Vec<Effect> {
        self.phase = ConnectionPhase::Connecting;
        vec![
            Effect::ArmTimeout(self.policy.connect_timeout),
            Effect::OpenChannel,
        ]
    }

    fn schedule_reconnect(&mut self) -> Vec<Effect> {
        if self.attempts >= self.policy.max_attempts {
            self.phase = ConnectionPhase::ClosedPermanently;
            return Vec::new();
        }

        self.attempts += 1;
        let delay = self.policy.delay_for(self.attempts);
        self.phase = ConnectionPhase::Reconnecting {
            attempt: self.attempts,
            delay,
        };
        vec![Effect::ScheduleReconnect(delay)]
    }
}
