//! In-memory connector whose behaviour is scripted per connect attempt

#![allow(dead_code)]

use async_trait::async_trait;
use quickfill_completion::{
    ChannelEvent, CompletionError, CompletionResult, ConnectionObserver, Connector, DuplexChannel,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What a connect attempt does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Never completes
    Hang,
    /// Fails immediately
    Fail,
    /// Opens a channel driven by a [`ChannelHandle`]
    Open,
}

/// Test-side end of an opened channel
#[derive(Clone)]
pub struct ChannelHandle {
    events: mpsc::UnboundedSender<ChannelEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_with: Arc<Mutex<Option<u16>>>,
}

impl ChannelHandle {
    pub fn push(&self, event: ChannelEvent) {
        self.events.send(event).expect("channel dropped");
    }

    pub fn message(&self, payload: &str) {
        self.push(ChannelEvent::Message(payload.to_string()));
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed_with(&self) -> Option<u16> {
        *self.closed_with.lock().unwrap()
    }
}

struct ScriptedChannel {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_with: Arc<Mutex<Option<u16>>>,
}

#[async_trait]
impl DuplexChannel for ScriptedChannel {
    async fn send(&mut self, text: String) -> CompletionResult<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_event(&mut self) -> ChannelEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self, code: u16, _reason: &str) -> CompletionResult<()> {
        *self.closed_with.lock().unwrap() = Some(code);
        Ok(())
    }
}

/// Connector that plays back `steps`, then repeats `fallback` forever
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    attempts: Mutex<Vec<Instant>>,
    channels: Mutex<Vec<ChannelHandle>>,
}

impl ScriptedConnector {
    pub fn new(steps: &[Step], fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.iter().copied().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
        })
    }

    /// Instants at which connect was called
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Handle of the `n`th opened channel
    pub fn channel(&self, n: usize) -> ChannelHandle {
        self.channels.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _endpoint: &str) -> CompletionResult<Box<dyn DuplexChannel>> {
        self.attempts.lock().unwrap().push(Instant::now());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(self.fallback);

        match step {
            Step::Hang => std::future::pending().await,
            Step::Fail => Err(CompletionError::ConnectionError(
                "connection refused".to_string(),
            )),
            Step::Open => {
                let (tx, rx) = mpsc::unbounded_channel();
                let sent = Arc::new(Mutex::new(Vec::new()));
                let closed_with = Arc::new(Mutex::new(None));
                self.channels.lock().unwrap().push(ChannelHandle {
                    events: tx,
                    sent: Arc::clone(&sent),
                    closed_with: Arc::clone(&closed_with),
                });
                Ok(Box::new(ScriptedChannel {
                    events: rx,
                    sent,
                    closed_with,
                }))
            }
        }
    }
}

/// Observer that records every status change
#[derive(Default)]
pub struct RecordingObserver {
    statuses: Mutex<Vec<bool>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn statuses(&self) -> Vec<bool> {
        self.statuses.lock().unwrap().clone()
    }
}

impl ConnectionObserver for RecordingObserver {
    fn connection_changed(&self, connected: bool) {
        self.statuses.lock().unwrap().push(connected);
    }
}
