//! Listener supervision: start, restart after failures, stop.
//!
//! ```text
//! Idle -> Starting -> Running --stop--> Stopping -> Idle
//!            ^           |
//!            |        bind/transport error
//!            |           v
//!            +------ CoolingDown --stop--> Stopping
//! ```
//!
//! Bind and transport errors are retried forever after a fixed cooldown.
//! A stop request interrupts both the cooldown and a running listener.

use crate::config::Config;
use crate::dispatcher::dispatch;
use crate::error::{Error, Result};
use crate::listener::{ListenerConfig, TrapListener};
use crate::mapper::EventMapper;
use crate::sink::EventSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Default wait between a listener failure and the next start.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Default capacity of the trap queue between listener and dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Not running; `run` may be called.
    Idle,
    /// Binding a listener.
    Starting,
    /// A listener is receiving.
    Running,
    /// Waiting out the cooldown after a failure.
    CoolingDown,
    /// Draining the trap queue before returning to `Idle`.
    Stopping,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::CoolingDown => "cooling down",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Keeps one trap listener alive until stopped.
///
/// Share it behind an `Arc` to call [`stop`](Self::stop) from another task.
pub struct Supervisor {
    listener: ListenerConfig,
    mapper: EventMapper,
    sink: Arc<dyn EventSink>,
    cooldown: Duration,
    queue_capacity: usize,
    state: watch::Sender<SupervisorState>,
    stop: Mutex<CancellationToken>,
    running: AtomicBool,
}

impl Supervisor {
    /// Create a supervisor delivering events to `sink`.
    pub fn new(listener: ListenerConfig, mapper: EventMapper, sink: impl EventSink) -> Self {
        Self {
            listener,
            mapper,
            sink: Arc::new(sink),
            cooldown: DEFAULT_COOLDOWN,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            state: watch::Sender::new(SupervisorState::Idle),
            stop: Mutex::new(CancellationToken::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Create a supervisor from a validated configuration.
    pub fn from_config(config: &Config, sink: impl EventSink) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.listener_config()?, config.mapper()?, sink)
            .cooldown(config.cooldown)
            .queue_capacity(config.queue_capacity))
    }

    /// Set the wait between a failure and the next start.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the trap queue capacity (minimum 1).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Request a stop.
    ///
    /// Interrupts the cooldown or the running listener. Without an active
    /// [`run`](Self::run) this is a no-op.
    pub fn stop(&self) {
        let token = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.running.load(Ordering::Acquire) {
            tracing::debug!("stop requested while idle");
            return;
        }
        tracing::info!("stop requested");
        token.cancel();
    }

    /// Run until [`stop`](Self::stop) is called.
    ///
    /// Only one `run` may be active at a time; the supervisor is reusable
    /// once it returns or its future is dropped.
    pub async fn run(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyRunning);
        }
        let _reset = RunGuard { supervisor: self };

        let token = self.token();
        self.supervise(&token).await
    }

    async fn supervise(&self, token: &CancellationToken) -> Result<()> {
        if token.is_cancelled() {
            return Ok(());
        }
        self.listener.validate()?;

        let decoder = self.listener.decoder();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let dispatcher = tokio::spawn(dispatch(rx, self.mapper.clone(), Arc::clone(&self.sink)));

        let mut outcome = Ok(());
        while !token.is_cancelled() {
            self.set_state(SupervisorState::Starting);
            let listener = TrapListener::bind(
                &self.listener,
                decoder.clone(),
                tx.clone(),
                token.child_token(),
            );
            let attempt = match listener {
                Ok(listener) => {
                    self.set_state(SupervisorState::Running);
                    tracing::info!(
                        snmp.local_addr = %listener.local_addr(),
                        "SNMP trap listener started"
                    );
                    listener.run().await
                }
                Err(e) => Err(e),
            };

            match attempt {
                Ok(()) => break,
                Err(e) => match self.recover(e, token).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                },
            }
        }

        self.set_state(SupervisorState::Stopping);
        drop(tx);
        match dispatcher.await {
            Ok(delivered) => tracing::info!(
                delivered,
                "SNMP trap listener stopped"
            ),
            Err(e) => tracing::error!(
                error = %e,
                "event dispatcher failed"
            ),
        }
        outcome
    }

    /// Handle a failed attempt. Returns whether to start again.
    async fn recover(&self, error: Error, token: &CancellationToken) -> Result<bool> {
        if !error.is_retryable() {
            return Err(error);
        }
        tracing::warn!(
            error = %error,
            cooldown = ?self.cooldown,
            "SNMP trap listener died"
        );
        self.set_state(SupervisorState::CoolingDown);
        tokio::select! {
            _ = token.cancelled() => Ok(false),
            _ = tokio::time::sleep(self.cooldown) => Ok(true),
        }
    }

    fn token(&self) -> CancellationToken {
        self.stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(
                from = %previous,
                to = %state,
                "state transition"
            );
        }
    }
}

/// Returns the supervisor to `Idle` when `run` ends, including when its
/// future is dropped.
struct RunGuard<'a> {
    supervisor: &'a Supervisor,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let sup = self.supervisor;
        {
            let mut token = sup.stop.lock().unwrap_or_else(PoisonError::into_inner);
            sup.running.store(false, Ordering::Release);
            if token.is_cancelled() {
                *token = CancellationToken::new();
            }
        }
        sup.set_state(SupervisorState::Idle);
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("bind_addr", &self.listener.bind_addr)
            .field("cooldown", &self.cooldown)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::QueueSink;

    fn supervisor(bind_addr: &str) -> (Supervisor, mpsc::Receiver<crate::event::Event>) {
        let (sink, rx) = QueueSink::channel(16, Duration::from_millis(100));
        let sup = Supervisor::new(
            ListenerConfig::new(bind_addr.parse().unwrap()),
            EventMapper::default(),
            sink,
        )
        .cooldown(Duration::from_millis(50));
        (sup, rx)
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_noop() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let sup = Arc::new(sup);
        sup.stop();

        let mut states = sup.subscribe();
        let task = tokio::spawn({
            let sup = Arc::clone(&sup);
            async move { sup.run().await }
        });
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s == SupervisorState::Running),
        )
        .await
        .unwrap()
        .unwrap();

        sup.stop();
        task.await.unwrap().unwrap();
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_run_can_be_restarted() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let sup = Arc::new(sup);

        let dropped = tokio::time::timeout(Duration::from_millis(200), sup.run()).await;
        assert!(dropped.is_err());
        assert_eq!(sup.state(), SupervisorState::Idle);

        let mut states = sup.subscribe();
        let task = tokio::spawn({
            let sup = Arc::clone(&sup);
            async move { sup.run().await }
        });
        states
            .wait_for(|s| *s == SupervisorState::Running)
            .await
            .unwrap();
        sup.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_cools_down_and_retries() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let token = CancellationToken::new();
        let error = Error::Transport {
            local_addr: None,
            source: std::io::Error::from(std::io::ErrorKind::ConnectionReset),
        };

        assert!(sup.recover(error, &token).await.unwrap());
        assert_eq!(sup.state(), SupervisorState::CoolingDown);
    }

    #[tokio::test]
    async fn test_recover_interrupted_by_stop() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let sup = sup.cooldown(Duration::from_secs(60));
        let token = CancellationToken::new();
        token.cancel();
        let error = Error::Transport {
            local_addr: None,
            source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        };

        let retry = tokio::time::timeout(Duration::from_secs(2), sup.recover(error, &token))
            .await
            .unwrap()
            .unwrap();
        assert!(!retry);
    }

    #[tokio::test]
    async fn test_recover_propagates_config_error() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let token = CancellationToken::new();
        let result = sup.recover(Error::config("bad"), &token).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[tokio::test]
    async fn test_second_run_rejected() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let sup = Arc::new(sup);
        let mut states = sup.subscribe();

        let task = tokio::spawn({
            let sup = Arc::clone(&sup);
            async move { sup.run().await }
        });
        states
            .wait_for(|s| *s == SupervisorState::Running)
            .await
            .unwrap();

        assert!(matches!(sup.run().await, Err(Error::AlreadyRunning)));

        sup.stop();
        task.await.unwrap().unwrap();
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[tokio::test]
    async fn test_reusable_after_stop() {
        let (sup, _rx) = supervisor("127.0.0.1:0");
        let sup = Arc::new(sup);

        for _ in 0..2 {
            let mut states = sup.subscribe();
            let task = tokio::spawn({
                let sup = Arc::clone(&sup);
                async move { sup.run().await }
            });
            states
                .wait_for(|s| *s == SupervisorState::Running)
                .await
                .unwrap();
            sup.stop();
            task.await.unwrap().unwrap();
        }
    }
}
