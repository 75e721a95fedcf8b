//! Streaming channel to the assistant backend.
//!
//! One WebSocket per session at `{ws_base}/ws/{session_id}`. The channel runs
//! as a task on the tokio runtime and reports everything it sees through a
//! callback, in arrival order. Dropping the [`StreamHandle`] closes the
//! socket and stops the task; that is the only cancellation primitive.
//!
//! ## Reconnection
//!
//! After a failed connect or a dropped socket the task waits according to
//! [`ReconnectPolicy`] (exponential backoff with jitter) and tries again. The
//! attempt counter resets on every successful connect. Once the policy is
//! exhausted the channel reports [`ConnectionStatus::Disconnected`] and idles
//! until [`StreamHandle::reconnect`] is called.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ReconnectConfig;
use crate::error::{Error, Result};
use crate::protocol::{InboundEvent, OutboundFrame};
use crate::session::SessionId;

/// State of the streaming channel, as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before reconnect attempt number `attempt`
    Reconnecting { attempt: u32, delay: Duration },
}

impl ConnectionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::Disconnected => "disconnected".to_string(),
            ConnectionStatus::Connecting => "connecting".to_string(),
            ConnectionStatus::Connected => "connected".to_string(),
            ConnectionStatus::Reconnecting { attempt, delay } => {
                format!("reconnecting #{} in {:.1}s", attempt, delay.as_secs_f64())
            }
        }
    }
}

/// Something the channel observed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Status(ConnectionStatus),
    Inbound(InboundEvent),
}

/// Backoff schedule for reconnect attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// 0 = unlimited
    pub max_attempts: u32,
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            enabled: config.enabled,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)),
            max_attempts: config.max_attempts,
            jitter: config.jitter.clamp(0.0, 1.0),
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never reconnects.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay before reconnect attempt `failures + 1`, or `None` once
    /// `max_attempts` reconnects have been tried.
    pub fn next_delay(&self, failures: u32) -> Option<Duration> {
        let factor = if self.jitter > 0.0 {
            rand::rng().random_range((1.0 - self.jitter)..=(1.0 + self.jitter))
        } else {
            1.0
        };
        self.delay_with_factor(failures, factor)
    }

    /// Deterministic part of [`next_delay`](Self::next_delay).
    pub fn delay_with_factor(&self, failures: u32, factor: f64) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        if self.max_attempts > 0 && failures >= self.max_attempts {
            return None;
        }
        let base = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(failures.min(31)))
            .min(self.max_delay);
        if factor == 1.0 {
            Some(base)
        } else {
            Some(base.mul_f64(factor.max(0.0)))
        }
    }
}

enum Command {
    Send(String),
    Reconnect,
}

/// Owning handle to a running streaming channel.
pub struct StreamHandle {
    session_id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Open the channel for `session_id` and start delivering events to `emit`.
    pub fn spawn<F>(
        runtime: &Handle,
        ws_base: &str,
        session_id: SessionId,
        policy: ReconnectPolicy,
        emit: F,
    ) -> Self
    where
        F: Fn(StreamEvent) + Send + 'static,
    {
        let url = format!(
            "{}/ws/{}",
            ws_base.trim_end_matches('/'),
            urlencoding::encode(session_id.as_str())
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_channel(url, policy, rx, emit));
        Self {
            session_id,
            commands: tx,
            task,
        }
    }

    /// Queue a frame for sending.
    pub fn send(&self, frame: &OutboundFrame) -> Result<()> {
        let text = frame.to_json()?;
        self.commands
            .send(Command::Send(text))
            .map_err(|_| Error::Stream("channel task has stopped".to_string()))
    }

    /// Skip any pending backoff and connect again if not connected.
    pub fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        tracing::debug!(session_id = %self.session_id, "Closing streaming channel");
        self.task.abort();
    }
}

async fn run_channel<F>(
    url: String,
    policy: ReconnectPolicy,
    mut commands: mpsc::UnboundedReceiver<Command>,
    emit: F,
) where
    F: Fn(StreamEvent) + Send + 'static,
{
    let mut failures = 0u32;

    loop {
        if failures == 0 {
            emit(StreamEvent::Status(ConnectionStatus::Connecting));
        }

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                tracing::info!(url = %url, "Streaming channel connected");
                failures = 0;
                emit(StreamEvent::Status(ConnectionStatus::Connected));

                let (mut write, mut read) = socket.split();
                let reason = loop {
                    tokio::select! {
                        command = commands.recv() => match command {
                            Some(Command::Send(text)) => {
                                if let Err(e) = write.send(Message::Text(text.into())).await {
                                    break e.to_string();
                                }
                            }
                            Some(Command::Reconnect) => {
                                tracing::debug!("Reconnect requested while connected, ignoring");
                            }
                            None => {
                                let _ = write.close().await;
                                return;
                            }
                        },
                        frame = read.next() => match frame {
                            Some(Ok(Message::Text(text))) => match InboundEvent::parse(&text) {
                                Ok(event) => emit(StreamEvent::Inbound(event)),
                                Err(e) => {
                                    tracing::warn!(error = %e, "Ignoring malformed inbound frame");
                                }
                            },
                            Some(Ok(Message::Close(_))) => break "closed by server".to_string(),
                            Some(Ok(_)) => {}
                            Some(Err(e)) => break e.to_string(),
                            None => break "stream ended".to_string(),
                        }
                    }
                };
                tracing::warn!(url = %url, reason = %reason, "Streaming channel dropped");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, failures, "Streaming channel connect failed");
            }
        }

        // Wait out the backoff, or idle until asked to reconnect.
        let backoff = policy.next_delay(failures);
        failures += 1;
        match backoff {
            Some(delay) => {
                emit(StreamEvent::Status(ConnectionStatus::Reconnecting {
                    attempt: failures,
                    delay,
                }));
                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                loop {
                    tokio::select! {
                        _ = &mut sleep => break,
                        command = commands.recv() => match command {
                            Some(Command::Reconnect) => break,
                            Some(Command::Send(_)) => {
                                tracing::warn!("Dropping outbound frame while reconnecting");
                            }
                            None => return,
                        }
                    }
                }
            }
            None => {
                emit(StreamEvent::Status(ConnectionStatus::Disconnected));
                loop {
                    match commands.recv().await {
                        Some(Command::Reconnect) => {
                            failures = 0;
                            break;
                        }
                        Some(Command::Send(_)) => {
                            tracing::warn!("Dropping outbound frame while disconnected");
                        }
                        None => return,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: true,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            max_attempts: 5,
            jitter: 0.2,
        }
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = policy();
        let delays: Vec<u128> = (0..5)
            .map(|n| policy.delay_with_factor(n, 1.0).unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 4000]);
    }

    #[test]
    fn test_backoff_gives_up_after_max_attempts() {
        let policy = policy();
        assert!(policy.delay_with_factor(5, 1.0).is_none());

        let unlimited = ReconnectPolicy {
            max_attempts: 0,
            ..policy
        };
        assert_eq!(
            unlimited.delay_with_factor(1000, 1.0),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn test_disabled_policy_never_reconnects() {
        assert!(ReconnectPolicy::disabled().next_delay(0).is_none());
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = policy();
        for _ in 0..100 {
            let delay = policy.next_delay(1).unwrap();
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = ReconnectConfig {
            max_delay_ms: 100,
            initial_delay_ms: 250,
            ..Default::default()
        };
        let policy = ReconnectPolicy::from(&config);
        // max never drops below the initial delay
        assert_eq!(policy.max_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_status_labels() {
        assert!(ConnectionStatus::Connected.is_open());
        assert!(!ConnectionStatus::Connecting.is_open());
        assert_eq!(
            ConnectionStatus::Reconnecting {
                attempt: 2,
                delay: Duration::from_millis(1500)
            }
            .label(),
            "reconnecting #2 in 1.5s"
        );
    }
}
