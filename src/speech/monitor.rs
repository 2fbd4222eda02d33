//! Microphone energy watcher used to interrupt playback when the user speaks.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Current input level, sampled once per frame.
pub trait EnergySource: Send + 'static {
    /// RMS level of the latest frame, `None` when the input is gone.
    fn level(&mut self) -> Option<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    SpeechDetected,
    SilenceDetected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    pub threshold: f32,
    pub silence_duration: Duration,
    pub frame_interval: Duration,
}

impl MonitorConfig {
    pub fn new(threshold: f32, silence_duration: Duration) -> Self {
        Self {
            threshold,
            silence_duration,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

pub struct InterruptionMonitor {
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<MonitorEvent>,
    task: JoinHandle<()>,
}

impl InterruptionMonitor {
    pub fn spawn(mut source: Box<dyn EnergySource>, config: MonitorConfig) -> Self {
        let cancel = CancellationToken::new();
        let (tx, events) = mpsc::unbounded_channel();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.frame_interval);
            let mut silent_for = Duration::ZERO;
            let mut silence_reported = false;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(level) = source.level() else {
                    debug!("energy source closed; monitor stopping");
                    break;
                };

                if level >= config.threshold {
                    debug!(level, "speech detected during playback");
                    let _ = tx.send(MonitorEvent::SpeechDetected);
                    break;
                }

                silent_for += config.frame_interval;
                if !silence_reported && silent_for >= config.silence_duration {
                    silence_reported = true;
                    let _ = tx.send(MonitorEvent::SilenceDetected);
                }
            }
        });

        Self {
            cancel,
            events,
            task,
        }
    }

    /// Next event; `None` after the monitor has stopped and drained.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events.recv().await
    }

    /// Resolves on speech. Never resolves if the monitor ends without hearing any,
    /// which lets it sit in a `select!` against playback.
    pub async fn wait_for_speech(&mut self) {
        while let Some(event) = self.events.recv().await {
            if event == MonitorEvent::SpeechDetected {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for InterruptionMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
