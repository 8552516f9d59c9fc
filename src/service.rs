//! Serialized event processing for one playback session.
//!
//! Player events are queued on a channel and handled one at a time, so at
//! most one selection run is ever in progress.

use tokio::sync::mpsc;

use crate::controller::{SelectionController, ToggleCommand};
use crate::player::Player;

/// Events that can trigger a selection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    FileLoaded,
    PlaybackStarted,
    TrackListChanged,
    AudioChanged,
    Reselect,
    SetEnabled(ToggleCommand),
}

/// Returned when an event is sent to a service that has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Selection service is not running")]
pub struct ServiceStopped;

/// Sending side of a running [`SelectionService`].
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    events_tx: mpsc::Sender<SessionEvent>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ServiceHandle {
    /// Queue an event. Fails only if the service has stopped.
    pub async fn send(&self, event: SessionEvent) -> Result<(), ServiceStopped> {
        self.events_tx.send(event).await.map_err(|_| ServiceStopped)
    }

    /// Ask the service to stop after the event it is currently handling.
    /// Events still queued are dropped.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Owns a [`SelectionController`] and feeds it queued events.
pub struct SelectionService<P> {
    controller: SelectionController<P>,
    events_rx: mpsc::Receiver<SessionEvent>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<P: Player> SelectionService<P> {
    pub fn new(controller: SelectionController<P>, capacity: usize) -> (Self, ServiceHandle) {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let service = Self {
            controller,
            events_rx,
            shutdown_rx,
        };
        (
            service,
            ServiceHandle {
                events_tx,
                shutdown_tx,
            },
        )
    }

    /// Process events until shutdown is requested or every handle is
    /// dropped, then hand back the controller.
    ///
    /// Shutdown discards queued events. Dropping the handles instead drains
    /// the queue first.
    pub async fn run(mut self) -> SelectionController<P> {
        tracing::info!("Selection service started");

        loop {
            tokio::select! {
                biased;

                Some(()) = self.shutdown_rx.recv() => {
                    tracing::info!("Selection service shutting down");
                    break;
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle(event),
                        None => {
                            tracing::debug!("All service handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.controller
    }

    fn handle(&mut self, event: SessionEvent) {
        tracing::debug!("Handling {:?}", event);

        let result = match event {
            SessionEvent::FileLoaded => self.controller.on_file_loaded(),
            SessionEvent::PlaybackStarted => self.controller.on_playback_started(),
            SessionEvent::TrackListChanged => self.controller.on_track_list_changed(),
            SessionEvent::AudioChanged => self.controller.on_audio_changed(),
            SessionEvent::Reselect => self.controller.reselect(),
            SessionEvent::SetEnabled(command) => self.controller.set_enabled(command),
        };

        match result {
            Ok(Some(selection)) => tracing::debug!(
                "{:?}: rule={:?} audio={} sub={} secondary_sub={}",
                event,
                selection.rule_index,
                selection.audio,
                selection.sub,
                selection.secondary_sub
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("Selection failed on {:?}: {}", event, e),
        }
    }
}
