//! Location tracking loop
//!
//! One task owns the [`Session`]. Fixes from the provider, the periodic tick
//! and control commands are all handled on that task, so session state is
//! never shared. Every handled event publishes a fresh [`HudSnapshot`].

use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::game::{HudSnapshot, Session, SessionEvent, TrackingStatus};
use crate::platform::{
    HapticActuator, LocationFix, LocationProvider, PermissionStatus, ProviderError,
};
use crate::util::time::unix_millis;

/// Control messages from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    /// (Re)start tracking: permission check, first fix, subscription
    Retry,
    /// Stop tracking and go idle
    Stop,
    /// Stop tracking and end the loop
    Shutdown,
}

/// Handle to a running tracker
#[derive(Clone)]
pub struct TrackerHandle {
    command_tx: mpsc::Sender<TrackerCommand>,
    hud_rx: watch::Receiver<HudSnapshot>,
}

impl TrackerHandle {
    /// Manual retry after a permission or location failure.
    /// Returns false if the tracker is gone.
    pub async fn retry(&self) -> bool {
        self.command_tx.send(TrackerCommand::Retry).await.is_ok()
    }

    pub async fn stop(&self) -> bool {
        self.command_tx.send(TrackerCommand::Stop).await.is_ok()
    }

    pub async fn shutdown(&self) -> bool {
        self.command_tx.send(TrackerCommand::Shutdown).await.is_ok()
    }

    /// Receiver that sees every published HUD snapshot
    pub fn subscribe_hud(&self) -> watch::Receiver<HudSnapshot> {
        self.hud_rx.clone()
    }
}

/// How an active tracking phase ended
enum TrackingExit {
    Idle,
    Restart,
    Shutdown,
}

/// The session driver
pub struct Tracker<P, H> {
    session: Session,
    provider: P,
    haptics: H,
    command_rx: mpsc::Receiver<TrackerCommand>,
    hud_tx: watch::Sender<HudSnapshot>,
    tick_period: Duration,
    status: TrackingStatus,
}

impl<P, H> Tracker<P, H>
where
    P: LocationProvider,
    H: HapticActuator,
{
    /// Create a tracker and its handle
    pub fn new(
        session: Session,
        provider: P,
        haptics: H,
        tick_period: Duration,
    ) -> (Self, TrackerHandle) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let status = TrackingStatus::Idle;
        let (hud_tx, hud_rx) = watch::channel(session.hud(status.clone()));

        let tracker = Self {
            session,
            provider,
            haptics,
            command_rx,
            hud_tx,
            tick_period,
            status,
        };

        (tracker, TrackerHandle { command_tx, hud_rx })
    }

    /// Run until shutdown. Tracking starts immediately.
    pub async fn run(mut self) {
        let session_id = self.session.id();
        info!(session_id = %session_id, "Tracker started");

        let mut pending = Some(TrackerCommand::Retry);

        loop {
            match pending.take() {
                Some(TrackerCommand::Retry) => {
                    if let Some(fixes) = self.acquire().await {
                        match self.track(fixes).await {
                            TrackingExit::Idle => {}
                            TrackingExit::Restart => {
                                pending = Some(TrackerCommand::Retry);
                                continue;
                            }
                            TrackingExit::Shutdown => break,
                        }
                    }
                }
                Some(TrackerCommand::Shutdown) => break,
                Some(TrackerCommand::Stop) | None => {}
            }

            // Idle: only a command can restart tracking
            match self.command_rx.recv().await {
                Some(command) => pending = Some(command),
                None => break,
            }
        }

        if self.status != TrackingStatus::Idle {
            self.set_status(TrackingStatus::Idle);
        }
        info!(session_id = %session_id, "Tracker stopped");
    }

    /// Permission check, first fix and subscription
    async fn acquire(&mut self) -> Option<BoxStream<'static, LocationFix>> {
        self.session.on_tracking_lost();
        self.set_status(TrackingStatus::Acquiring);

        let mut permission = self.provider.permission_status().await;
        if permission == PermissionStatus::Denied {
            permission = self.provider.request_permission().await;
        }
        if permission == PermissionStatus::Denied {
            warn!(session_id = %self.session.id(), "Location permission denied");
            self.set_status(TrackingStatus::PermissionDenied);
            return None;
        }

        let first = match self.provider.current_position().await {
            Ok(fix) => fix,
            Err(e) => {
                self.fail(e);
                return None;
            }
        };

        let fixes = match self.provider.subscribe() {
            Ok(fixes) => fixes,
            Err(e) => {
                self.fail(e);
                return None;
            }
        };

        info!(session_id = %self.session.id(), "Tracking started");
        self.status = TrackingStatus::Active;
        self.handle_fix(first);
        Some(fixes)
    }

    /// Active phase: fixes, ticks and commands until something ends it
    async fn track(&mut self, mut fixes: BoxStream<'static, LocationFix>) -> TrackingExit {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                fix = fixes.next() => match fix {
                    Some(fix) => self.handle_fix(fix),
                    None => {
                        let status = match self.provider.permission_status().await {
                            PermissionStatus::Denied => TrackingStatus::PermissionDenied,
                            PermissionStatus::Granted => TrackingStatus::LocationUnavailable(
                                ProviderError::StreamClosed.to_string(),
                            ),
                        };
                        warn!(session_id = %self.session.id(), ?status, "Location updates ended");
                        self.session.on_tracking_lost();
                        self.set_status(status);
                        return TrackingExit::Idle;
                    }
                },
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f64();
                    last_tick = now;

                    let events = self.session.tick(dt, unix_millis());
                    self.dispatch(events);
                    self.publish();
                },
                command = self.command_rx.recv() => {
                    self.session.on_tracking_lost();
                    return match command {
                        Some(TrackerCommand::Retry) => {
                            info!(session_id = %self.session.id(), "Restarting tracking");
                            TrackingExit::Restart
                        }
                        Some(TrackerCommand::Stop) => {
                            info!(session_id = %self.session.id(), "Tracking stopped");
                            self.set_status(TrackingStatus::Idle);
                            TrackingExit::Idle
                        }
                        Some(TrackerCommand::Shutdown) | None => TrackingExit::Shutdown,
                    };
                },
            }
        }
    }

    fn handle_fix(&mut self, fix: LocationFix) {
        let events = self
            .session
            .on_fix(fix.coordinate(), fix.timestamp_ms, unix_millis());
        self.dispatch(events);
        self.publish();
    }

    fn dispatch(&self, events: Vec<SessionEvent>) {
        let session_id = self.session.id();
        for event in events {
            match event {
                SessionEvent::HapticPulse { stage, style } => {
                    if let Err(e) = self.haptics.impact(style) {
                        debug!(session_id = %session_id, error = %e, "Haptic pulse failed");
                    } else {
                        debug!(session_id = %session_id, stage = stage.level(), "Haptic pulse");
                    }
                }
                SessionEvent::FixRejected { reason } => {
                    debug!(session_id = %session_id, %reason, "Fix rejected");
                }
                other => {
                    debug!(session_id = %session_id, event = ?other, "Session event");
                }
            }
        }
    }

    fn fail(&mut self, e: ProviderError) {
        let status = match e {
            ProviderError::PermissionDenied => TrackingStatus::PermissionDenied,
            other => TrackingStatus::LocationUnavailable(other.to_string()),
        };
        error!(session_id = %self.session.id(), ?status, "Failed to start tracking");
        self.set_status(status);
    }

    fn set_status(&mut self, status: TrackingStatus) {
        self.status = status;
        self.publish();
    }

    fn publish(&self) {
        self.hud_tx.send_replace(self.session.hud(self.status.clone()));
    }
}
