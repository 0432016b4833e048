//! Spin session controller.
//!
//! Top-level orchestrator: enforces "one spin in flight", runs the resolver
//! concurrently with the animation, and forwards its result into the engine
//! only when it belongs to the currently active session. All mutation of
//! the session happens on the tick path; the resolver task only parks its
//! result in a slot that the next tick drains.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::net::resolver::{OutcomeResolver, ResolveError};
use crate::wheel::engine::{
    OutcomeResolution, SessionId, SpinEngine, SpinError, SpinEvent, SpinPhase, SpinSnapshot,
    SpinTuning,
};
use crate::wheel::sectors::SectorWheel;

/// Resolver task output, parked until the next tick drains it
#[derive(Debug)]
pub struct SpinResolution {
    pub session_id: SessionId,
    pub outcome: Result<String, ResolveError>,
}

/// Events surfaced to the embedding UI shell
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { from: SpinPhase, to: SpinPhase },
    /// The deceleration target is committed
    OutcomeLocked { label: String, fallback: bool },
    /// The only externally observable completion signal; emitted once
    Finished { label: String },
}

/// Sound side channel driven off session events.
///
/// The controller owns the cue lifecycle; playback belongs to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Begin the looping tick sound
    StartTicking,
    /// Stop and rewind the looping tick sound
    StopTicking,
}

/// Cue for one session event, if any.
pub fn audio_cue(event: &SessionEvent) -> Option<AudioCue> {
    match event {
        SessionEvent::PhaseChanged {
            to: SpinPhase::Accelerating,
            ..
        } => Some(AudioCue::StartTicking),
        SessionEvent::Finished { .. } => Some(AudioCue::StopTicking),
        _ => None,
    }
}

/// One-spin-at-a-time session controller.
pub struct SpinController<R: OutcomeResolver> {
    engine: SpinEngine,
    resolver: Arc<R>,
    /// Completed resolutions awaiting the next tick. Stale entries are
    /// filtered by session id when drained.
    pending: Arc<Mutex<Vec<SpinResolution>>>,
    /// Events produced outside a tick (session start), delivered with the
    /// next tick's batch
    queued: Vec<SessionEvent>,
    last_winner: Option<String>,
}

impl<R: OutcomeResolver> SpinController<R> {
    pub fn new(wheel: SectorWheel, tuning: SpinTuning, resolver: Arc<R>) -> Self {
        Self {
            engine: SpinEngine::new(wheel, tuning),
            resolver,
            pending: Arc::new(Mutex::new(Vec::new())),
            queued: Vec::new(),
            last_winner: None,
        }
    }

    /// Begin a new spin session.
    ///
    /// Starts the animation and the outcome request concurrently. Fails
    /// with [`SpinError::SessionInProgress`] while a session is active;
    /// the active session is unaffected.
    pub fn start_spin(&mut self) -> Result<SessionId, SpinError> {
        let session_id = SessionId::new_v4();
        let events = self.engine.start(session_id)?;

        self.last_winner = None;
        let mapped: Vec<SessionEvent> = events.into_iter().map(|e| self.map_event(e)).collect();
        self.queued.extend(mapped);

        let resolver = self.resolver.clone();
        let slot = self.pending.clone();
        tokio::spawn(async move {
            let outcome = resolver.request_outcome(session_id).await;
            slot.lock().push(SpinResolution {
                session_id,
                outcome,
            });
        });

        info!(%session_id, "spin session started");
        Ok(session_id)
    }

    /// Advance the session by `dt` seconds.
    ///
    /// Drains resolver results first so a tick always sees the latest
    /// resolution state, then steps the engine.
    pub fn tick(&mut self, dt: f64) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.queued);

        self.drain_resolutions();

        let engine_events = self.engine.tick(dt);
        for event in engine_events {
            let mapped = self.map_event(event);
            if let SessionEvent::Finished { label } = &mapped {
                self.last_winner = Some(label.clone());
                info!(winner = %label, "spin finished");
            }
            events.push(mapped);
        }
        events
    }

    /// Render-ready view of the active session.
    pub fn snapshot(&self) -> SpinSnapshot {
        self.engine.snapshot()
    }

    pub fn phase(&self) -> SpinPhase {
        self.engine.phase()
    }

    pub fn wheel(&self) -> &SectorWheel {
        self.engine.wheel()
    }

    /// Winning label of the most recently settled session.
    pub fn last_winner(&self) -> Option<&str> {
        self.last_winner.as_deref()
    }

    /// Abandon the active session. Late resolver results for it will be
    /// discarded by the session-id guard.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.pending.lock().clear();
        self.queued.clear();
    }

    fn drain_resolutions(&mut self) {
        let drained: Vec<SpinResolution> = self.pending.lock().drain(..).collect();
        for resolution in drained {
            if Some(resolution.session_id) != self.engine.session_id() {
                debug!(
                    resolution_session = %resolution.session_id,
                    "discarding resolution from superseded session"
                );
                continue;
            }
            match resolution.outcome {
                Ok(label) => match self.engine.wheel().index_of(&label) {
                    Some(sector) => {
                        self.engine.resolve(OutcomeResolution {
                            session_id: resolution.session_id,
                            sector,
                        });
                    }
                    None => {
                        let err = ResolveError::UnknownLabel(label);
                        warn!(%err, "resolver produced an unusable outcome");
                        self.engine.resolve_failed(resolution.session_id);
                    }
                },
                Err(err) => {
                    warn!(%err, "resolver failed");
                    self.engine.resolve_failed(resolution.session_id);
                }
            }
        }
    }

    fn map_event(&self, event: SpinEvent) -> SessionEvent {
        match event {
            SpinEvent::PhaseChanged { from, to } => SessionEvent::PhaseChanged { from, to },
            SpinEvent::OutcomeLocked { sector, fallback } => SessionEvent::OutcomeLocked {
                label: self.label_of(sector),
                fallback,
            },
            SpinEvent::Finished { sector } => SessionEvent::Finished {
                label: self.label_of(sector),
            },
        }
    }

    fn label_of(&self, sector: usize) -> String {
        self.engine
            .wheel()
            .get(sector)
            .map(|s| s.label.clone())
            .unwrap_or_default()
    }
}
