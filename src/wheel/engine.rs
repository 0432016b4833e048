//! Spin convergence state machine.
//!
//! Owns the current rotation and angular velocity of one spin session and
//! runs the acceleration -> cruise -> deceleration profile. The spin starts
//! before the winning sector is known; the resolved outcome is installed
//! asynchronously and the engine decelerates onto it, snapping the final
//! tick exactly onto the precomputed terminal angle so floating error can
//! never land the needle on the wrong sector.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::util::angle;
use crate::wheel::constants::{layout, spin};
use crate::wheel::geometry::{self, TargetAngle};
use crate::wheel::sectors::SectorWheel;

/// Unique spin session identifier
pub type SessionId = Uuid;

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinPhase {
    /// No session active
    Idle,
    /// Velocity ramping up on a half-sine ease
    Accelerating,
    /// Constant speed; outcome may or may not have arrived yet
    Cruising,
    /// Plausibility floor passed, holding cruise speed for the outcome
    AwaitingOutcome,
    /// Easing onto the precomputed terminal angle
    Decelerating,
    /// At rest on the resolved sector
    Settled,
}

/// Spin profile tuning
#[derive(Debug, Clone)]
pub struct SpinTuning {
    /// Cruise angular velocity (radians/second)
    pub max_speed: f64,
    /// Acceleration ramp duration (seconds)
    pub ramp_time: f64,
    /// Minimum cruise duration before deceleration may begin (seconds)
    pub min_cruise_time: f64,
    /// Ceiling on waiting for the resolver, measured from ramp end (seconds)
    pub resolve_timeout: f64,
    /// Deceleration duration (seconds)
    pub decel_time: f64,
    /// Minimum whole turns added to the deceleration travel
    pub min_extra_turns: u32,
    /// Fixed needle position
    pub needle_angle: f64,
}

impl Default for SpinTuning {
    fn default() -> Self {
        Self {
            max_speed: spin::MAX_SPEED,
            ramp_time: spin::RAMP_TIME,
            min_cruise_time: spin::MIN_CRUISE_TIME,
            resolve_timeout: spin::RESOLVE_TIMEOUT,
            decel_time: spin::DECEL_TIME,
            min_extra_turns: spin::MIN_EXTRA_TURNS,
            needle_angle: layout::NEEDLE_ANGLE,
        }
    }
}

/// Outcome held by the engine for the active session.
///
/// Once installed it is never reassigned for that session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOutcome {
    pub sector: usize,
    /// True when this is the deterministic fallback rather than the
    /// backend's draw
    pub fallback: bool,
}

/// Single-use resolver result, keyed to the session that requested it.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeResolution {
    pub session_id: SessionId,
    pub sector: usize,
}

/// Events emitted by the engine during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinEvent {
    PhaseChanged { from: SpinPhase, to: SpinPhase },
    /// Deceleration target chosen; the rest of the spin is committed
    OutcomeLocked { sector: usize, fallback: bool },
    /// Terminal: the wheel is at rest on `sector`
    Finished { sector: usize },
}

/// Per-tick event list (rarely more than a phase change and a lock)
pub type SpinEvents = SmallVec<[SpinEvent; 4]>;

/// Spin errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpinError {
    #[error("a spin session is already in progress")]
    SessionInProgress,
}

/// Render-ready view of the engine state
#[derive(Debug, Clone, Serialize)]
pub struct SpinSnapshot {
    pub session_id: Option<SessionId>,
    pub phase: SpinPhase,
    /// Wheel rotation normalized into `[0, TAU)`
    pub rotation: f64,
    /// Radians per second
    pub angular_velocity: f64,
    /// Sector currently under the needle
    pub pointed_sector: usize,
    pub outcome: Option<ResolvedOutcome>,
}

#[derive(Debug, Clone)]
struct DecelPlan {
    start_angle: f64,
    target: TargetAngle,
    started_at: f64,
}

/// The spin convergence engine.
///
/// Tick-driven and runtime-agnostic: the host calls [`SpinEngine::tick`]
/// from whatever cooperative loop it runs (render callback, timer, or a
/// test harness stepping manually). The tick handler never blocks.
pub struct SpinEngine {
    tuning: SpinTuning,
    wheel: SectorWheel,
    phase: SpinPhase,
    session_id: Option<SessionId>,
    /// Seconds since `start()`
    elapsed: f64,
    /// Accumulated rotation, unbounded (monotonic while spinning)
    current_angle: f64,
    angular_velocity: f64,
    outcome: Option<ResolvedOutcome>,
    decel: Option<DecelPlan>,
}

impl SpinEngine {
    pub fn new(wheel: SectorWheel, tuning: SpinTuning) -> Self {
        Self {
            tuning,
            wheel,
            phase: SpinPhase::Idle,
            session_id: None,
            elapsed: 0.0,
            current_angle: 0.0,
            angular_velocity: 0.0,
            outcome: None,
            decel: None,
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Accumulated (unbounded) rotation
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn wheel(&self) -> &SectorWheel {
        &self.wheel
    }

    /// Begin a new session.
    ///
    /// The previous session's rest angle is carried over (normalized) so the
    /// wheel does not visually jump between spins.
    pub fn start(&mut self, session_id: SessionId) -> Result<SpinEvents, SpinError> {
        if !matches!(self.phase, SpinPhase::Idle | SpinPhase::Settled) {
            return Err(SpinError::SessionInProgress);
        }

        self.session_id = Some(session_id);
        self.elapsed = 0.0;
        self.current_angle = angle::normalize(self.current_angle);
        self.angular_velocity = 0.0;
        self.outcome = None;
        self.decel = None;

        let from = self.phase;
        self.phase = SpinPhase::Accelerating;
        debug!(%session_id, "spin session started");

        let mut events = SpinEvents::new();
        events.push(SpinEvent::PhaseChanged {
            from,
            to: SpinPhase::Accelerating,
        });
        Ok(events)
    }

    /// Install the resolved outcome for the active session.
    ///
    /// Returns false (and changes nothing) when the resolution belongs to a
    /// different session, an outcome is already held, deceleration has
    /// begun, or the sector index is off the wheel.
    pub fn resolve(&mut self, resolution: OutcomeResolution) -> bool {
        if self.session_id != Some(resolution.session_id) {
            debug!(
                resolution_session = %resolution.session_id,
                "discarding resolution for inactive session"
            );
            return false;
        }
        if self.outcome.is_some() {
            return false;
        }
        if matches!(
            self.phase,
            SpinPhase::Idle | SpinPhase::Decelerating | SpinPhase::Settled
        ) {
            return false;
        }
        if resolution.sector >= self.wheel.len() {
            warn!(sector = resolution.sector, "resolved sector index off the wheel");
            return false;
        }

        self.outcome = Some(ResolvedOutcome {
            sector: resolution.sector,
            fallback: false,
        });
        true
    }

    /// Install the deterministic fallback outcome after a resolver failure.
    ///
    /// Same guards as [`SpinEngine::resolve`]; the animation still
    /// terminates, it just no longer reflects the backend's draw.
    pub fn resolve_failed(&mut self, session_id: SessionId) -> bool {
        if self.session_id != Some(session_id) {
            debug!("discarding resolver failure for inactive session");
            return false;
        }
        if self.outcome.is_some()
            || matches!(
                self.phase,
                SpinPhase::Idle | SpinPhase::Decelerating | SpinPhase::Settled
            )
        {
            return false;
        }

        let sector = self.fallback_sector();
        warn!(sector, "resolver failed, using fallback sector");
        self.outcome = Some(ResolvedOutcome {
            sector,
            fallback: true,
        });
        true
    }

    /// Abandon the active session and return to `Idle`, keeping the rest
    /// angle.
    pub fn reset(&mut self) {
        self.phase = SpinPhase::Idle;
        self.session_id = None;
        self.outcome = None;
        self.decel = None;
        self.angular_velocity = 0.0;
        self.current_angle = angle::normalize(self.current_angle);
        self.elapsed = 0.0;
    }

    /// Advance the animation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> SpinEvents {
        let mut events = SpinEvents::new();
        if matches!(self.phase, SpinPhase::Idle | SpinPhase::Settled) {
            return events;
        }
        self.elapsed += dt;

        match self.phase {
            SpinPhase::Accelerating => {
                if self.elapsed >= self.tuning.ramp_time {
                    self.angular_velocity = self.tuning.max_speed;
                    self.transition(SpinPhase::Cruising, &mut events);
                } else {
                    let progress = self.elapsed / self.tuning.ramp_time;
                    self.angular_velocity = self.tuning.max_speed * (FRAC_PI_2 * progress).sin();
                }
                self.current_angle += self.angular_velocity * dt;
            }
            SpinPhase::Cruising | SpinPhase::AwaitingOutcome => {
                self.angular_velocity = self.tuning.max_speed;
                self.current_angle += self.angular_velocity * dt;

                let deadline = self.tuning.ramp_time + self.tuning.resolve_timeout;
                if self.outcome.is_none() && self.elapsed >= deadline {
                    let sector = self.fallback_sector();
                    warn!(sector, "resolver deadline passed, using fallback sector");
                    self.outcome = Some(ResolvedOutcome {
                        sector,
                        fallback: true,
                    });
                }

                let floor = self.tuning.ramp_time + self.tuning.min_cruise_time;
                if self.elapsed >= floor {
                    if self.phase == SpinPhase::Cruising {
                        self.transition(SpinPhase::AwaitingOutcome, &mut events);
                    }
                    if let Some(outcome) = self.outcome {
                        self.begin_deceleration(outcome, &mut events);
                    }
                }
            }
            SpinPhase::Decelerating => {
                self.advance_deceleration(&mut events);
            }
            SpinPhase::Idle | SpinPhase::Settled => unreachable!(),
        }

        events
    }

    /// Render-ready view of the current state.
    pub fn snapshot(&self) -> SpinSnapshot {
        SpinSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            rotation: angle::normalize(self.current_angle),
            angular_velocity: self.angular_velocity,
            pointed_sector: geometry::sector_at(
                self.current_angle,
                self.tuning.needle_angle,
                &self.wheel,
            ),
            outcome: self.outcome,
        }
    }

    fn fallback_sector(&self) -> usize {
        spin::FALLBACK_SECTOR.min(self.wheel.len() - 1)
    }

    fn begin_deceleration(&mut self, outcome: ResolvedOutcome, events: &mut SpinEvents) {
        // Travel the mirrored half-sine would cover entering at cruise
        // speed; the whole-turn count in target_angle_for tracks it so the
        // velocity hand-off jump stays under one turn's worth.
        let ideal_travel = 2.0 * self.tuning.max_speed * self.tuning.decel_time / PI;
        let target = geometry::target_angle_for(
            outcome.sector,
            &self.wheel,
            self.tuning.needle_angle,
            self.current_angle,
            ideal_travel,
            self.tuning.min_extra_turns,
            &mut rand::thread_rng(),
        );
        debug!(
            sector = outcome.sector,
            fallback = outcome.fallback,
            travel = target.travel,
            "deceleration target locked"
        );

        self.decel = Some(DecelPlan {
            start_angle: self.current_angle,
            target,
            started_at: self.elapsed,
        });
        events.push(SpinEvent::OutcomeLocked {
            sector: outcome.sector,
            fallback: outcome.fallback,
        });
        self.transition(SpinPhase::Decelerating, events);
    }

    fn advance_deceleration(&mut self, events: &mut SpinEvents) {
        let Some(plan) = self.decel.clone() else {
            return;
        };

        let progress = ((self.elapsed - plan.started_at) / self.tuning.decel_time).min(1.0);
        // Position-eased, not open-loop: every tick re-derives the angle
        // from the plan, so integration error cannot accumulate into an
        // overshoot.
        self.current_angle = plan.start_angle + plan.target.travel * (progress * FRAC_PI_2).sin();
        self.angular_velocity = plan.target.travel * FRAC_PI_2 / self.tuning.decel_time
            * (progress * FRAC_PI_2).cos();

        if progress >= 1.0 {
            self.current_angle = plan.target.target;
            self.angular_velocity = 0.0;
            self.decel = None;
            let sector = self
                .outcome
                .map(|o| o.sector)
                .unwrap_or_else(|| self.fallback_sector());
            self.transition(SpinPhase::Settled, events);
            events.push(SpinEvent::Finished { sector });
        }
    }

    fn transition(&mut self, to: SpinPhase, events: &mut SpinEvents) {
        let from = self.phase;
        self.phase = to;
        debug!(?from, ?to, "phase transition");
        events.push(SpinEvent::PhaseChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn test_wheel() -> SectorWheel {
        SectorWheel::from_labels(["Beer", "Wine", "Shot", "Water", "Cider", "Mead"]).unwrap()
    }

    /// Short profile so tests settle in a few hundred ticks
    fn fast_tuning() -> SpinTuning {
        SpinTuning {
            max_speed: 11.0,
            ramp_time: 0.2,
            min_cruise_time: 0.3,
            resolve_timeout: 1.0,
            decel_time: 0.5,
            min_extra_turns: 2,
            needle_angle: layout::NEEDLE_ANGLE,
        }
    }

    fn engine() -> SpinEngine {
        SpinEngine::new(test_wheel(), fast_tuning())
    }

    /// Tick until the predicate holds or `max_ticks` runs out, collecting
    /// every event.
    fn drive(
        engine: &mut SpinEngine,
        max_ticks: usize,
        mut until: impl FnMut(&SpinEngine) -> bool,
    ) -> Vec<SpinEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            events.extend(engine.tick(DT));
            if until(engine) {
                break;
            }
        }
        events
    }

    fn finished_sector(events: &[SpinEvent]) -> Option<usize> {
        events.iter().find_map(|e| match e {
            SpinEvent::Finished { sector } => Some(*sector),
            _ => None,
        })
    }

    #[test]
    fn test_start_rejected_while_in_flight() {
        let mut engine = engine();
        engine.start(SessionId::new_v4()).unwrap();
        let second = engine.start(SessionId::new_v4());
        assert!(matches!(second, Err(SpinError::SessionInProgress)));
        // The first session is unaffected
        assert_eq!(engine.phase(), SpinPhase::Accelerating);
    }

    #[test]
    fn test_full_phase_sequence() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        let mut events: Vec<SpinEvent> = engine.start(session).unwrap().to_vec();

        // Resolve mid-acceleration; the floor still applies
        engine.tick(DT);
        assert!(engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 2,
        }));

        events.extend(drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled));

        let phases: Vec<(SpinPhase, SpinPhase)> = events
            .iter()
            .filter_map(|e| match e {
                SpinEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                (SpinPhase::Idle, SpinPhase::Accelerating),
                (SpinPhase::Accelerating, SpinPhase::Cruising),
                (SpinPhase::Cruising, SpinPhase::AwaitingOutcome),
                (SpinPhase::AwaitingOutcome, SpinPhase::Decelerating),
                (SpinPhase::Decelerating, SpinPhase::Settled),
            ]
        );
        assert_eq!(finished_sector(&events), Some(2));
    }

    #[test]
    fn test_resolution_during_cruise_lands_on_it() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();

        // Tick past the ramp into cruise, then resolve "Beer" (index 0)
        drive(&mut engine, 20, |e| e.phase() == SpinPhase::Cruising);
        assert_eq!(engine.phase(), SpinPhase::Cruising);
        assert!(engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 0,
        }));

        let events = drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);
        assert_eq!(finished_sector(&events), Some(0));
        assert_eq!(engine.snapshot().pointed_sector, 0);
    }

    #[test]
    fn test_settled_rest_angle_alignment() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 4,
        });
        drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);

        assert_eq!(engine.angular_velocity(), 0.0);

        // The needle sits inside sector 4's span, clear of both boundaries
        let wheel = test_wheel();
        let span = wheel.span();
        let local = crate::util::angle::normalize(layout::NEEDLE_ANGLE - engine.current_angle());
        let offset = local - 4.0 * span;
        let margin = span * layout::BOUNDARY_MARGIN_FRAC;
        assert!(offset >= margin - spin::SETTLE_TOLERANCE);
        assert!(offset <= span - margin + spin::SETTLE_TOLERANCE);
    }

    #[test]
    fn test_network_failure_falls_back() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        drive(&mut engine, 20, |e| e.phase() == SpinPhase::Cruising);

        assert!(engine.resolve_failed(session));
        let events = drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);

        assert_eq!(finished_sector(&events), Some(spin::FALLBACK_SECTOR));
        assert!(events.iter().any(|e| matches!(
            e,
            SpinEvent::OutcomeLocked {
                fallback: true,
                ..
            }
        )));
    }

    #[test]
    fn test_resolver_timeout_bounds_duration() {
        let mut engine = engine();
        let tuning = fast_tuning();
        engine.start(SessionId::new_v4()).unwrap();

        // Never resolve; the deadline must force the fallback
        let ceiling = tuning.ramp_time + tuning.resolve_timeout + tuning.decel_time;
        let max_ticks = (ceiling / DT).ceil() as usize + 5;
        let events = drive(&mut engine, max_ticks, |e| e.phase() == SpinPhase::Settled);

        assert_eq!(engine.phase(), SpinPhase::Settled);
        assert_eq!(finished_sector(&events), Some(spin::FALLBACK_SECTOR));
    }

    #[test]
    fn test_stale_session_resolution_ignored() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        drive(&mut engine, 20, |e| e.phase() == SpinPhase::Cruising);

        assert!(!engine.resolve(OutcomeResolution {
            session_id: SessionId::new_v4(),
            sector: 3,
        }));
        assert!(engine.snapshot().outcome.is_none());

        // The real resolution still applies afterwards
        assert!(engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 3,
        }));
    }

    #[test]
    fn test_outcome_never_reassigned() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        assert!(engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 1,
        }));
        assert!(!engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 5,
        }));
        assert!(!engine.resolve_failed(session));

        let events = drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);
        assert_eq!(finished_sector(&events), Some(1));
    }

    #[test]
    fn test_late_resolution_after_decel_ignored() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 2,
        });
        drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Decelerating);

        assert!(!engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 5,
        }));
    }

    #[test]
    fn test_settled_is_terminal_without_start() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 1,
        });
        drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);

        let rest = engine.current_angle();
        for _ in 0..50 {
            assert!(engine.tick(DT).is_empty());
        }
        assert_eq!(engine.phase(), SpinPhase::Settled);
        assert_eq!(engine.current_angle(), rest);
    }

    #[test]
    fn test_rest_angle_carries_into_next_session() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 3,
        });
        drive(&mut engine, 2000, |e| e.phase() == SpinPhase::Settled);

        let rest = crate::util::angle::normalize(engine.current_angle());
        engine.start(SessionId::new_v4()).unwrap();
        assert!((engine.current_angle() - rest).abs() < 1e-12);
        assert_eq!(engine.phase(), SpinPhase::Accelerating);
        assert!(engine.snapshot().outcome.is_none());
    }

    #[test]
    fn test_angle_monotonic_while_spinning() {
        let mut engine = engine();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();
        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 5,
        });

        let mut last = engine.current_angle();
        for _ in 0..2000 {
            engine.tick(DT);
            assert!(engine.current_angle() >= last - 1e-12);
            last = engine.current_angle();
            if engine.phase() == SpinPhase::Settled {
                break;
            }
        }
        assert_eq!(engine.phase(), SpinPhase::Settled);
    }

    #[test]
    fn test_awaiting_outcome_parks_at_cruise_speed() {
        let mut engine = engine();
        let tuning = fast_tuning();
        let session = SessionId::new_v4();
        engine.start(session).unwrap();

        let floor_ticks = ((tuning.ramp_time + tuning.min_cruise_time) / DT).ceil() as usize + 2;
        drive(&mut engine, floor_ticks, |_| false);
        assert_eq!(engine.phase(), SpinPhase::AwaitingOutcome);
        assert_eq!(engine.angular_velocity(), tuning.max_speed);

        engine.resolve(OutcomeResolution {
            session_id: session,
            sector: 2,
        });
        let events = engine.tick(DT);
        assert!(events.iter().any(|e| matches!(
            e,
            SpinEvent::PhaseChanged {
                to: SpinPhase::Decelerating,
                ..
            }
        )));
    }

    #[test]
    fn test_reset_releases_session() {
        let mut engine = engine();
        engine.start(SessionId::new_v4()).unwrap();
        drive(&mut engine, 10, |_| false);

        engine.reset();
        assert_eq!(engine.phase(), SpinPhase::Idle);
        assert!(engine.session_id().is_none());
        assert!(engine.tick(DT).is_empty());

        // A fresh session can start immediately
        assert!(engine.start(SessionId::new_v4()).is_ok());
    }
}
