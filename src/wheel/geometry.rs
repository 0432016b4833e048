//! Pure sector/angle mapping.
//!
//! The needle is fixed; the wheel rotates beneath it, so the pointed-at
//! sector is a function of wheel rotation and needle position. Inverse
//! lookups produce the terminal rotation for the deceleration plan.

use std::f64::consts::TAU;

use rand::Rng;

use crate::util::angle;
use crate::wheel::constants::layout;
use crate::wheel::sectors::SectorWheel;

/// Terminal rotation produced by [`target_angle_for`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetAngle {
    /// Absolute (unbounded) rotation the wheel must come to rest at
    pub target: f64,
    /// Forward distance from the current rotation to `target`
    pub travel: f64,
}

/// Sector currently under the needle for a wheel rotated by `rotation`.
pub fn sector_at(rotation: f64, needle_angle: f64, wheel: &SectorWheel) -> usize {
    let local = angle::normalize(needle_angle - rotation);
    let index = (local / wheel.span()) as usize;
    // local == TAU is unreachable after normalize, but float division can
    // still round up to len at the seam
    index.min(wheel.len() - 1)
}

/// Terminal rotation that parks `sector` under the needle.
///
/// The landing point is jittered inside the sector span minus a safety
/// margin on each edge, so the rest angle is never ambiguous between two
/// sectors. Whole turns are added: at least `min_extra_turns`, and as many
/// as bring the total travel closest to `ideal_travel` so the deceleration
/// hand-off stays smooth.
pub fn target_angle_for<R: Rng>(
    sector_index: usize,
    wheel: &SectorWheel,
    needle_angle: f64,
    current_angle: f64,
    ideal_travel: f64,
    min_extra_turns: u32,
    rng: &mut R,
) -> TargetAngle {
    let span = wheel.span();
    let margin = span * layout::BOUNDARY_MARGIN_FRAC;
    let usable = span - 2.0 * margin;
    // Degenerate margins (usable <= 0) collapse to the sector midpoint
    let offset = if usable > 0.0 {
        margin + rng.gen_range(0.0..usable)
    } else {
        span * 0.5
    };

    let local = sector_index as f64 * span + offset;
    let desired = angle::normalize(needle_angle - local);
    let base = angle::forward_distance(current_angle, desired);

    let mut turns = min_extra_turns as f64;
    if ideal_travel > base + turns * TAU {
        turns = turns.max(((ideal_travel - base) / TAU).round());
    }

    let travel = base + turns * TAU;
    TargetAngle {
        target: current_angle + travel,
        travel,
    }
}
