/// Spin profile constants - the acceleration/cruise/deceleration envelope
pub mod spin {
    /// Cruise angular velocity in radians per second (~1.75 turns/s)
    pub const MAX_SPEED: f64 = 11.0;
    /// Velocity ramp duration in seconds (half-sine ease from 0 to MAX_SPEED)
    pub const RAMP_TIME: f64 = 0.9;
    /// Minimum cruise duration in seconds before deceleration may begin
    /// (plausibility floor: several full turns even on an instant resolve)
    pub const MIN_CRUISE_TIME: f64 = 1.2;
    /// Ceiling on waiting for the resolver, measured from ramp end.
    /// Past this the fallback sector is installed so the spin always ends.
    pub const RESOLVE_TIMEOUT: f64 = 8.0;
    /// Deceleration duration in seconds
    pub const DECEL_TIME: f64 = 3.2;
    /// Minimum whole extra turns added to the deceleration travel
    pub const MIN_EXTRA_TURNS: u32 = 2;
    /// Sector substituted when the resolver fails or times out
    pub const FALLBACK_SECTOR: usize = 0;
    /// Maximum deviation of the rest angle from the planned target (radians)
    pub const SETTLE_TOLERANCE: f64 = 1e-6;
}

/// Wheel layout constants
pub mod layout {
    use std::f64::consts::PI;

    /// Fixed needle position: top of the wheel under the clockwise-positive,
    /// y-down canvas convention
    pub const NEEDLE_ANGLE: f64 = 1.5 * PI;
    /// Safety margin on each sector edge, as a fraction of the sector span.
    /// Landing jitter never places the needle inside this band, so the
    /// pointed-at sector is unambiguous.
    pub const BOUNDARY_MARGIN_FRAC: f64 = 0.12;
    /// Wheel radius in layout units
    pub const WHEEL_RADIUS: f64 = 290.0;
    /// Hub (center button) radius in layout units
    pub const HUB_RADIUS: f64 = 30.0;
    /// Radial position of sector labels as a fraction of the wheel radius
    pub const LABEL_RADIUS_FRAC: f64 = 0.72;
}

/// Tick timing constants
pub mod timing {
    /// Client tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f64 = 1.0 / TICK_RATE as f64;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE as u64;
}
