//! Prize Wheel Client Engine
//!
//! A server-resolved prize wheel: the backend performs the weighted draw,
//! while this crate runs the client-side convergence animation - a
//! tick-driven state machine that starts an open-ended spin before the
//! outcome is known, receives it asynchronously mid-flight, and decelerates
//! to rest with the needle exactly on the winning sector.
//!
//! # Features
//!
//! - `http` - reqwest-backed outcome resolver and wheel-config client
//!   (enabled by default)

pub mod config;
pub mod net;
pub mod session;
pub mod util;
pub mod wheel;
