use crate::wheel::constants::timing;
use crate::wheel::engine::SpinTuning;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the wheel backend
    pub backend_url: String,
    /// Tick rate driving the animation loop (Hz)
    pub tick_rate: u32,
    /// Spin profile tuning
    pub tuning: SpinTuning,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            tick_rate: timing::TICK_RATE,
            tuning: SpinTuning::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("WHEEL_BACKEND_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.backend_url = url;
            } else {
                tracing::warn!("Invalid WHEEL_BACKEND_URL '{}', using default", url);
            }
        }

        if let Ok(rate) = std::env::var("TICK_RATE") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if (10..=240).contains(&parsed) {
                    config.tick_rate = parsed;
                } else {
                    tracing::warn!("TICK_RATE must be 10-240, using default");
                }
            } else {
                tracing::warn!("Invalid TICK_RATE '{}', using default", rate);
            }
        }

        if let Ok(timeout) = std::env::var("RESOLVE_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<f64>() {
                if parsed > 0.0 && parsed <= 60.0 {
                    config.tuning.resolve_timeout = parsed;
                } else {
                    tracing::warn!("RESOLVE_TIMEOUT_SECS must be 0-60, using default");
                }
            } else {
                tracing::warn!("Invalid RESOLVE_TIMEOUT_SECS '{}', using default", timeout);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.backend_url.is_empty() {
            return Err("backend_url cannot be empty".to_string());
        }
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.tuning.max_speed <= 0.0 {
            return Err("max_speed must be positive".to_string());
        }
        if self.tuning.ramp_time <= 0.0 || self.tuning.decel_time <= 0.0 {
            return Err("ramp_time and decel_time must be positive".to_string());
        }
        if self.tuning.resolve_timeout < self.tuning.min_cruise_time {
            return Err("resolve_timeout cannot be shorter than min_cruise_time".to_string());
        }
        Ok(())
    }

    /// Seconds per tick
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate as f64
    }
}
