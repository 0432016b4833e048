//! Sector definitions and the wheel they form.
//!
//! The sector set is supplied by the backend's wheel configuration and is
//! immutable once a spin session starts.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// One labeled wedge of the wheel.
///
/// `weight` mirrors the backend's draw weighting and is display-only on the
/// client; the weighted draw itself is owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub index: usize,
    pub label: String,
    pub weight: f64,
    /// Palette slot for rendering
    pub color_index: u8,
}

/// One `{ name, chance }` entry of the backend's wheel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfigItem {
    pub name: String,
    #[serde(default)]
    pub chance: f64,
}

/// Ordered, non-empty set of equal-span sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorWheel {
    sectors: Vec<Sector>,
}

impl SectorWheel {
    /// Number of palette slots available to `color_index` assignment
    pub const PALETTE_SIZE: u8 = 10;

    /// Build a wheel from ordered labels, all equally weighted.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, WheelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sectors: Vec<Sector> = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| Sector {
                index,
                label: label.into(),
                weight: 1.0,
                color_index: (index % Self::PALETTE_SIZE as usize) as u8,
            })
            .collect();
        Self::validate(sectors)
    }

    /// Build a wheel from the backend's `/admin/wheel-config` items,
    /// preserving their order.
    pub fn from_config_items(items: &[WheelConfigItem]) -> Result<Self, WheelError> {
        let sectors: Vec<Sector> = items
            .iter()
            .enumerate()
            .map(|(index, item)| Sector {
                index,
                label: item.name.clone(),
                weight: item.chance,
                color_index: (index % Self::PALETTE_SIZE as usize) as u8,
            })
            .collect();
        Self::validate(sectors)
    }

    fn validate(sectors: Vec<Sector>) -> Result<Self, WheelError> {
        if sectors.is_empty() {
            return Err(WheelError::Empty);
        }
        if sectors.iter().any(|s| s.label.is_empty()) {
            return Err(WheelError::BlankLabel);
        }
        Ok(Self { sectors })
    }

    /// Number of sectors.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Angular span of each sector in radians.
    pub fn span(&self) -> f64 {
        TAU / self.sectors.len() as f64
    }

    pub fn get(&self, index: usize) -> Option<&Sector> {
        self.sectors.get(index)
    }

    /// Find a sector by its exact label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.sectors.iter().position(|s| s.label == label)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }
}

/// Wheel construction errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WheelError {
    #[error("wheel has no sectors")]
    Empty,
    #[error("wheel contains a sector with a blank label")]
    BlankLabel,
}
