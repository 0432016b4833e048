//! Stateless render adapter.
//!
//! Maps an engine snapshot to a list of draw commands. The adapter knows
//! nothing about the platform surface; the embedding shell (canvas, GPU,
//! terminal) interprets the commands. Invoked once per tick and never
//! mutates the snapshot.

use serde::Serialize;

use crate::wheel::constants::layout::{
    HUB_RADIUS, LABEL_RADIUS_FRAC, NEEDLE_ANGLE, WHEEL_RADIUS,
};
use crate::wheel::engine::SpinSnapshot;
use crate::wheel::sectors::SectorWheel;

/// Wedge fill palette (0xRRGGBB), assigned by `color_index`
pub const PALETTE: [u32; 10] = [
    0xFF5733, 0x3498DB, 0x2ECC71, 0xF0B31A, 0x9B59B6, 0xE74C3C, 0x1ABC9C, 0xD35400, 0xC0392B,
    0x7F8C8D,
];

/// Static geometry of the drawn wheel
#[derive(Debug, Clone, Serialize)]
pub struct WheelLayout {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub hub_radius: f64,
    /// Fixed needle position (matches the engine's tuning)
    pub needle_angle: f64,
}

impl Default for WheelLayout {
    fn default() -> Self {
        Self {
            center_x: WHEEL_RADIUS,
            center_y: WHEEL_RADIUS,
            radius: WHEEL_RADIUS,
            hub_radius: HUB_RADIUS,
            needle_angle: NEEDLE_ANGLE,
        }
    }
}

/// One drawing instruction, in paint order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCmd {
    /// Filled sector wedge, angles already rotated by the wheel rotation
    Wedge {
        sector: usize,
        start_angle: f64,
        end_angle: f64,
        color: u32,
        highlighted: bool,
    },
    /// Divider line from the hub edge to the rim at `angle`
    Divider { angle: f64 },
    /// Sector label along the wedge bisector
    Label {
        sector: usize,
        text: String,
        angle: f64,
        radius: f64,
    },
    /// Center hub circle
    Hub { radius: f64 },
    /// Fixed needle at the layout's needle angle
    Needle { angle: f64 },
}

/// Produce the draw list for one frame.
pub fn render(snapshot: &SpinSnapshot, wheel: &SectorWheel, layout: &WheelLayout) -> Vec<DrawCmd> {
    let span = wheel.span();
    let mut cmds = Vec::with_capacity(wheel.len() * 3 + 2);

    for sector in wheel.sectors() {
        let start_angle = snapshot.rotation + sector.index as f64 * span;
        cmds.push(DrawCmd::Wedge {
            sector: sector.index,
            start_angle,
            end_angle: start_angle + span,
            color: PALETTE[sector.color_index as usize % PALETTE.len()],
            highlighted: sector.index == snapshot.pointed_sector,
        });
    }
    for sector in wheel.sectors() {
        let start_angle = snapshot.rotation + sector.index as f64 * span;
        cmds.push(DrawCmd::Divider { angle: start_angle });
        cmds.push(DrawCmd::Label {
            sector: sector.index,
            text: sector.label.clone(),
            angle: start_angle + span / 2.0,
            radius: layout.radius * LABEL_RADIUS_FRAC,
        });
    }
    cmds.push(DrawCmd::Hub {
        radius: layout.hub_radius,
    });
    cmds.push(DrawCmd::Needle {
        angle: layout.needle_angle,
    });

    cmds
}
