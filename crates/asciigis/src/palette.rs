//! Display colors and per-layer color assignment.
//!
//! A small fixed palette is split in two: chrome colors for the UI
//! (status, prompts, selection) and a cyclic range of map slots handed out
//! to vector layers. Assignment happens once per project load and is
//! stable until the next load; when there are more layers than slots the
//! range wraps and colors repeat.

use std::collections::HashMap;

use ratatui::style::Color;

use crate::project::NodeId;

/// Chrome colors reserved for the UI itself.
pub const STATUS_INFO: Color = Color::Green;
pub const STATUS_ALERT: Color = Color::Red;
pub const PROMPT: Color = Color::Cyan;
pub const PROMPT_RETRY: Color = Color::Yellow;
pub const TITLE_ACCENT: Color = Color::Yellow;
pub const SELECTION_FG: Color = Color::Black;
pub const SELECTION_BG: Color = Color::White;

/// Fallback when color mode is off.
pub const DEFAULT_MAP_COLOR: Color = Color::White;

/// The cyclic range handed out to layers, deliberately excluding the
/// chrome colors above so a layer never masquerades as an alert.
const MAP_COLORS: &[Color] = &[
    Color::Blue,
    Color::Magenta,
    Color::LightRed,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
    Color::White,
    Color::DarkGray,
];

/// Number of distinct map slots before colors wrap.
pub fn slot_count() -> usize {
    MAP_COLORS.len()
}

/// Concrete color for a palette slot. Slots wrap rather than fail.
pub fn slot_color(slot: u8) -> Color {
    MAP_COLORS[slot as usize % MAP_COLORS.len()]
}

/// Mapping from layer identity to palette slot, rebuilt on project load.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    slots: HashMap<NodeId, u8>,
}

impl ColorAssignment {
    pub fn slot(&self, id: NodeId) -> u8 {
        self.slots.get(&id).copied().unwrap_or(0)
    }

    pub fn color(&self, id: NodeId) -> Color {
        slot_color(self.slot(id))
    }
}

/// Assign a slot to every layer id, bottom layer first.
///
/// Walks the ids in the given order through the cyclic slot range, so the
/// same layer set always receives the same slots.
pub fn assign(layer_ids: &[NodeId]) -> ColorAssignment {
    let mut slots = HashMap::new();
    for (index, id) in layer_ids.iter().enumerate() {
        slots.insert(*id, (index % MAP_COLORS.len()) as u8);
    }
    ColorAssignment { slots }
}
