use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaletteColor {
    Orange,
    Green,
    Blue,
    LightPurple,
    NavyBlue,
}

impl PaletteColor {
    pub fn hex(&self) -> &'static str {
        match self {
            PaletteColor::Orange => "#FF9500",
            PaletteColor::Green => "#34C759",
            PaletteColor::Blue => "#5AC8FA",
            PaletteColor::LightPurple => "#A5A6F6",
            PaletteColor::NavyBlue => "#1A2A56",
        }
    }
}

/// Assignment order of the palette.
pub const PALETTE: [PaletteColor; 5] = [
    PaletteColor::Orange,
    PaletteColor::Green,
    PaletteColor::Blue,
    PaletteColor::LightPurple,
    PaletteColor::NavyBlue,
];

/// Hands out palette colors round-robin in first-seen order of keys and
/// remembers them for the registry's lifetime.
///
/// One registry is shared by every surface so an event keeps its color
/// whichever view renders it.
pub struct ColorRegistry {
    inner: Mutex<HashMap<String, PaletteColor>>,
}

impl ColorRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn color_for(&self, key: &str) -> PaletteColor {
        let mut assigned = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(color) = assigned.get(key) {
            return *color;
        }
        let color = PALETTE[assigned.len() % PALETTE.len()];
        assigned.insert(key.to_string(), color);
        color
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
