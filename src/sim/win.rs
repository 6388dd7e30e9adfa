//! Win detection
//!
//! Merges and splits report `target_reached`; the detector turns that into a
//! single win per puzzle instance.

use serde::{Deserialize, Serialize};

/// Fire-once latch over `target_reached` signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinDetector {
    fired: bool,
}

impl WinDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once: for the first reached signal since the last reset
    pub fn observe(&mut self, target_reached: bool) -> bool {
        if target_reached && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Arm for a new puzzle instance
    pub fn reset(&mut self) {
        self.fired = false;
    }
}
