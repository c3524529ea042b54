//! Active mode selection
//!
//! The page owns the mode and may change it at any time. The controller
//! holds a [`ModeReader`] onto the same cell and samples it once per frame,
//! so the frame loop never has to be reinstalled when the selection changes.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which environment the backdrop shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Office interior (Mode A)
    #[default]
    Workplace,
    /// Tower exterior (Mode B)
    Building,
}

impl Mode {
    /// Value the mode-blend scalar converges to while this mode is active
    pub fn blend_target(self) -> f32 {
        match self {
            Self::Workplace => 0.0,
            Self::Building => 1.0,
        }
    }

    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            Self::Workplace => Self::Building,
            Self::Building => Self::Workplace,
        }
    }

    /// Lowercase name used in settings and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workplace => "workplace",
            Self::Building => "building",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised mode name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mode '{0}', expected 'workplace' or 'building'")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workplace" | "a" => Ok(Self::Workplace),
            "building" | "b" => Ok(Self::Building),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Externally owned, continuously updated mode selection
#[derive(Debug, Default)]
pub struct ModeCell {
    value: Rc<Cell<Mode>>,
}

impl ModeCell {
    /// Create a cell holding `mode`
    pub fn new(mode: Mode) -> Self {
        Self {
            value: Rc::new(Cell::new(mode)),
        }
    }

    /// Change the selection; readers observe it on their next sample
    pub fn set(&self, mode: Mode) {
        let previous = self.value.replace(mode);
        if previous != mode {
            log::debug!("Mode selection changed: {previous} -> {mode}");
        }
    }

    /// Current selection
    pub fn get(&self) -> Mode {
        self.value.get()
    }

    /// Read-only view for the frame loop
    pub fn reader(&self) -> ModeReader {
        ModeReader {
            value: Rc::clone(&self.value),
        }
    }
}

/// Read-only handle onto a [`ModeCell`]
#[derive(Debug, Clone)]
pub struct ModeReader {
    value: Rc<Cell<Mode>>,
}

impl ModeReader {
    /// Latest selection
    pub fn get(&self) -> Mode {
        self.value.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_sees_latest_selection() {
        let cell = ModeCell::new(Mode::Workplace);
        let reader = cell.reader();
        assert_eq!(reader.get(), Mode::Workplace);
        cell.set(Mode::Building);
        assert_eq!(reader.get(), Mode::Building);
        cell.set(cell.get().toggled());
        assert_eq!(reader.get(), Mode::Workplace);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Building".parse::<Mode>(), Ok(Mode::Building));
        assert_eq!(" a ".parse::<Mode>(), Ok(Mode::Workplace));
        assert!("lobby".parse::<Mode>().is_err());
        assert_eq!(Mode::Building.to_string(), "building");
    }

    #[test]
    fn test_blend_targets() {
        assert_eq!(Mode::Workplace.blend_target(), 0.0);
        assert_eq!(Mode::Building.blend_target(), 1.0);
    }
}
