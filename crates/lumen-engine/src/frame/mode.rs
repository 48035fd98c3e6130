//! Antialiasing mode state and the per-frame path decision.
//!
//! Everything here is plain data; the GPU side lives in `FrameController`.

use std::fmt;

use crate::input::ToggleSignals;
use crate::post::{compute, FxaaTunables, ParameterBundle, SubMode, Technique};

/// Effective antialiasing mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AaMode {
    Off,
    ConsoleQuality,
    PcQuality,
}

impl fmt::Display for AaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AaMode::Off => "off",
            AaMode::ConsoleQuality => "FXAA console",
            AaMode::PcQuality => "FXAA PC quality",
        })
    }
}

/// The two independent switches behind `AaMode`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AaState {
    pub enabled: bool,
    pub sub_mode: SubMode,
}

impl AaState {
    pub fn mode(self) -> AaMode {
        match (self.enabled, self.sub_mode) {
            (false, _) => AaMode::Off,
            (true, SubMode::Console) => AaMode::ConsoleQuality,
            (true, SubMode::Quality) => AaMode::PcQuality,
        }
    }

    /// Applies this frame's toggle events. Returns true if anything changed.
    pub fn apply(&mut self, signals: ToggleSignals) -> bool {
        if signals.toggle_aa {
            self.enabled = !self.enabled;
        }
        if signals.toggle_sub_mode {
            self.sub_mode = self.sub_mode.toggled();
        }
        signals.toggle_aa || signals.toggle_sub_mode
    }
}

/// Requested mode paired with whether a program can honour it; displays what
/// actually reaches the screen.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EffectiveMode {
    pub requested: AaMode,
    pub program_available: bool,
}

impl EffectiveMode {
    pub fn mode(self) -> AaMode {
        if self.program_available { self.requested } else { AaMode::Off }
    }
}

impl fmt::Display for EffectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.requested, self.program_available) {
            (AaMode::Off, _) | (_, true) => fmt::Display::fmt(&self.requested, f),
            (requested, false) => write!(f, "off (no program; {requested} requested)"),
        }
    }
}

/// Why a frame skipped post-processing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlitReason {
    AaOff,
    ProgramUnavailable,
    InvalidViewport,
}

/// Branch taken by one frame after the scene pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FramePath {
    PostProcess { technique: Technique, bundle: ParameterBundle },
    DirectBlit { reason: BlitReason },
}

impl FramePath {
    pub fn is_post_process(&self) -> bool {
        matches!(self, FramePath::PostProcess { .. })
    }
}

/// Decides the frame path from mode, program availability, size and tunables.
pub fn decide(
    state: AaState,
    program_available: bool,
    width: u32,
    height: u32,
    tunables: &FxaaTunables,
) -> FramePath {
    if !state.enabled {
        return FramePath::DirectBlit { reason: BlitReason::AaOff };
    }
    if !program_available {
        return FramePath::DirectBlit { reason: BlitReason::ProgramUnavailable };
    }
    match compute(state.sub_mode, width, height, tunables) {
        Ok(bundle) => FramePath::PostProcess {
            technique: state.sub_mode.technique(),
            bundle,
        },
        // `compute` only rejects zero dimensions.
        Err(_) => FramePath::DirectBlit { reason: BlitReason::InvalidViewport },
    }
}
