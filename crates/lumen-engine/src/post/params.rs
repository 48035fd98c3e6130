//! FXAA parameter computation.
//!
//! `compute` turns viewport dimensions and tunables into the uniform bundle for
//! exactly one technique. It has no GPU dependencies and is fully deterministic.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

use super::program::Technique;

/// FXAA sub-mode: which of the two published algorithm variants runs.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SubMode {
    /// FXAA console variant (cheaper, sharper).
    #[default]
    Console,
    /// FXAA PC-quality variant (edge search + subpixel blend).
    Quality,
}

impl SubMode {
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            SubMode::Console => SubMode::Quality,
            SubMode::Quality => SubMode::Console,
        }
    }

    #[inline]
    pub fn technique(self) -> Technique {
        match self {
            SubMode::Console => Technique::Console,
            SubMode::Quality => Technique::Quality,
        }
    }
}

/// Tunable shader constants.
///
/// Every field can be overridden from the `[fxaa]` config table.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FxaaTunables {
    pub edge_sharpness: f32,
    pub console_edge_threshold: f32,
    pub console_edge_threshold_min: f32,
    pub subpixel_blend: f32,
    pub quality_edge_threshold: f32,
    pub quality_edge_threshold_min: f32,
}

impl Default for FxaaTunables {
    fn default() -> Self {
        Self {
            edge_sharpness: 8.0,
            console_edge_threshold: 0.125,
            console_edge_threshold_min: 0.05,
            subpixel_blend: 0.75,
            quality_edge_threshold: 0.166,
            quality_edge_threshold_min: 0.0833,
        }
    }
}

impl FxaaTunables {
    /// Rejects non-finite or negative values.
    pub fn validate(&self) -> anyhow::Result<()> {
        let fields = [
            ("edge_sharpness", self.edge_sharpness),
            ("console_edge_threshold", self.console_edge_threshold),
            ("console_edge_threshold_min", self.console_edge_threshold_min),
            ("subpixel_blend", self.subpixel_blend),
            ("quality_edge_threshold", self.quality_edge_threshold),
            ("quality_edge_threshold_min", self.quality_edge_threshold_min),
        ];
        for (name, v) in fields {
            anyhow::ensure!(v.is_finite() && v >= 0.0, "fxaa.{name} must be finite and >= 0 (got {v})");
        }
        anyhow::ensure!(
            self.subpixel_blend <= 1.0,
            "fxaa.subpixel_blend must be <= 1.0 (got {})",
            self.subpixel_blend
        );
        Ok(())
    }
}

/// Console variant parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConsoleParams {
    pub edge_sharpness: f32,
    pub edge_threshold: f32,
    pub edge_threshold_min: f32,
    /// `(-2/w, -2/h, 2/w, 2/h)`
    pub opt1: [f32; 4],
    /// `(8/w, 8/h, -4/w, -4/h)`
    pub opt2: [f32; 4],
}

/// PC-quality variant parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QualityParams {
    pub subpixel_blend: f32,
    pub edge_threshold: f32,
    pub edge_threshold_min: f32,
}

/// Variant-specific half of a bundle. Only one is ever populated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Variant {
    Console(ConsoleParams),
    Quality(QualityParams),
}

/// Uniform bundle for a single frame.
///
/// The source texture is not part of the bundle; it comes from the
/// `OffscreenSurface` handed to the post-process stage alongside it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParameterBundle {
    pub inv_width: f32,
    pub inv_height: f32,
    pub variant: Variant,
}

impl ParameterBundle {
    #[inline]
    pub fn sub_mode(&self) -> SubMode {
        match self.variant {
            Variant::Console(_) => SubMode::Console,
            Variant::Quality(_) => SubMode::Quality,
        }
    }
}

/// Computes the parameter bundle for `mode` at `width` x `height`.
pub fn compute(
    mode: SubMode,
    width: u32,
    height: u32,
    tunables: &FxaaTunables,
) -> Result<ParameterBundle, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidViewport { width, height });
    }

    let w = width as f32;
    let h = height as f32;

    let variant = match mode {
        SubMode::Console => Variant::Console(ConsoleParams {
            edge_sharpness: tunables.edge_sharpness,
            edge_threshold: tunables.console_edge_threshold,
            edge_threshold_min: tunables.console_edge_threshold_min,
            opt1: [-2.0 / w, -2.0 / h, 2.0 / w, 2.0 / h],
            opt2: [8.0 / w, 8.0 / h, -4.0 / w, -4.0 / h],
        }),
        SubMode::Quality => Variant::Quality(QualityParams {
            subpixel_blend: tunables.subpixel_blend,
            edge_threshold: tunables.quality_edge_threshold,
            edge_threshold_min: tunables.quality_edge_threshold_min,
        }),
    };

    Ok(ParameterBundle {
        inv_width: 1.0 / w,
        inv_height: 1.0 / h,
        variant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(w: u32, h: u32) -> ConsoleParams {
        match compute(SubMode::Console, w, h, &FxaaTunables::default()).unwrap().variant {
            Variant::Console(p) => p,
            other => panic!("expected console variant, got {other:?}"),
        }
    }

    fn round6(v: f32) -> f64 {
        (v as f64 * 1e6).round() / 1e6
    }

    // ── determinism ───────────────────────────────────────────────────────

    #[test]
    fn compute_is_bit_identical_across_calls() {
        let t = FxaaTunables::default();
        for (w, h) in [(1, 1), (640, 480), (1200, 700), (3840, 2160), (7, 13)] {
            for mode in [SubMode::Console, SubMode::Quality] {
                let a = compute(mode, w, h, &t).unwrap();
                let b = compute(mode, w, h, &t).unwrap();
                assert_eq!(a.inv_width.to_bits(), b.inv_width.to_bits());
                assert_eq!(a.inv_height.to_bits(), b.inv_height.to_bits());
                assert_eq!(a, b);
            }
        }
    }

    // ── console vectors ───────────────────────────────────────────────────

    #[test]
    fn console_vectors_match_formula_exactly() {
        for (w, h) in [(1200u32, 700u32), (1920, 1080), (3, 5)] {
            let p = console(w, h);
            let (wf, hf) = (w as f32, h as f32);
            assert_eq!(p.opt1, [-2.0 / wf, -2.0 / hf, 2.0 / wf, 2.0 / hf]);
            assert_eq!(p.opt2, [8.0 / wf, 8.0 / hf, -4.0 / wf, -4.0 / hf]);
        }
    }

    #[test]
    fn console_defaults_at_1200x700() {
        let p = console(1200, 700);
        assert_eq!(p.edge_sharpness, 8.0);
        assert_eq!(p.edge_threshold, 0.125);
        assert_eq!(p.edge_threshold_min, 0.05);

        let opt1: Vec<f64> = p.opt1.iter().map(|v| round6(*v)).collect();
        assert_eq!(opt1, vec![-0.001667, -0.002857, 0.001667, 0.002857]);
    }

    // ── quality ───────────────────────────────────────────────────────────

    #[test]
    fn quality_uses_quality_tunables() {
        let b = compute(SubMode::Quality, 1200, 700, &FxaaTunables::default()).unwrap();
        assert_eq!(b.sub_mode(), SubMode::Quality);
        let Variant::Quality(q) = b.variant else { panic!("expected quality variant") };
        assert_eq!(q.subpixel_blend, 0.75);
        assert_eq!(q.edge_threshold, 0.166);
        assert_eq!(q.edge_threshold_min, 0.0833);
    }

    #[test]
    fn overridden_tunables_flow_through() {
        let t = FxaaTunables { edge_sharpness: 4.0, subpixel_blend: 0.5, ..Default::default() };
        let Variant::Console(c) = compute(SubMode::Console, 10, 10, &t).unwrap().variant else {
            panic!("expected console variant")
        };
        assert_eq!(c.edge_sharpness, 4.0);
        let Variant::Quality(q) = compute(SubMode::Quality, 10, 10, &t).unwrap().variant else {
            panic!("expected quality variant")
        };
        assert_eq!(q.subpixel_blend, 0.5);
    }

    // ── inverse viewport ──────────────────────────────────────────────────

    #[test]
    fn inverse_size_is_mode_independent() {
        let t = FxaaTunables::default();
        for mode in [SubMode::Console, SubMode::Quality] {
            let b = compute(mode, 1200, 700, &t).unwrap();
            assert_eq!(b.inv_width, 1.0 / 1200.0f32);
            assert_eq!(b.inv_height, 1.0 / 700.0f32);
        }
    }

    // ── invalid input ─────────────────────────────────────────────────────

    #[test]
    fn zero_dimensions_are_rejected() {
        let t = FxaaTunables::default();
        assert_eq!(
            compute(SubMode::Console, 0, 700, &t),
            Err(PipelineError::InvalidViewport { width: 0, height: 700 })
        );
        assert_eq!(
            compute(SubMode::Quality, 1200, 0, &t),
            Err(PipelineError::InvalidViewport { width: 1200, height: 0 })
        );
    }

    #[test]
    fn tunables_validation() {
        assert!(FxaaTunables::default().validate().is_ok());
        let bad = FxaaTunables { edge_sharpness: f32::NAN, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = FxaaTunables { quality_edge_threshold: -0.1, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = FxaaTunables { subpixel_blend: 1.5, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn sub_mode_toggle_round_trip() {
        assert_eq!(SubMode::default(), SubMode::Console);
        assert_eq!(SubMode::Console.toggled().toggled(), SubMode::Console);
        assert_eq!(SubMode::Quality.technique(), Technique::Quality);
    }
}
