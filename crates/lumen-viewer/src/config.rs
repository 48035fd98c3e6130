//! Viewer configuration: TOML file plus command-line overrides.
//!
//! Every table is optional; missing keys take their defaults and unknown keys
//! are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use lumen_engine::input::{Key, ToggleBindings};
use lumen_engine::post::FxaaTunables;

/// Shipped FXAA program.
pub const DEFAULT_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fxaa.wgsl");

/// Source image looked up when none is configured.
pub const DEFAULT_IMAGE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/TestImage.png");

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub assets: AssetsConfig,
    pub fxaa: FxaaTunables,
    pub input: InputConfig,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    /// Output resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen FXAA viewer".to_string(),
            width: 1200,
            height: 700,
            vsync: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub image: PathBuf,
    pub shader: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from(DEFAULT_IMAGE),
            shader: PathBuf::from(DEFAULT_SHADER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub toggle_aa: String,
    pub toggle_sub_mode: String,
    /// Start with antialiasing enabled.
    pub aa_enabled: bool,
    /// Start in the PC-quality sub-mode instead of console.
    pub quality: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            toggle_aa: "F".to_string(),
            toggle_sub_mode: "G".to_string(),
            aa_enabled: false,
            quality: false,
        }
    }
}

impl InputConfig {
    pub fn bindings(&self) -> Result<ToggleBindings> {
        let parse = |field: &str, name: &str| {
            Key::from_name(name).with_context(|| format!("[input] {field}: unknown key `{name}`"))
        };
        let bindings = ToggleBindings {
            toggle_aa: parse("toggle_aa", &self.toggle_aa)?,
            toggle_sub_mode: parse("toggle_sub_mode", &self.toggle_sub_mode)?,
        };
        anyhow::ensure!(
            bindings.toggle_aa != bindings.toggle_sub_mode,
            "[input] toggle_aa and toggle_sub_mode are both bound to {}",
            bindings.toggle_aa
        );
        anyhow::ensure!(
            bindings.toggle_aa != Key::Escape && bindings.toggle_sub_mode != Key::Escape,
            "[input] Escape is reserved for exit"
        );
        Ok(bindings)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// RGBA, linear 0..1.
    pub clear_color: [f64; 4],
    /// Top-left corner of the source image in target pixels.
    pub image_position: [f32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            image_position: [0.0, 0.0],
        }
    }
}

impl SceneConfig {
    pub fn clear(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `env_logger` filter; falls back to `RUST_LOG`.
    pub filter: Option<String>,
    /// Frame-rate report period.
    pub report_interval_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            report_interval_ms: 1000,
        }
    }
}

impl LoggingConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

impl ViewerConfig {
    /// Reads `path`, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                Self::from_toml(&text).with_context(|| format!("invalid config {}", p.display()))?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.window.width > 0 && self.window.height > 0,
            "[window] resolution must be non-zero (got {}x{})",
            self.window.width,
            self.window.height
        );
        self.fxaa.validate().context("[fxaa]")?;
        self.input.bindings()?;
        anyhow::ensure!(
            self.scene.clear_color.iter().all(|c| c.is_finite()),
            "[scene] clear_color must be finite"
        );
        anyhow::ensure!(
            self.scene.image_position.iter().all(|c| c.is_finite()),
            "[scene] image_position must be finite"
        );
        anyhow::ensure!(self.logging.report_interval_ms > 0, "[logging] report_interval_ms must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = ViewerConfig::from_toml("").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!((cfg.window.width, cfg.window.height), (1200, 700));
        assert!(!cfg.window.vsync);
        assert_eq!(cfg.fxaa, FxaaTunables::default());
        assert_eq!(cfg.input.bindings().unwrap(), ToggleBindings::default());
        assert!(cfg.assets.shader.ends_with("assets/fxaa.wgsl"));
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(ViewerConfig::load(None).unwrap(), ViewerConfig::default());
    }

    #[test]
    fn shipped_shader_exists() {
        assert!(Path::new(DEFAULT_SHADER).is_file());
    }

    // ── overrides ─────────────────────────────────────────────────────────

    #[test]
    fn tables_override_fields() {
        let cfg = ViewerConfig::from_toml(
            r#"
            [window]
            width = 800
            height = 600

            [fxaa]
            edge_sharpness = 4.0
            subpixel_blend = 1.0

            [input]
            toggle_aa = "Space"
            aa_enabled = true

            [scene]
            image_position = [16.0, 32.0]

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();

        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
        assert_eq!(cfg.window.title, WindowConfig::default().title);
        assert_eq!(cfg.fxaa.edge_sharpness, 4.0);
        assert_eq!(cfg.fxaa.subpixel_blend, 1.0);
        assert_eq!(cfg.fxaa.console_edge_threshold, 0.125);
        assert_eq!(cfg.input.bindings().unwrap().toggle_aa, Key::Space);
        assert!(cfg.input.aa_enabled);
        assert_eq!(cfg.scene.image_position, [16.0, 32.0]);
        assert_eq!(cfg.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumen.toml");
        std::fs::write(&path, "[window]\ntitle = \"bench\"\n").unwrap();

        let cfg = ViewerConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.window.title, "bench");
    }

    // ── rejection ─────────────────────────────────────────────────────────

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ViewerConfig::from_toml("[window]\nfullscreen = true\n").is_err());
        assert!(ViewerConfig::from_toml("[fxaa]\nedge_sharpnes = 2.0\n").is_err());
        assert!(ViewerConfig::from_toml("[postfx]\n").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ViewerConfig::from_toml("[window]\nwidth = 0\n").is_err());
        assert!(ViewerConfig::from_toml("[fxaa]\nsubpixel_blend = -0.5\n").is_err());
        assert!(ViewerConfig::from_toml("[input]\ntoggle_aa = \"Hyper\"\n").is_err());
        assert!(ViewerConfig::from_toml("[input]\ntoggle_aa = \"G\"\n").is_err());
        assert!(ViewerConfig::from_toml("[logging]\nreport_interval_ms = 0\n").is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }
}
