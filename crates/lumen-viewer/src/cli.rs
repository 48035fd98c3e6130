use std::path::PathBuf;

use clap::Parser;

use crate::config::ViewerConfig;

/// Offscreen render + FXAA viewer.
///
/// F toggles antialiasing, G switches between the console and PC-quality
/// variants, Escape exits.
#[derive(Debug, Parser)]
#[command(name = "lumen-viewer", version, about)]
pub struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Source image drawn by the scene pass.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// WGSL FXAA program.
    #[arg(long)]
    pub shader: Option<PathBuf>,

    /// Output width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start with antialiasing enabled.
    #[arg(long)]
    pub aa: bool,

    /// Present with vsync instead of as fast as possible.
    #[arg(long)]
    pub vsync: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file config.
    pub fn apply(&self, config: &mut ViewerConfig) -> anyhow::Result<()> {
        if let Some(image) = &self.image {
            config.assets.image = image.clone();
        }
        if let Some(shader) = &self.shader {
            config.assets.shader = shader.clone();
        }
        if let Some(w) = self.width {
            config.window.width = w;
        }
        if let Some(h) = self.height {
            config.window.height = h;
        }
        if self.aa {
            config.input.aa_enabled = true;
        }
        if self.vsync {
            config.window.vsync = true;
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["lumen-viewer", "--width", "640", "--shader", "custom.wgsl", "--aa"]);
        let mut cfg = ViewerConfig::default();
        cli.apply(&mut cfg).unwrap();

        assert_eq!((cfg.window.width, cfg.window.height), (640, 700));
        assert_eq!(cfg.assets.shader, PathBuf::from("custom.wgsl"));
        assert!(cfg.input.aa_enabled);
        assert!(!cfg.window.vsync);
    }

    #[test]
    fn zero_width_is_rejected() {
        let cli = Cli::parse_from(["lumen-viewer", "--width", "0"]);
        assert!(cli.apply(&mut ViewerConfig::default()).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
