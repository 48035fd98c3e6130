mod app;
mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use winit::dpi::PhysicalSize;

use lumen_engine::asset;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};

use crate::app::ViewerApp;
use crate::cli::Cli;
use crate::config::ViewerConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config)?;

    init_logging(LoggingConfig {
        env_filter: config.logging.filter.clone(),
        ..LoggingConfig::default()
    });

    // Missing assets degrade instead of aborting.
    let image = asset::load_image(&config.assets.image);
    let program = asset::load_program(&config.assets.shader);

    let runtime = RuntimeConfig {
        title: config.window.title.clone(),
        size: PhysicalSize::new(config.window.width, config.window.height),
        resizable: false,
    };
    let gpu_init = GpuInit::default().with_vsync(config.window.vsync);

    let app = ViewerApp::new(config, image, program)?;
    Runtime::run(runtime, gpu_init, app)
}
