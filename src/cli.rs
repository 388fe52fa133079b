// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::AnimationMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "scene-viewer")]
#[command(about = "Interactive glTF model viewer", long_about = None)]
pub struct Cli {
    /// Model file to load
    #[arg(default_value = "models/me.glb")]
    pub model: PathBuf,

    /// Animation behavior
    #[arg(long, value_enum, default_value = "wobble")]
    pub mode: AnimationMode,

    /// JSON file overriding the embedded tuning constants
    #[arg(long)]
    pub tuning: Option<PathBuf>,

    /// Disable the HUD overlay
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}
