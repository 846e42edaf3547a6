use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wallkeeper")]
#[command(about = "Keep a curated wallpaper folder in sync with your pictures", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Source picture library (defaults to ~/Pictures)
    #[arg(long, global = true)]
    pub source_root: Option<PathBuf>,

    /// Wallpaper folder (defaults to <source-root>/CustomWallpapers)
    #[arg(long, global = true)]
    pub derived_root: Option<PathBuf>,

    /// Ask before adding or removing each wallpaper
    #[arg(long, short, global = true)]
    pub interactive: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the classification of each path
    Classify {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the menu actions offered for a selection
    Menu {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print whether the wallpaper overlay is shown for a path
    Overlay { path: PathBuf },
    /// List wallpapers currently in the wallpaper folder
    List,
    /// Add pictures to the wallpaper folder
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove the wallpapers made from these pictures
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Reveal the source pictures of these wallpapers
    Locate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print configuration values
    PrintConfig,
}
