use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Posture analysis for videos and still images", long_about = None)]
pub struct Args {
    /// Analysis config file (default: ~/.posture_pro/config/settings.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze every 15th frame of a video file
    Video {
        path: PathBuf,
    },

    /// Analyze a single image
    Image {
        path: PathBuf,
    },

    /// Run the pose estimator on a blank frame
    Health,

    /// Print supported formats and limits
    Stats,
}
