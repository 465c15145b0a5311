// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-pipeline")]
#[command(about = "Frame pipeline demo driven by a synthetic source")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream test pattern frames through the pipeline
    Stream {
        /// Source frame width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Source frame height
        #[arg(long, default_value = "720")]
        height: u32,

        /// Output frame width
        #[arg(long, default_value = "640")]
        output_width: u32,

        /// Output frame height
        #[arg(long, default_value = "480")]
        output_height: u32,

        /// Source frame rate
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Streaming duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// Process a single frame and save it as a PNG
    Snapshot {
        /// Source frame width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Source frame height
        #[arg(long, default_value = "720")]
        height: u32,

        /// Output frame width
        #[arg(long, default_value = "640")]
        output_width: u32,

        /// Output frame height
        #[arg(long, default_value = "480")]
        output_height: u32,

        /// Sensor orientation in degrees (0, 90, 180, 270)
        #[arg(short, long, default_value = "0")]
        rotation: i32,

        /// Use the front-facing (mirrored) orientation rules
        #[arg(long)]
        front: bool,

        /// Output file path (default: frame_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_pipeline=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stream {
            width,
            height,
            output_width,
            output_height,
            fps,
            duration,
        } => cli::stream(width, height, output_width, output_height, fps, duration),
        Commands::Snapshot {
            width,
            height,
            output_width,
            output_height,
            rotation,
            front,
            output,
        } => cli::snapshot(
            width,
            height,
            output_width,
            output_height,
            rotation,
            front,
            output,
        ),
    }
}
