use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imageforge")]
#[command(author, version, about = "AI image studio with a persistent gallery")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server with the web UI and JSON API
    Start {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate an image from a text prompt
    Generate {
        /// Text prompt describing the image
        #[arg(required = true)]
        prompt: String,

        /// Aspect ratio, e.g. 1:1 or 16:9
        #[arg(short, long, default_value = "1:1")]
        aspect_ratio: String,

        /// Write the image to this file (defaults to generated.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the image to the gallery
        #[arg(long)]
        save: bool,
    },

    /// Manage the image gallery
    Gallery {
        #[command(subcommand)]
        command: GalleryCommands,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum GalleryCommands {
    /// List saved images, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save an image file to the gallery
    Add {
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Delete a saved image
    Remove {
        id: String,
    },

    /// Write a saved image to a file
    Export {
        id: String,

        #[arg(short, long, required = true)]
        output: PathBuf,
    },
}
