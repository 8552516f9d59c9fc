use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tp_core::{AudioOption, TrackChoice};

#[derive(Parser)]
#[command(name = "trackpick")]
#[command(author, version, about = "Rule-driven audio and subtitle track selection")]
pub struct Cli {
    /// Path to settings file (TOML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Path to preference rules (JSON), overriding the settings file
    #[arg(short, long, global = true)]
    pub rules: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match the preference rules against a track list
    Select {
        /// Track-list JSON file
        #[arg(short, long, required = true)]
        tracks: PathBuf,

        /// Only consider this audio track ("no" for no audio)
        #[arg(long)]
        audio: Option<TrackChoice>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Predict the audio track the player will choose by default
    Predict {
        /// Track-list JSON file
        #[arg(short, long, required = true)]
        tracks: PathBuf,

        /// Player audio option: auto, no or a track id
        #[arg(long, default_value = "auto")]
        aid: AudioOption,

        /// Preferred audio languages, highest priority first
        #[arg(long, value_delimiter = ',')]
        alang: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a track list through an in-memory player and show the writes
    Simulate {
        /// Track-list JSON file
        #[arg(short, long, required = true)]
        tracks: PathBuf,

        /// Player audio option: auto, no or a track id
        #[arg(long, default_value = "auto")]
        aid: AudioOption,

        /// Preferred audio languages, highest priority first
        #[arg(long, value_delimiter = ',')]
        alang: Vec<String>,

        /// Select after playback starts instead of before
        #[arg(long)]
        no_preload: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a preference rules file
    Validate {
        /// Rules file to validate (uses settings if not specified)
        rules: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
