use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "choreo", about = "Procedural dance motion (BVH) from music")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<PathBuf>,

    /// Output BVH file
    #[arg(short, long, default_value = "output.bvh")]
    pub output: PathBuf,

    /// Dance style (auto, hip-hop, pop, jazz, ballet, house)
    #[arg(short, long, default_value = "auto")]
    pub style: String,

    /// Longest accepted clip, seconds
    #[arg(long, default_value_t = 30.0)]
    pub max_duration: f64,

    /// Largest accepted input file, megabytes
    #[arg(long, default_value_t = 10)]
    pub max_size_mb: usize,

    /// Also write a JSON summary next to the output
    #[arg(long)]
    pub metadata: bool,

    /// Config file (default: ./choreo.toml or ~/.config/choreo/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List available styles and exit
    #[arg(long)]
    pub list_styles: bool,

    /// Print a summary of an existing BVH file and exit
    #[arg(long, value_name = "BVH")]
    pub inspect: Option<PathBuf>,
}
