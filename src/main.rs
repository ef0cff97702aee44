mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod motion;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cli::Cli;
use motion::style::Style;
use pipeline::{GenerateOptions, GenerationReport, Stage};

/// JSON sidecar written with `--metadata`.
#[derive(Serialize)]
struct Metadata<'a> {
    input: String,
    output: String,
    #[serde(flatten)]
    report: &'a GenerationReport,
    generation_seconds: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect choreo.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("choreo.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("choreo").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("choreo").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.max_duration == 30.0 { cli.max_duration = cfg.audio.max_duration_secs; }
            if cli.max_size_mb == 10 { cli.max_size_mb = cfg.audio.max_file_size_mb; }
            if cli.style == "auto" { cli.style = cfg.motion.style; }
            if !cli.metadata { cli.metadata = cfg.output.metadata; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if cli.list_styles {
        println!("Available styles:");
        for style in Style::ALL {
            println!("  {:<10} {}", style.label(), style.description());
        }
        return Ok(());
    }

    if let Some(ref path) = cli.inspect {
        return inspect(path);
    }

    let style: Style = cli.style.parse()?;

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("choreo - procedural dance motion from music");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Style: {}", style);
    log::info!("Limits: {:.1}s, {} MB", cli.max_duration, cli.max_size_mb);

    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let options = GenerateOptions::new(style, cli.max_duration, cli.max_size_mb);

    let pb = ProgressBar::new(Stage::COUNT);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let started = Instant::now();
    let mut finished_stages = 0;
    let generated = pipeline::generate(&bytes, &options, |stage| {
        pb.set_position(finished_stages);
        pb.set_message(stage.label());
        finished_stages += 1;
    });
    let generated = match generated {
        Ok(g) => g,
        Err(err) => {
            pb.abandon_with_message("Failed");
            return Err(err.into());
        }
    };
    let generation_seconds = started.elapsed().as_secs_f64();
    pb.set_position(Stage::COUNT);
    pb.finish_with_message("Generation complete");

    std::fs::write(&cli.output, &generated.bvh)
        .with_context(|| format!("Failed to write output file: {}", cli.output.display()))?;

    let report = &generated.report;
    log::info!(
        "{} frames ({:.2}s), tempo {:.1} BPM, {} beats, style {} -> {}, {:.2}s",
        report.frame_count,
        report.duration_seconds,
        report.tempo_bpm,
        report.beat_count,
        report.style,
        report.resolved_style,
        generation_seconds
    );

    if cli.metadata {
        let path = cli.output.with_extension("json");
        let metadata = Metadata {
            input: input.display().to_string(),
            output: cli.output.display().to_string(),
            report,
            generation_seconds,
        };
        let json = serde_json::to_string_pretty(&metadata)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write metadata: {}", path.display()))?;
        log::info!("Metadata: {}", path.display());
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read BVH file: {}", path.display()))?;
    let doc = encode::parse::parse(&text)
        .with_context(|| format!("Invalid BVH file: {}", path.display()))?;

    let max_depth = (0..doc.joints.len()).map(|i| doc.depth(i)).max().unwrap_or(0);
    let end_sites = doc.joints.iter().filter(|j| j.end_site.is_some()).count();
    let bone_length: f64 = doc
        .joints
        .iter()
        .filter(|j| j.parent.is_some())
        .map(|j| j.offset.iter().map(|v| v * v).sum::<f64>().sqrt())
        .sum();

    println!("{}", path.display());
    println!("  Joints:     {} ({} end sites, depth {})", doc.joints.len(), end_sites, max_depth);
    println!("  Bones:      {:.3} m total", bone_length);
    println!("  Channels:   {}", doc.channel_count());
    println!("  Frames:     {}", doc.frames.len());
    println!("  Frame time: {:.6}s ({:.1} fps)", doc.frame_time, 1.0 / doc.frame_time);
    println!("  Duration:   {:.2}s", doc.duration());
    if let Some(root) = doc.joints.first() {
        println!("  Root:       {} [{}]", root.name, root.channels.join(" "));
    }
    Ok(())
}
