mod args;

use anyhow::{anyhow, Context};
use args::{Args, Command};
use clap::Parser;
use log::info;
use posture_pro_lib::core::analysis_service::{api_stats, DefaultPostureService};
use posture_pro_lib::core::config::AnalysisConfig;
use posture_pro_lib::models::capture::{content_type_for_extension, Upload};
use serde::Serialize;
use std::path::Path;

fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("{} has no file extension", path.display()))?;
    let content_type = content_type_for_extension(extension)
        .ok_or_else(|| anyhow!("Unsupported file type: .{}", extension))?;

    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut upload = Upload::new(content_type, data);
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        upload = upload.with_file_name(name);
    }
    Ok(upload)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let config = match path {
        Some(path) => AnalysisConfig::load_from(path),
        None => AnalysisConfig::load(),
    };
    config.map_err(|e| anyhow!("Failed to load config: {}", e))
}

fn start_service(config: AnalysisConfig) -> anyhow::Result<DefaultPostureService> {
    let service = DefaultPostureService::with_defaults(config)?;
    info!("Posture analysis service ready (v{})", env!("CARGO_PKG_VERSION"));
    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Video { path } => {
            let service = start_service(config)?;
            let analysis = service.analyze_video(read_upload(&path)?).await?;
            print_json(&analysis)
        }
        Command::Image { path } => {
            let service = start_service(config)?;
            let result = service.analyze_frame(read_upload(&path)?).await?;
            print_json(&result)
        }
        Command::Health => print_json(&start_service(config)?.health_check().await),
        Command::Stats => print_json(&api_stats(&config)),
    }
}
