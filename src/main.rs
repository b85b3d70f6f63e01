use std::path::{Path, PathBuf};

use clap::Parser;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::info;

use rpv::config::Config;
use rpv::convert::{ConversionResult, Converter};
use rpv::error::{AppError, AppResult};
use rpv::source::SourceDocument;

/// Render the first page of PDF résumés to PNG.
#[derive(Debug, Parser)]
#[command(name = "rpv", version)]
struct Cli {
    /// Config file; defaults to $RPV_CONFIG_PATH or ~/.config/rpv/config.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory PNG files are written to.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Print one JSON object per input instead of a summary line.
    #[arg(long)]
    json: bool,

    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    source: String,
    #[serde(flatten)]
    result: &'a ConversionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

async fn run() -> AppResult<bool> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    rpv::logging::init(&config.log);

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to create output directory: {}", cli.out_dir.display()),
            )
        })?;

    let converter = Converter::from_config(&config);
    info!(files = cli.files.len(), out_dir = %cli.out_dir.display(), "converting");
    let outcomes = join_all(
        cli.files
            .iter()
            .map(|path| convert_file(&converter, path, &cli.out_dir)),
    )
    .await;

    let mut all_converted = true;
    for (path, outcome) in cli.files.iter().zip(outcomes) {
        let (result, output) = match outcome {
            Ok(converted) => converted,
            Err(err) => {
                all_converted = false;
                eprintln!("{}: {err}", path.display());
                continue;
            }
        };
        all_converted &= result.is_success();
        print_report(&cli, path, &result, output.as_deref())?;
        converter.urls().revoke(result.image_url());
    }

    Ok(all_converted)
}

async fn convert_file(
    converter: &Converter,
    path: &Path,
    out_dir: &Path,
) -> AppResult<(ConversionResult, Option<PathBuf>)> {
    let source = SourceDocument::read(path).await?;
    let result = converter.convert_to_image(&source).await;

    let Some(file) = result.file() else {
        return Ok((result, None));
    };
    let output = out_dir.join(file.name());
    tokio::fs::write(&output, file.bytes())
        .await
        .map_err(|source| {
            AppError::io_with_context(source, format!("failed to write {}", output.display()))
        })?;
    Ok((result, Some(output)))
}

fn print_report(
    cli: &Cli,
    path: &Path,
    result: &ConversionResult,
    output: Option<&Path>,
) -> AppResult<()> {
    if cli.json {
        let report = Report {
            source: path.display().to_string(),
            result,
            output: output.map(|output| output.display().to_string()),
        };
        let line = serde_json::to_string(&report)
            .map_err(|err| AppError::invalid_argument(format!("failed to serialize report: {err}")))?;
        println!("{line}");
        return Ok(());
    }

    match (result.file(), output, result.error()) {
        (Some(file), Some(output), _) => {
            println!("{} -> {} ({} bytes)", path.display(), output.display(), file.bytes().len());
        }
        (_, _, Some(error)) => println!("{}: {error}", path.display()),
        _ => println!("{}: no output", path.display()),
    }
    Ok(())
}
