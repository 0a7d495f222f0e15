//! Export decision-tree paths as IF/THEN rules for a decision support system.

use std::path::PathBuf;

use ntprobnp_dss::config::{self, Settings};
use ntprobnp_dss::logging;
use ntprobnp_dss::rules::{ExportRequest, export_rules};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: PathBuf,
    out_path: Option<PathBuf>,
    feature_file: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings =
        config::load_settings(options.config_path.as_deref()).map_err(|err| err.to_string())?;
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let request = build_request(&options, &settings);
    let summary = export_rules(&request).map_err(|err| {
        tracing::error!(kind = %err.kind(), "{err}");
        err.to_string()
    })?;
    println!(
        "Wrote {} DSS rules → {}",
        summary.rules_written,
        summary.out_path.display()
    );
    Ok(())
}

fn build_request(options: &CliOptions, settings: &Settings) -> ExportRequest {
    ExportRequest {
        model_path: options.model_path.clone(),
        out_path: options
            .out_path
            .clone()
            .unwrap_or_else(|| settings.export.out.clone()),
        feature_file: options.feature_file.clone(),
        comments: settings.export.comments(),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut feature_file: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out_path = Some(PathBuf::from(value));
            }
            "--features" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--features requires a value".to_string())?;
                feature_file = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let model_path = model_path.ok_or_else(|| format!("--model is required\n\n{}", help_text()))?;
    Ok(CliOptions {
        model_path,
        out_path,
        feature_file,
        config_path,
    })
}

fn help_text() -> String {
    [
        "ntprobnp-export-rules",
        "",
        "Exports every decision-tree path as a rule row for DSS/CDS ingestion.",
        "",
        "Usage:",
        "  ntprobnp-export-rules --model <model.json> [--out dss_rules.csv] [--features <file>]",
        "",
        "Options:",
        "  --model <file>     Trained decision-tree model JSON (required).",
        "  --out <file>       Output CSV (default: dss_rules.csv).",
        "  --features <file>  Feature names, one per line; needed if the model has none.",
        "  --config <file>    Settings TOML (default: config.toml in the app directory).",
    ]
    .join("\n")
}
