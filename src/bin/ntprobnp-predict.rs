//! Evaluate the pretrained NT-proBNP decision tree against a labeled CSV.

use std::path::PathBuf;

use ntprobnp_dss::config::{self, Settings};
use ntprobnp_dss::eval::{EvalError, EvalRequest, evaluate};
use ntprobnp_dss::logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    data_path: PathBuf,
    model_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
    threshold: Option<f64>,
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
    let outcome = evaluate(&request).map_err(report)?;
    for line in outcome.evaluation.report_lines() {
        println!("{line}");
    }

    if let Some(out_path) = &options.out_path {
        outcome
            .write_predictions(out_path, &settings.evaluate.probability_column)
            .map_err(report)?;
        println!("Predictions saved to '{}'", out_path.display());
    }
    Ok(())
}

fn build_request(options: &CliOptions, settings: &Settings) -> EvalRequest {
    EvalRequest {
        data_path: options.data_path.clone(),
        model_path: options
            .model_path
            .clone()
            .unwrap_or_else(|| settings.evaluate.model.clone()),
        label_column: settings.evaluate.label_column.clone(),
        threshold: options
            .threshold
            .unwrap_or(settings.evaluate.decision_threshold),
    }
}

fn report(err: EvalError) -> String {
    tracing::error!(kind = %err.kind(), "{err}");
    err.to_string()
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut data_path: Option<PathBuf> = None;
    let mut model_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut threshold: Option<f64> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                data_path = Some(PathBuf::from(value));
            }
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
            "--threshold" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--threshold requires a value".to_string())?;
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --threshold value: {value}"))?;
                threshold = Some(config::check_threshold(parsed).map_err(|err| err.to_string())?);
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

    let data_path = data_path.ok_or_else(|| format!("--data is required\n\n{}", help_text()))?;
    Ok(CliOptions {
        data_path,
        model_path,
        out_path,
        threshold,
        config_path,
    })
}

fn help_text() -> String {
    [
        "ntprobnp-predict",
        "",
        "Evaluates the pretrained NT-proBNP decision-tree model on a labeled CSV.",
        "",
        "Usage:",
        "  ntprobnp-predict --data <file.csv> [--model model.json] [--out predictions.csv]",
        "",
        "Options:",
        "  --data <file>         Input CSV with an NTproBNP_300 label column (required).",
        "  --model <file>        Pretrained model JSON (default: model.json).",
        "  --out <file>          Save per-row probabilities to this CSV.",
        "  --threshold <f64>     Decision threshold in [0, 1] (default: 0.5).",
        "  --config <file>       Settings TOML (default: config.toml in the app directory).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let options = parse_args(args(&[
            "--data",
            "d.csv",
            "--model",
            "m.json",
            "--out",
            "p.csv",
            "--threshold",
            "0.4",
        ]))
        .unwrap();
        assert_eq!(options.data_path, PathBuf::from("d.csv"));
        assert_eq!(options.model_path, Some(PathBuf::from("m.json")));
        assert_eq!(options.out_path, Some(PathBuf::from("p.csv")));
        assert_eq!(options.threshold, Some(0.4));
    }

    #[test]
    fn flags_override_settings() {
        let settings = Settings::default();
        let options = parse_args(args(&["--data", "d.csv"])).unwrap();
        let request = build_request(&options, &settings);
        assert_eq!(request.model_path, PathBuf::from("model.json"));
        assert_eq!(request.threshold, 0.5);
        assert_eq!(request.label_column, "NTproBNP_300");

        let options = parse_args(args(&["--data", "d.csv", "--threshold", "0.3"])).unwrap();
        assert_eq!(build_request(&options, &settings).threshold, 0.3);
    }

    #[test]
    fn rejects_missing_data_and_bad_threshold() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--data", "d.csv", "--threshold", "1.5"])).is_err());
        assert!(parse_args(args(&["--data", "d.csv", "--threshold", "abc"])).is_err());
        assert!(parse_args(args(&["--data"])).is_err());
        assert!(parse_args(args(&["--data", "d.csv", "--bogus"])).is_err());
    }
}
