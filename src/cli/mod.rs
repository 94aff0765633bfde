//! CLI command surface
//!
//! `train` runs the full pipeline from a configuration file with optional key
//! overrides; `validate` checks a configuration without touching the dataset;
//! `info` prints the effective (defaulted) configuration.

use crate::config::{load_config, to_yaml, validate_config, TrainSpec};
use crate::error::Result;
use crate::pipeline;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Etiquetar: multi-label text classification trainer
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "etiquetar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Train and evaluate convolutional multi-label text classifiers from YAML configuration")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from a YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of data workers
    #[arg(long)]
    pub data_workers: Option<usize>,

    /// Validate and report without training
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Execute a parsed command.
pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train(args) => run_train(args),
        Command::Validate(args) => {
            load_config(&args.config)?;
            println!("✓ {} is a valid configuration", args.config.display());
            Ok(())
        }
        Command::Info(args) => {
            let spec = load_config(&args.config)?;
            println!("# effective configuration ({})", args.config.display());
            print!("{}", to_yaml(&spec)?);
            Ok(())
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut spec = load_config(&args.config)?;
    apply_overrides(&mut spec, &args);
    // Overrides can push fields out of range; re-check before running.
    validate_config(&spec)?;

    if args.dry_run {
        println!("✓ Config valid (dry run, not training)");
        println!("  optimizer: {} (lr={})", spec.optimizer, spec.learning_rate);
        println!("  epochs: {}, batch_size: {}", spec.epochs, spec.batch_size);
        println!("  monitoring {:?} on val_metric {}",
            spec.monitor_metrics.iter().map(ToString::to_string).collect::<Vec<_>>(),
            spec.val_metric);
        return Ok(());
    }

    let report = pipeline::run(&spec)?;
    println!();
    println!("✓ Training complete ({:?})", report.phase);
    if let (Some(epoch), Some(value)) = (report.best_epoch, report.best_value) {
        println!("  best {} = {:.4} at epoch {}", spec.val_metric, value, epoch);
    }
    Ok(())
}

fn apply_overrides(spec: &mut TrainSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        spec.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        spec.learning_rate = lr;
    }
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }
    if let Some(workers) = args.data_workers {
        spec.data_workers = workers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = "data_dir: data\ndata_name: rcv1\nmonitor_metrics: [P@1]\nval_metric: P@1\n";

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_train_command() {
        let cli =
            Cli::try_parse_from(["etiquetar", "train", "config.yml", "--epochs", "3"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.config, PathBuf::from("config.yml"));
                assert_eq!(args.epochs, Some(3));
                assert!(!args.dry_run);
            }
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["etiquetar"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let file = config_file(MINIMAL);
        let mut spec = load_config(file.path()).unwrap();
        let args = TrainArgs {
            config: file.path().to_path_buf(),
            epochs: Some(7),
            batch_size: None,
            lr: Some(0.1),
            seed: Some(5),
            data_workers: Some(0),
            dry_run: false,
        };
        apply_overrides(&mut spec, &args);
        assert_eq!(spec.epochs, 7);
        assert_eq!(spec.learning_rate, 0.1);
        assert_eq!(spec.seed, 5);
        assert_eq!(spec.data_workers, 0);
        assert_eq!(spec.batch_size, 16);
    }

    #[test]
    fn test_validate_command() {
        let file = config_file(MINIMAL);
        let cli = Cli::try_parse_from([
            "etiquetar",
            "validate",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(run_command(cli).is_ok());
    }

    #[test]
    fn test_validate_command_rejects_bad_config() {
        let file = config_file("data_dir: data\n");
        let cli = Cli::try_parse_from([
            "etiquetar",
            "validate",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(run_command(cli).is_err());
    }

    #[test]
    fn test_train_dry_run_stops_before_data_loading() {
        // The dataset does not exist; dry run must still succeed.
        let file = config_file(MINIMAL);
        let cli = Cli::try_parse_from([
            "etiquetar",
            "train",
            file.path().to_str().unwrap(),
            "--dry-run",
        ])
        .unwrap();
        assert!(run_command(cli).is_ok());
    }

    #[test]
    fn test_override_out_of_range_is_rejected() {
        let file = config_file(MINIMAL);
        let cli = Cli::try_parse_from([
            "etiquetar",
            "train",
            file.path().to_str().unwrap(),
            "--lr",
            "0.0",
            "--dry-run",
        ])
        .unwrap();
        assert!(run_command(cli).is_err());
    }

    #[test]
    fn test_info_command() {
        let file = config_file(MINIMAL);
        let cli =
            Cli::try_parse_from(["etiquetar", "info", file.path().to_str().unwrap()]).unwrap();
        assert!(run_command(cli).is_ok());
    }
}
