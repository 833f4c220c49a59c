use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strum_eval::analysis::classify_example;
use strum_eval::config::AppConfig;
use strum_eval::dataset::{loaders, DatasetCatalog};
use strum_eval::evaluation::{evaluate_corpus_with, report};
use strum_eval::synthetic::{alternating_strums, SyntheticSpec};

#[derive(Parser, Debug)]
#[command(
    name = "strum_cli",
    about = "Strumming direction detector and evaluation harness"
)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every example in a dataset directory
    Evaluate {
        #[arg(long)]
        dataset_dir: PathBuf,
        /// JSON configuration overriding the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the full report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip failing examples instead of aborting
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Classify the strums of a single recording
    Detect {
        #[arg(long)]
        audio: PathBuf,
        #[arg(long)]
        motion: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the examples found in a dataset directory
    List {
        #[arg(long)]
        dataset_dir: PathBuf,
    },
    /// Write a synthetic example into a directory
    Synth {
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 5)]
        strums: usize,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    strum_eval::init_logging(cli.verbose);

    match cli.command {
        Commands::Evaluate {
            dataset_dir,
            config,
            output,
            continue_on_error,
        } => run_evaluate(&dataset_dir, config.as_deref(), output, continue_on_error),
        Commands::Detect {
            audio,
            motion,
            config,
        } => run_detect(&audio, &motion, config.as_deref()),
        Commands::List { dataset_dir } => run_list(&dataset_dir),
        Commands::Synth {
            output_dir,
            name,
            strums,
        } => run_synth(&output_dir, &name, strums),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_strict(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn run_evaluate(
    dataset_dir: &Path,
    config_path: Option<&Path>,
    output_path: Option<PathBuf>,
    continue_on_error: bool,
) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    config.evaluation.continue_on_error |= continue_on_error;

    let catalog = DatasetCatalog::new(dataset_dir);
    let corpus = evaluate_corpus_with(&catalog, &config, |example| {
        print!("{}", report::format_example(example));
    })
    .with_context(|| format!("evaluating dataset {}", dataset_dir.display()))?;

    print!("{}", report::format_summary(&corpus));

    if let Some(path) = output_path {
        report::write_json(&corpus, &path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(ExitCode::from(0))
}

fn run_detect(audio: &Path, motion: &Path, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let waveform = loaders::load_waveform(audio, config.audio.target_sample_rate)?;
    let motion = loaders::load_motion(motion)?;

    let estimate = classify_example(
        &waveform.samples,
        waveform.sample_rate,
        &motion.values,
        &motion.timestamps,
        &config,
    )
    .with_context(|| format!("classifying {}", audio.display()))?;

    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(ExitCode::from(0))
}

fn run_list(dataset_dir: &Path) -> Result<ExitCode> {
    let catalog = DatasetCatalog::new(dataset_dir);
    let examples = catalog.discover()?;
    if examples.is_empty() {
        println!("No examples found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for files in examples {
        let status = match files.verify() {
            Ok(()) => "ok".to_string(),
            Err(err) => err.to_string(),
        };
        println!("{} -> {}", files.id, status);
    }
    Ok(ExitCode::from(0))
}

fn run_synth(output_dir: &Path, name: &str, strums: usize) -> Result<ExitCode> {
    let first = 0.5;
    let interval = 0.5;
    let spec = SyntheticSpec {
        duration_secs: first + strums as f64 * interval,
        ..SyntheticSpec::default()
    }
    .with_strums(alternating_strums(strums, first, interval));

    let files = spec
        .build()
        .write_to(output_dir, name)
        .with_context(|| format!("writing synthetic example to {}", output_dir.display()))?;

    println!("{}", files.labels.display());
    Ok(ExitCode::from(0))
}
