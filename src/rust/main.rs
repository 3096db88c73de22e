use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use fos_classifier::config::resolve_host;
use fos_classifier::prep::{
    assign_classes, sample_records, split_train_test_validation, ClassDistribution, RawRecord,
    SampleMode, TaxonomyLookup,
};
use fos_classifier::{
    default_metrics_path, init_logger, load_json, load_prompt, load_records, load_template, metric_title, save_json,
    write_metrics_csv, HostedSampling, InferenceBackend, LocalSampling, OllamaBackend, OllamaConfig, OpenAiBackend,
    OpenAiConfig, Pipeline, ResultStreamWriter,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(author, version, about = "Classify research papers by field of science with LLMs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify records with a local Ollama model
    Ollama {
        #[command(flatten)]
        run: RunArgs,
        /// Top-k value for the model
        #[arg(long, alias = "top_k", default_value_t = 10)]
        top_k: u32,
        /// Ollama server address
        #[arg(long, env = "OLLAMA_HOST")]
        host: Option<String>,
    },
    /// Classify records with the OpenAI chat completions API
    Openai {
        #[command(flatten)]
        run: RunArgs,
        /// Max tokens for the model
        #[arg(long, alias = "max_tokens", default_value_t = 500)]
        max_tokens: u32,
        /// API base URL
        #[arg(long, env = "OPENAI_BASE_URL")]
        base_url: Option<String>,
    },
    /// Tag records with main/sub classes from a classification file
    Assign(AssignArgs),
    /// Report main/sub class distributions
    Stats(StatsArgs),
    /// Sample records or split them into train/test/validation sets
    Sample(SampleArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Path to the JSON file containing test data
    #[arg(short = 't', long, alias = "test_data")]
    test_data: PathBuf,
    /// Path to save the classification results
    #[arg(short, long)]
    output: PathBuf,
    /// Model to use for classification
    #[arg(short, long)]
    model: String,
    /// Path to the file containing the classification prompt
    #[arg(short, long, alias = "prompt_file")]
    prompt_file: PathBuf,
    /// Path to the file containing the system prompt
    #[arg(short, long, alias = "system_prompt_file")]
    system_prompt_file: Option<PathBuf>,
    /// Key in the test data to use for the true label
    #[arg(short = 'l', long, alias = "true_label")]
    true_label: Option<String>,
    /// Sampling temperature
    #[arg(long, default_value_t = 0.1)]
    temperature: f32,
    /// Per-request timeout; no timeout when omitted
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
    /// Path to save the metrics CSV file (default: {input_file_name}_metrics.csv)
    #[arg(long, alias = "metrics_file")]
    metrics_file: Option<PathBuf>,
}

impl RunArgs {
    fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Args)]
struct AssignArgs {
    /// Path to the input JSON file containing publication metadata
    #[arg(short, long, alias = "input_file")]
    input_file: PathBuf,
    /// Path to the JSON file containing the classification system
    #[arg(short, long, alias = "classification_file")]
    classification_file: PathBuf,
    /// Path to the output JSON file
    #[arg(short, long, alias = "output_file")]
    output_file: PathBuf,
    /// Path to the output JSON file for unmatched records
    #[arg(short, long, alias = "unmatched_file", default_value = "unmatched.json")]
    unmatched_file: PathBuf,
}

#[derive(Args)]
struct StatsArgs {
    /// Path to the input JSON file
    #[arg(short, long, alias = "input_file")]
    input_file: PathBuf,
    /// Path to the output CSV file
    #[arg(short, long, alias = "output_file", default_value = "output.csv")]
    output_file: PathBuf,
}

#[derive(Args)]
struct SampleArgs {
    /// Path to the input JSON file
    #[arg(short, long, alias = "input_file")]
    input_file: PathBuf,
    /// Path to the output JSON file (or base name for train/test/validation files)
    #[arg(short, long, alias = "output_file")]
    output_file: Option<PathBuf>,
    /// Sampling mode
    #[arg(short, long, value_parser = ["all", "main", "sub", "categories", "train"])]
    mode: String,
    /// Number of samples to draw (not used in 'train' mode)
    #[arg(short, long, alias = "num_samples")]
    num_samples: Option<usize>,
    /// Class value for 'main' or 'sub' mode
    #[arg(short, long, alias = "class_value")]
    class_value: Option<String>,
    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Command::Ollama { run, .. } | Command::Openai { run, .. } if run.verbose);
    init_logger(verbose);

    match cli.command {
        Command::Ollama { run, top_k, host } => {
            let mut config = OllamaConfig::new(&run.model).with_timeout(run.timeout());
            if let Some(host) = host {
                config = config.with_host(resolve_host(Some(host)));
            }
            let backend = OllamaBackend::new(config)?;
            let sampling = LocalSampling {
                temperature: run.temperature,
                top_k,
            };
            classify(backend, sampling, &run)
        }
        Command::Openai { run, max_tokens, base_url } => {
            let mut config = OpenAiConfig::from_env(&run.model)?.with_timeout(run.timeout());
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            let backend = OpenAiBackend::new(config)?;
            let sampling = HostedSampling {
                temperature: run.temperature,
                max_tokens,
            };
            classify(backend, sampling, &run)
        }
        Command::Assign(args) => assign(&args),
        Command::Stats(args) => stats(&args),
        Command::Sample(args) => sample(&args),
    }
}

fn classify<B: InferenceBackend>(backend: B, sampling: B::Sampling, args: &RunArgs) -> anyhow::Result<()> {
    let records = load_records(&args.test_data)
        .with_context(|| format!("Failed to load test data from {}", args.test_data.display()))?;
    let template = load_template(&args.prompt_file)
        .with_context(|| format!("Failed to load prompt from {}", args.prompt_file.display()))?;
    let system_prompt = match &args.system_prompt_file {
        Some(path) => Some(
            load_prompt(path).with_context(|| format!("Failed to load system prompt from {}", path.display()))?,
        ),
        None => None,
    };
    let metrics_file = args
        .metrics_file
        .clone()
        .unwrap_or_else(|| default_metrics_path(&args.test_data));

    let mut builder = Pipeline::builder(backend)
        .with_template(template)
        .with_sampling(sampling)
        .verbose(args.verbose);
    if let Some(system_prompt) = system_prompt {
        builder = builder.with_system_prompt(system_prompt);
    }
    if let Some(field) = &args.true_label {
        builder = builder.with_label_field(field.clone());
    }
    let pipeline = builder.build()?;

    if args.verbose {
        println!("\nStarting classification...");
    }
    let stream = ResultStreamWriter::create(&args.output)
        .with_context(|| format!("Failed to create output file {}", args.output.display()))?;
    let (summary, _) = pipeline.run(&records, stream)?;

    match &summary.metrics {
        Some(metrics) => {
            write_metrics_csv(metrics, &metrics_file)
                .with_context(|| format!("Failed to write metrics to {}", metrics_file.display()))?;
            if args.verbose {
                println!("Overall metrics:");
                for (name, value) in metrics.entries() {
                    println!("  {}: {:.4}", metric_title(name), value);
                }
                println!("Metrics saved to: {}", metrics_file.display());
            }
        }
        None if args.verbose => println!(
            "No predictions were evaluated (no actual classes provided in the test data under the key '{}').",
            args.true_label.as_deref().unwrap_or("None")
        ),
        None => {}
    }

    if args.verbose {
        println!("Classification complete. Results saved to {}", args.output.display());
        if summary.skipped > 0 {
            println!("Skipped {} records after API errors", summary.skipped);
        }
        if let Some(metrics) = &summary.metrics {
            println!("Final accuracy: {:.2}%", metrics.accuracy * 100.0);
            println!("Final F1-score: {:.4}", metrics.f1);
        }
    }
    Ok(())
}

fn assign(args: &AssignArgs) -> anyhow::Result<()> {
    let records: Vec<RawRecord> = load_json(&args.input_file)
        .with_context(|| format!("{} is not a valid JSON array of records", args.input_file.display()))?;
    let classification: serde_json::Map<String, serde_json::Value> = load_json(&args.classification_file)
        .with_context(|| format!("{} is not a valid classification file", args.classification_file.display()))?;

    let lookup = TaxonomyLookup::from_json(classification)
        .with_context(|| format!("{} is not a valid classification file", args.classification_file.display()))?;
    let assignment = assign_classes(records, &lookup);
    println!("Matched {} records.", assignment.matched.len());
    println!("Unmatched {} records.", assignment.unmatched.len());

    save_json(&assignment.matched, &args.output_file)?;
    println!("Successfully wrote records to {}", args.output_file.display());
    save_json(&assignment.unmatched, &args.unmatched_file)?;
    println!("Successfully wrote records to {}", args.unmatched_file.display());
    Ok(())
}

fn stats(args: &StatsArgs) -> anyhow::Result<()> {
    let records: Vec<RawRecord> = load_json(&args.input_file)
        .with_context(|| format!("JSON file {} should contain a list of objects", args.input_file.display()))?;

    let distribution = ClassDistribution::from_records(&records);
    println!("{}", distribution.summary());

    let file = std::fs::File::create(&args.output_file)
        .with_context(|| format!("Unable to write to file {}", args.output_file.display()))?;
    distribution.write_csv(std::io::BufWriter::new(file))?;
    println!("CSV file written successfully: {}", args.output_file.display());
    Ok(())
}

fn sample(args: &SampleArgs) -> anyhow::Result<()> {
    let mode: SampleMode = args.mode.parse()?;
    if mode != SampleMode::Train && args.num_samples.is_none() {
        bail!("--num-samples is required for all modes except 'train'");
    }
    if matches!(mode, SampleMode::Main | SampleMode::Sub) && args.class_value.is_none() {
        bail!("--class-value is required when mode is 'main' or 'sub'");
    }

    let records: Vec<RawRecord> = load_json(&args.input_file)
        .with_context(|| format!("Invalid JSON in input file: {}", args.input_file.display()))?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if mode == SampleMode::Train {
        let split = split_train_test_validation(records, &mut rng);
        for (name, part) in split.parts() {
            let path = split_path(args.output_file.as_deref(), name);
            save_json(part, &path)?;
            println!("Successfully saved {} records to {}", part.len(), path.display());
        }
        return Ok(());
    }

    let Some(output_file) = &args.output_file else {
        bail!("--output-file is required unless mode is 'train'");
    };
    let num_samples = args.num_samples.unwrap_or_default();
    let sampled = sample_records(&records, num_samples, mode, args.class_value.as_deref(), &mut rng)?;
    save_json(&sampled, output_file)?;
    info!("Sampled {} of {} records in '{}' mode", sampled.len(), records.len(), mode);
    println!("Successfully sampled {} records to {}", sampled.len(), output_file.display());
    Ok(())
}

/// `{base}_{name}.json`, or `{name}.json` without a base
fn split_path(base: Option<&Path>, name: &str) -> PathBuf {
    match base {
        Some(base) => PathBuf::from(format!("{}_{}.json", base.display(), name)),
        None => PathBuf::from(format!("{}.json", name)),
    }
}
