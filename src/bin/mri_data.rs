use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mri_data::app::{FetchResult, Fetcher};
use mri_data::config::{ConfigLoader, ConfigOverrides};
use mri_data::dataset::SampleStore;
use mri_data::error::DataError;
use mri_data::output::{InspectResult, JsonOutput, OutputMode, SampleSummary};
use mri_data::progress::TerminalProgress;
use mri_data::remote::HttpArchiveClient;

#[derive(Parser)]
#[command(name = "mri-data")]
#[command(about = "Fetch the brain-tumor MRI archive and inspect its samples")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download the archive and unpack it, including nested archives")]
    Fetch(FetchArgs),
    #[command(about = "Open a directory of .mat samples and summarize them")]
    Inspect(InspectArgs),
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    archive: Option<Utf8PathBuf>,

    #[arg(long, help = "Reuse an archive already on disk")]
    skip_download: bool,

    #[arg(long, help = "Unpack each nested archive into its own subdirectory")]
    namespace_nested: bool,
}

#[derive(Args)]
struct InspectArgs {
    root: Utf8PathBuf,

    #[arg(long, help = "Summarize at most this many samples")]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DataError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DataError) -> u8 {
    match error {
        DataError::DirectoryNotFound(_)
        | DataError::MissingArchive(_)
        | DataError::ConfigRead(_)
        | DataError::IndexOutOfRange { .. } => 2,
        DataError::Transfer(_) | DataError::TransferStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, output_mode),
        Commands::Inspect(args) => run_inspect(args, output_mode),
    }
}

fn run_fetch(args: FetchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let FetchArgs {
        config,
        url,
        archive,
        skip_download,
        namespace_nested,
    } = args;

    let resolved = ConfigLoader::resolve(config.as_deref())?.apply(ConfigOverrides {
        url,
        archive,
        skip_download,
        namespace_nested,
    });
    let fetcher = Fetcher::new(HttpArchiveClient::new()?);

    match output_mode {
        OutputMode::NonInteractive => {
            let result = fetcher.run(&resolved, &JsonOutput)?;
            JsonOutput::print_fetch(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let progress = TerminalProgress::new();
            let result = fetcher.run(&resolved, &progress);
            progress.finish();
            print_fetch_summary(&result?);
        }
    }
    Ok(())
}

fn run_inspect(args: InspectArgs, output_mode: OutputMode) -> miette::Result<()> {
    let store = SampleStore::open(args.root.as_std_path())?;
    let limit = args.limit.unwrap_or(store.len()).min(store.len());

    let mut samples = Vec::with_capacity(limit);
    for index in 0..limit {
        let sample = store.get(index)?;
        samples.push(SampleSummary {
            index,
            file: store.file_names()[index].clone(),
            label: sample.label,
            image_shape: sample.image.shape().to_vec(),
            tumor_pixels: sample.mask.iter().filter(|value| **value != 0).count(),
        });
    }
    let result = InspectResult {
        root: store.root().display().to_string(),
        len: store.len(),
        samples,
    };

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_inspect(&result).into_diagnostic()?,
        OutputMode::Interactive => print_inspect_summary(&result),
    }
    Ok(())
}

fn print_fetch_summary(result: &FetchResult) {
    let green = "\x1b[32m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    match result.downloaded_bytes {
        Some(bytes) => println!("{cyan}downloaded {bytes} bytes to {}{reset}", result.archive),
        None => println!("{cyan}using local archive {}{reset}", result.archive),
    }
    println!(
        "{green}extracted {} files into {}{reset}",
        result.extracted_files, result.extraction_dir
    );
    for nested in &result.nested_archives {
        println!("{green}  nested {nested} -> {}{reset}", result.nested_dir);
    }
    println!("manifest: {}", result.manifest);
}

fn print_inspect_summary(result: &InspectResult) {
    println!("{}: {} samples", result.root, result.len);
    for sample in &result.samples {
        println!(
            "  [{}] {} label={} shape={:?} tumor_pixels={}",
            sample.index, sample.file, sample.label, sample.image_shape, sample.tumor_pixels
        );
    }
}
