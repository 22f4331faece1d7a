use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use skelstat::aggregate::{self, FileStatus};
use skelstat::log::{MalformedPolicy, ParseOptions, TimeUnit};
use skelstat::manifest::Manifest;
use skelstat::model;
use skelstat::report::{self, BatchReport, RunReport, TrialReport};
use std::path::{Path, PathBuf};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "skelstat")]
#[command(about = "Search-skeleton benchmark log statistics", long_about = None)]
struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one log into run metrics and per-depth regularity.
    Parse {
        #[arg(long)]
        log: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Summarise repeated trials of one configuration.
    Trials {
        #[arg(long, required = true, num_args = 1..)]
        log: Vec<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Aggregate a (variant, worker-count) study described by a manifest.
    Batch {
        #[arg(long)]
        manifest: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Ms,
    Us,
}

/// Command-line overrides on top of defaults (or the manifest's options).
#[derive(Args)]
struct ParseArgs {
    /// Unit of depth-time records.
    #[arg(long, value_enum)]
    time_unit: Option<UnitArg>,

    /// Fold depths above this into the last bucket.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Count "CountNodes" lines as node counts.
    #[arg(long)]
    no_cumulative_exclusion: bool,

    /// Skip malformed lines instead of failing the file.
    #[arg(long)]
    skip_malformed: bool,
}

impl ParseArgs {
    fn apply(&self, mut opts: ParseOptions) -> ParseOptions {
        if let Some(unit) = self.time_unit {
            opts.time_unit = match unit {
                UnitArg::Ms => TimeUnit::Ms,
                UnitArg::Us => TimeUnit::Us,
            };
        }
        if let Some(max) = self.max_depth {
            opts.max_depth = Some(max);
        }
        if self.no_cumulative_exclusion {
            opts.cumulative_exclusion = false;
        }
        if self.skip_malformed {
            opts.on_malformed = MalformedPolicy::Skip;
        }
        opts
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.cmd {
        Commands::Parse { log, parse, out } => {
            let opts = parse.apply(ParseOptions::default());
            let metrics = model::parse_run_file(&log, &opts)
                .with_context(|| format!("parse log {}", log.display()))?;
            emit(&RunReport::new(metrics), out.as_deref())?;
        }
        Commands::Trials { log, parse, out } => {
            let opts = parse.apply(ParseOptions::default());
            let outcome = aggregate::run_trials(&log, &opts);

            for (path, status) in &outcome.files {
                print_status(path, status);
            }
            let no_data: Vec<PathBuf> =
                outcome.files_without_data().map(Path::to_path_buf).collect();
            print_no_data(&no_data, outcome.files.len());

            let Some(summary) = outcome.summary else {
                bail!("none of the {} logs contributed data", log.len());
            };
            emit(
                &TrialReport::new(outcome.sources, summary, no_data),
                out.as_deref(),
            )?;
        }
        Commands::Batch {
            manifest,
            parse,
            out,
        } => {
            // 1) Load + validate the manifest.
            let spec = Manifest::load(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let mut plan = spec.validate_and_build(base_dir)?;
            plan.options = parse.apply(plan.options);

            // 2) Parse every file and fill the matrix.
            let outcome = aggregate::run_batch(&plan);

            for f in &outcome.files {
                print_status(&f.path, &f.status);
            }

            // 3) Derive series and write the report.
            let report = BatchReport::new(&outcome, plan.cores_per_worker);
            print_no_data(&report.no_data, outcome.files.len());
            emit(&report, out.as_deref())?;
        }
    }

    Ok(())
}

fn print_status(path: &Path, status: &FileStatus) {
    match status {
        FileStatus::Parsed => eprintln!("ok      {}", path.display()),
        FileStatus::NoData => eprintln!("no data {}", path.display()),
        FileStatus::Failed { kind, message } => eprintln!("{:<7} {}: {}", "error", kind, message),
    }
}

fn print_no_data(no_data: &[PathBuf], total: usize) {
    if no_data.is_empty() {
        eprintln!("all {} files contributed data", total);
    } else {
        eprintln!("{} files contributed no data:", no_data.len());
        for path in no_data {
            eprintln!("  {}", path.display());
        }
    }
}

fn emit<T: serde::Serialize>(doc: &T, out: Option<&Path>) -> Result<()> {
    let json = report::render_json(doc)?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
