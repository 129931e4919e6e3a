//! Exoview - inspect Exodus II simulation output from the terminal.

use anyhow::{bail, Context, Result};
use clap::Parser;
use exoview::{ExodusReader, FieldData, FieldReader, ReaderConfig, TimeStep, TimeTolerance};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "exoview")]
#[command(about = "Inspect Exodus II output, one file or every shard of a run", long_about = None)]
struct Args {
    /// Exodus file, or a glob pattern matching the shards of one run
    pattern: String,

    /// Variable to reconstruct
    #[arg(long)]
    var: Option<String>,

    /// Simulation time to read (defaults to the last recorded time)
    #[arg(long, conflicts_with = "step_average")]
    time: Option<f64>,

    /// Average a nodal variable over every recorded timestep (single file only)
    #[arg(long, requires = "var")]
    step_average: bool,

    /// Restrict the field to one element block
    #[arg(long)]
    block: Option<usize>,

    /// Relative tolerance when matching times
    #[arg(long, default_value_t = TimeTolerance::default().rtol)]
    rtol: f64,

    /// Absolute tolerance when matching times
    #[arg(long, default_value_t = TimeTolerance::default().atol)]
    atol: f64,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;
    tracing::info!(pattern = %args.pattern, "starting exoview");

    let config = ReaderConfig {
        time_tolerance: TimeTolerance {
            rtol: args.rtol,
            atol: args.atol,
        },
        ..ReaderConfig::default()
    };
    let mut reader = ExodusReader::open_with(&args.pattern, config, exoview::NetcdfMeshFile::open)
        .with_context(|| format!("Failed to open {}", args.pattern))?;

    let outcome = match &args.var {
        None => {
            print_overview(&reader);
            Ok(())
        }
        Some(name) => print_field(&reader, name, &args),
    };

    reader.close().context("Failed to close files")?;
    outcome
}

fn init_logging(log: Option<&Path>) -> Result<()> {
    match log {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::DEBUG)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn print_overview(reader: &ExodusReader) {
    let times = reader.times();
    println!("Files:      {}", reader.file_count());
    println!("Dimensions: {}", reader.dim());
    match (times.first(), times.last()) {
        (Some(first), Some(last)) => {
            println!("Times:      {} ({} .. {})", times.len(), first, last)
        }
        _ => println!("Times:      0"),
    }
    println!("Nodal:      {}", reader.nodal_var_names().join(", "));
    println!("Elemental:  {}", reader.elemental_var_names().join(", "));
}

fn print_field(reader: &ExodusReader, name: &str, args: &Args) -> Result<()> {
    let (label, field) = if args.step_average {
        let ExodusReader::Single(source) = reader else {
            bail!("--step-average needs a single file, not a pattern");
        };
        let values = source.value_at(name, TimeStep::AllTime, args.block)?;
        let [x, y, z] = source.coordinates(args.block)?;
        let field = FieldData::new(x.to_owned(), y.to_owned(), z.to_owned(), values)?;
        ("time average".to_string(), field)
    } else {
        let time = match args.time {
            Some(t) => t,
            None => match reader.times().last() {
                Some(&t) => t,
                None => bail!("{} has no recorded timesteps", args.pattern),
            },
        };
        let field = reader.get_data_at_time(name, time, args.block)?;
        (format!("t = {}", time), field)
    };

    println!("Variable:   {} ({})", name, label);
    println!("Elements:   {}", field.len());
    println!("{}", field.stats());
    Ok(())
}
