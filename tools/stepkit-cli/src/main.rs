use clap::{Parser, Subcommand};
use parallel_worker::WorkerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod suite;

#[derive(Parser)]
#[command(name = "stepkit")]
#[command(about = "Stepkit CLI - Plan how a Gherkin suite splits across parallel workers")]
#[command(version = stepkit_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenarios one worker would run
    Partition {
        /// 0-based index of this worker
        #[arg(long, env = "STEPKIT_WORKER", default_value_t = 0, allow_negative_numbers = true)]
        worker: i64,
        /// Number of workers sharing the suite
        #[arg(long, env = "STEPKIT_TOTAL_WORKERS", default_value_t = 1, allow_negative_numbers = true)]
        total_workers: i64,
        /// Treat each feature argument as one unit; arguments may be `path:line`
        #[arg(long)]
        line_mode: bool,
        /// Feature files or directories
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print version and build information
    Version,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Partition {
            worker,
            total_workers,
            line_mode,
            paths,
        } => {
            let config = WorkerConfig::from_signed(worker, total_workers)?.with_line_mode(line_mode);
            handle_partition(config, &paths)
        }
        Commands::Version => {
            println!("{}", stepkit_core::BUILD_INFO);
            Ok(())
        }
    }
}

fn handle_partition(config: WorkerConfig, paths: &[String]) -> anyhow::Result<()> {
    let assigned = suite::partition(config, paths)?;
    info!(
        worker = config.current_worker,
        total = config.total_workers,
        scenarios = assigned.len(),
        "partition computed"
    );

    for assignment in &assigned {
        println!("{assignment}");
    }
    Ok(())
}
