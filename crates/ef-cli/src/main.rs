//! # eqlfan — one EQL query, every matching index
//!
//! - `eqlfan run --API_KEY <creds> --index <pattern> --query-file <path>` —
//!   submit the query to every index, write `<output>_<index>.json` each,
//!   and optionally a JSON run report with `--report <path>`.
//! - `eqlfan indices --API_KEY <creds> --index <pattern>` — list what a
//!   pattern resolves to, without submitting anything.
//! - `eqlfan health --API_KEY <creds>` — print the cluster health line.

mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use ef_core::{QueryDocument, RunMode};
use ef_io::client::SearchService;
use ef_io::credentials::Credentials;
use ef_io::elastic::ElasticClient;
use ef_io::enumerator;
use ef_io::orchestrator::{FanoutConfig, Orchestrator};
use ef_io::report::RunReport;
use ef_io::sink::ResultSink;
use ef_io::waiter::WaitPolicy;

use crate::config::Config;

/// Execute EQL queries across indices and save per-index output to JSON files.
#[derive(Parser)]
#[command(name = "eqlfan", version, about, long_about = None)]
struct Cli {
    /// Tuning config file; ignored if it does not exist.
    #[arg(long, global = true, default_value = "eqlfan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ClusterArgs {
    /// JSON file with the API key, containing 'id', 'name', 'api_key'.
    #[arg(long = "API_KEY", value_name = "CREDSFILE")]
    api_key: PathBuf,

    /// Cluster URL.
    #[arg(long = "ES_URL", value_name = "URL", default_value = "https://example.com:9200/")]
    es_url: String,
}

#[derive(Args)]
struct LogArgs {
    /// Log progress (warn level).
    #[arg(short, long)]
    verbose: bool,

    /// Log everything (debug level).
    #[arg(short, long)]
    debug: bool,

    /// Append log lines to this file instead of stdout.
    #[arg(long)]
    logfile: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Sequential,
    Parallel,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => RunMode::Sequential,
            ModeArg::Parallel => RunMode::Parallel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the query against every index matching the pattern.
    Run {
        #[command(flatten)]
        cluster: ClusterArgs,

        /// Index pattern, e.g. "winlogbeat-2021.12.0*".
        #[arg(long)]
        index: String,

        /// File holding the EQL search body as a literal mapping.
        #[arg(long = "query-file")]
        query_file: PathBuf,

        /// Output prefix; results go to <output>_<index>.json.
        #[arg(long, default_value = "out")]
        output: String,

        /// Wait for each job before the next submit, or submit all first.
        #[arg(long, value_enum, default_value_t = ModeArg::Parallel)]
        mode: ModeArg,

        /// Seconds between status polls (overrides the config file).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: Option<u64>,

        /// Give up on a single job after this many seconds (0 = never).
        #[arg(long)]
        max_wait: Option<u64>,

        /// Also write a JSON summary of what was written, per index.
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        log: LogArgs,
    },

    /// List the indices a pattern resolves to.
    Indices {
        #[command(flatten)]
        cluster: ClusterArgs,

        #[arg(long)]
        index: String,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Print the cluster health line.
    Health {
        #[command(flatten)]
        cluster: ClusterArgs,

        #[command(flatten)]
        log: LogArgs,
    },
}

impl Commands {
    fn log(&self) -> &LogArgs {
        match self {
            Self::Run { log, .. } | Self::Indices { log, .. } | Self::Health { log, .. } => log,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = cli.command.log();
    if let Err(e) = logging::init(log.verbose, log.debug, log.logfile.as_deref()) {
        eprintln!("Error: {e:?}");
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to build tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Everything `run` needs once configuration has been validated.
struct RunPlan {
    pattern: String,
    query: QueryDocument,
    output: String,
    fanout: FanoutConfig,
}

/// Health line, mode line, then the fan-out itself.
async fn fan_out<C: SearchService + ?Sized>(client: &C, plan: RunPlan) -> Result<RunReport> {
    let health = client.health().await.context("cluster status check failed")?;
    tracing::warn!("Elastic status check: {}", health);
    tracing::warn!("Running in {} mode!", plan.fanout.mode);

    let report = Orchestrator::new(client, plan.fanout, ResultSink::new(plan.output))
        .run(&plan.pattern, &plan.query)
        .await?;
    tracing::warn!(
        "{} indices, {} succeeded, {} failed",
        report.total(),
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            cluster,
            index,
            query_file,
            output,
            mode,
            poll_interval,
            max_wait,
            report,
            log,
        } => {
            let query = load_query(&query_file)?;
            let client = connect(&cluster, &config)?;

            let wait = WaitPolicy {
                interval: poll_interval
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.poll.interval()),
                max_wait: match max_wait {
                    Some(0) => None,
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => config.poll.max_wait(),
                },
                verbose: log.verbose,
            };
            let plan = RunPlan {
                pattern: index,
                query,
                output,
                fanout: FanoutConfig {
                    mode: RunMode::from(mode),
                    inline_timeout: config.search.inline_timeout.clone(),
                    wait,
                },
            };

            let summary = fan_out(&client, plan).await?;
            if let Some(path) = report {
                summary.save(&path).await?;
            }
        }

        Commands::Indices { cluster, index, .. } => {
            let client = connect(&cluster, &config)?;
            for name in enumerator::resolve(&client, &index).await? {
                println!("{}", name);
            }
        }

        Commands::Health { cluster, .. } => {
            let client = connect(&cluster, &config)?;
            println!("{}", client.health().await?);
        }
    }

    Ok(())
}

fn load_query(path: &Path) -> Result<QueryDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading query file {}", path.display()))?;
    QueryDocument::parse(&text).with_context(|| format!("parsing query file {}", path.display()))
}

fn connect(cluster: &ClusterArgs, config: &Config) -> Result<ElasticClient> {
    let credentials = Credentials::load(&cluster.api_key)?;
    tracing::debug!("using API key '{}' ({})", credentials.name, credentials.id);
    Ok(ElasticClient::new(
        &cluster.es_url,
        &credentials,
        config.request_timeout(),
    )?)
}
