use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::{Duration, Instant, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jobline_core::ports::SequentialIdGenerator;
use jobline_core::{BoxError, Handler, JobQueueBuilder, QueueConfig};

/// Run a synthetic workload through a jobline queue and print its stats.
#[derive(Debug, Parser)]
#[command(name = "jobline", version)]
struct Cli {
    /// JSON queue config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of jobs to submit
    #[arg(long, default_value_t = 8)]
    jobs: u32,

    /// How long each job runs, in milliseconds
    #[arg(long, default_value_t = 50)]
    job_ms: u64,

    #[arg(long)]
    max_concurrency: Option<usize>,

    #[arg(long)]
    rate_limit: Option<f64>,

    #[arg(long)]
    max_queue_length: Option<usize>,

    /// The first N jobs fail on purpose
    #[arg(long, default_value_t = 0)]
    failures: u32,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct HelloPayload {
    name: String,
    ms: u64,
}

struct HelloHandler {
    remaining_failures: AtomicU32,
}

impl HelloHandler {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl Handler<Value> for HelloHandler {
    type Output = String;

    async fn handle(&self, job: Value) -> Result<String, BoxError> {
        let p: HelloPayload = serde_json::from_value(job)?;
        sleep(Duration::from_millis(p.ms)).await;

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(format!("intentional failure (left={left})").into());
        }

        Ok(format!("Hello, {}!", p.name))
    }
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn load_config(cli: &Cli) -> Result<QueueConfig, BoxError> {
    let mut config = match &cli.config {
        Some(path) => QueueConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => QueueConfig::default(),
    };
    if let Some(max) = cli.max_concurrency {
        config.max_concurrency = max;
    }
    if cli.rate_limit.is_some() {
        config.rate_limit_per_second = cli.rate_limit;
    }
    if cli.max_queue_length.is_some() {
        config.max_queue_length = cli.max_queue_length;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let config = load_config(&cli)?;
    let queue = JobQueueBuilder::from_config(config)
        .id_generator(SequentialIdGenerator::new("hello"))
        .build(HelloHandler::new(cli.failures))?;

    let started = Instant::now();
    let mut waiting = Vec::new();
    for i in 0..cli.jobs {
        // no "id" field, so the generator names each job
        let job = json!({ "name": format!("worker-{i}"), "ms": cli.job_ms });
        match queue.submit_and_wait(job) {
            Ok(completion) => waiting.push(completion),
            Err(e) => warn!(error = %e, "submission rejected"),
        }
    }
    let snapshot = serde_json::to_string(&queue.stats())?;
    info!(stats = %snapshot, "all jobs submitted");

    for completion in waiting {
        let id = completion.id().clone();
        match completion.await {
            Ok(greeting) => info!(job_id = %id, %greeting, "job done"),
            Err(e) => warn!(job_id = %id, error = %e, "job failed"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&queue.stats())?);
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "finished");
    queue.destroy();
    Ok(())
}
