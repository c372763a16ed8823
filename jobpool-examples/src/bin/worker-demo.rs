// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};

use clap::Parser;
use jobpool::WorkerPool;
use jobpool_examples::{load_config, Adder, Report, Sample};
use log::info;

/// Runs a worker pool under load, resizes it and waits for a batch and the whole pool.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Pool configuration (JSON). Command line values take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initial concurrency ceiling
    #[arg(long)]
    size: Option<usize>,

    /// Ceiling to grow to while the jobs run
    #[arg(long, default_value_t = 5)]
    grow_to: usize,

    /// Ceiling to shrink to afterwards
    #[arg(long, default_value_t = 2)]
    shrink_to: usize,

    /// Jobs submitted to the pool directly
    #[arg(long, default_value_t = 10)]
    jobs: usize,

    /// Jobs submitted through a temporary batch
    #[arg(long, default_value_t = 4)]
    batch_jobs: usize,

    /// Duration of one job in milliseconds
    #[arg(long, default_value_t = 1000)]
    work_ms: u64,

    /// Print the run as JSON instead of logging it
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(size) = args.size {
        config.size = size;
    }

    let started = Instant::now();
    let work = Duration::from_millis(args.work_ms);
    let adder = Adder::new(work);
    let pool = WorkerPool::with_config(config.clone());
    let mut samples = Vec::new();
    let mut sample = |event: &str, pool: &WorkerPool| {
        let s = Sample {
            at_msec: started.elapsed().as_millis() as u64,
            event: event.to_string(),
            pool_size: pool.pool_size(),
            queue_depth: pool.queue_depth(),
            in_flight: pool.in_flight(),
        };
        info!(
            "{:>6}ms {:<12} size={} depth={} in_flight={}",
            s.at_msec, s.event, s.pool_size, s.queue_depth, s.in_flight
        );
        samples.push(s);
    };

    pool.add(adder.clone(), args.jobs);
    let batch = pool.new_temp_batch();
    batch.add(adder.clone(), args.batch_jobs)?;
    sample("submitted", &pool);

    sleep(work);
    sample("running", &pool);
    pool.set_pool_size(args.grow_to);
    sample("grown", &pool);
    sleep(work);
    sample("running", &pool);
    pool.set_pool_size(args.shrink_to);
    sample("shrunk", &pool);

    batch.wait()?;
    sample("batch done", &pool);
    batch.remove()?;
    pool.wait();
    sample("pool done", &pool);
    pool.close();

    let report = Report {
        config,
        executions: adder.count(),
        samples,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!("{} executions", report.executions);
    }
    Ok(())
}
