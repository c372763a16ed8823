// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use clap::Parser;
use jobpool::RebelPool;
use jobpool_examples::{load_config, Adder};
use log::info;

/// Fires jobs into a rebel pool and watches them drain. Nothing waits for them.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Pool configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    size: usize,

    #[arg(long, default_value_t = 10)]
    jobs: usize,

    /// Duration of one job in milliseconds
    #[arg(long, default_value_t = 1000)]
    work_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?.named("rebel");
    config.size = args.size;

    let adder = Adder::new(Duration::from_millis(args.work_ms));
    let pool = RebelPool::with_config(config);
    pool.add(adder.clone(), args.jobs);

    while adder.count() < args.jobs as u32 || pool.in_flight() > 0 {
        info!(
            "size={} depth={} in_flight={} started={}",
            pool.pool_size(),
            pool.queue_depth(),
            pool.in_flight(),
            adder.count()
        );
        sleep(Duration::from_millis(250));
    }
    pool.close();
    info!("{} executions", adder.count());
    Ok(())
}
