//! Stash CLI
//!
//! Demonstrations and a read benchmark for the stash query cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stash_cache::{CacheConfig, CacheHandle, CacheStats};
use stash_core::{Key, Lifetime};

/// Stash - process-local query cache with sliding expiration
#[derive(Parser)]
#[command(name = "stash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the posts scenario: store at t=0, read at t=3, 7 and 13
    Scenario {
        /// Real milliseconds per simulated second
        #[arg(long, default_value = "200")]
        tick_ms: u64,
        /// Lifetime in simulated seconds
        #[arg(long, default_value = "5")]
        lifetime: u64,
    },

    /// Show that concurrent misses on one key all run the computation
    Race {
        /// Number of concurrent callers
        #[arg(short, long, default_value = "8")]
        callers: usize,
        /// Simulated query latency in milliseconds
        #[arg(long, default_value = "50")]
        delay_ms: u64,
    },

    /// Drive reads through the cache actor and print its statistics
    Bench {
        /// Number of reads
        #[arg(short, long, default_value = "100000")]
        reads: usize,
        /// Number of distinct keys
        #[arg(short, long, default_value = "16")]
        keys: usize,
        /// Lifetime in seconds (omit for never expires)
        #[arg(short, long, env = "STASH_BENCH_LIFETIME")]
        lifetime: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "stash=debug,stash_cache=debug,info"
    } else {
        "stash=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("Invalid cache configuration")?;

    match cli.command {
        Commands::Scenario { tick_ms, lifetime } => cmd_scenario(config, tick_ms, lifetime).await,
        Commands::Race { callers, delay_ms } => cmd_race(config, callers, delay_ms).await,
        Commands::Bench { reads, keys, lifetime } => cmd_bench(config, reads, keys, lifetime).await,
    }
}

/// Replay the posts scenario in scaled real time
async fn cmd_scenario(config: CacheConfig, tick_ms: u64, lifetime_secs: u64) -> Result<()> {
    println!("{}", "📚 Posts scenario".cyan().bold());

    let cache: CacheHandle<Vec<String>> = CacheHandle::spawn(config)?;
    let posts = Key::from_static("posts");
    let tick = Duration::from_millis(tick_ms);
    let lifetime = Lifetime::from(tick * lifetime_secs as u32);
    let queries = AtomicUsize::new(0);

    println!("   {} {} simulated seconds ({:?} each)", "Lifetime:".dimmed(), lifetime_secs, tick);

    let mut elapsed = 0;
    for at in [0u64, 3, 7, 13] {
        tokio::time::sleep(tick * (at - elapsed) as u32).await;
        elapsed = at;

        let before = queries.load(Ordering::SeqCst);
        let rows = cache
            .get_or_compute(
                &posts,
                || {
                    let n = queries.fetch_add(1, Ordering::SeqCst) + 1;
                    vec![format!("A#{n}"), format!("B#{n}")]
                },
                lifetime,
            )
            .await?;

        let outcome = if queries.load(Ordering::SeqCst) > before {
            "miss → recomputed".yellow()
        } else {
            "hit".green()
        };
        println!("   t={:>2}  {:<18} {:?}", at, outcome, rows);
    }

    print_stats(&cache.stats().await?);
    Ok(())
}

/// Run concurrent misses against a cold key
async fn cmd_race(config: CacheConfig, callers: usize, delay_ms: u64) -> Result<()> {
    println!("{} {} callers", "🏁 Racing".cyan().bold(), callers);

    let cache: CacheHandle<u64> = CacheHandle::spawn(config)?;
    let computations = Arc::new(AtomicUsize::new(0));
    let key = Key::from_static("report");

    let tasks = (0..callers).map(|i| {
        let cache = cache.clone();
        let computations = computations.clone();
        let key = key.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute_async(
                    &key,
                    || async move {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        computations.fetch_add(1, Ordering::SeqCst);
                        i as u64
                    },
                    Lifetime::Infinite,
                )
                .await
        })
    });

    for result in futures::future::join_all(tasks).await {
        result.context("Caller task panicked")??;
    }

    let ran = computations.load(Ordering::SeqCst);
    println!("   {} {} of {} callers", "Computed by:".yellow(), ran, callers);
    if let Ok(winner) = cache.get_or_compute(&key, || 0, Lifetime::Infinite).await {
        println!("   {} value from caller #{}", "Cached:".dimmed(), winner);
    }
    println!("\n{}", "ℹ️  No single-flight: every concurrent miss computes, the last put wins.".cyan());

    Ok(())
}

/// Benchmark reads through the actor
async fn cmd_bench(
    config: CacheConfig,
    reads: usize,
    keys: usize,
    lifetime_secs: Option<f64>,
) -> Result<()> {
    let lifetime = match lifetime_secs {
        Some(secs) => Lifetime::try_from_secs_f64(secs).context("Invalid --lifetime")?,
        None => Lifetime::Infinite,
    };
    let keys = keys.max(1);

    println!("{} {} reads over {} keys ({})", "📊 Benchmarking".cyan().bold(), reads, keys, lifetime);

    let cache: CacheHandle<u64> = CacheHandle::spawn(config)?;
    info!(cache = cache.name(), "cache actor spawned");

    let key_set = (0..keys)
        .map(|i| Key::parse(&format!("query-{i}")))
        .collect::<stash_core::Result<Vec<_>>>()?;

    let pb = ProgressBar::new(reads as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    for i in 0..reads {
        let key = &key_set[i % keys];
        cache.get_or_compute(key, || i as u64, lifetime).await?;
        pb.inc(1);
    }
    pb.finish();
    let elapsed = start.elapsed();

    let rate = reads as f64 / elapsed.as_secs_f64();
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Read rate: {:.0} reads/sec", rate);
    println!("   Time per read: {:.2}µs", elapsed.as_micros() as f64 / reads.max(1) as f64);

    print_stats(&cache.stats().await?);
    Ok(())
}

fn print_stats(stats: &CacheStats) {
    println!("\n{}", "Stats (JSON):".yellow().bold());
    match serde_json::to_string_pretty(stats) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("   {} {}", "could not encode stats:".red(), e),
    }
    println!("   {} {:.1}%", "Hit ratio:".dimmed(), stats.hit_ratio() * 100.0);
}
