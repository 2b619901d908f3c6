//! Load generator for a running avgstore server.
//!
//! Usage: benchmark [base_url] [requests] [concurrency]
//! Defaults: http://127.0.0.1:8080 10000 32

use futures::future::join_all;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const ACTIONS: &[&str] = &["jump", "run", "walk", "crawl", "swim", "climb", "roll", "dive"];

fn fast_random(seed: &mut u64) -> u64 {
    *seed ^= *seed << 13;
    *seed ^= *seed >> 7;
    *seed ^= *seed << 17;
    *seed
}

fn generate_submission(seed: &mut u64) -> String {
    json!({
        "action": ACTIONS[fast_random(seed) as usize % ACTIONS.len()],
        "time": 10 + (fast_random(seed) % 490) as i64,
    })
    .to_string()
}

#[derive(Default)]
struct Tally {
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

async fn run_worker(
    client: Client,
    base_url: Arc<String>,
    requests: usize,
    mut seed: u64,
    tally: Arc<Tally>,
) {
    let url = format!("{}/actions", base_url);

    for _ in 0..requests {
        let body = generate_submission(&mut seed);
        match client.post(&url).body(body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tally.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                tally.rejected.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                tally.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let total: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let concurrency: usize = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(32)
        .max(1);

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(concurrency)
        .build()?;

    let health: Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("Server: {}", health);
    println!(
        "Sending {} submissions with concurrency {} to {}",
        total, concurrency, base_url
    );

    let base_url = Arc::new(base_url);
    let tally = Arc::new(Tally::default());
    let per_worker = total / concurrency;
    let remainder = total % concurrency;

    let start = Instant::now();
    let workers = (0..concurrency).map(|i| {
        let requests = per_worker + usize::from(i < remainder);
        tokio::spawn(run_worker(
            client.clone(),
            Arc::clone(&base_url),
            requests,
            0x9E37_79B9_7F4A_7C15 ^ (i as u64 + 1),
            Arc::clone(&tally),
        ))
    });

    for result in join_all(workers).await {
        result?;
    }
    let elapsed = start.elapsed();

    let accepted = tally.accepted.load(Ordering::Relaxed);
    println!();
    println!("Completed in {:.2?}", elapsed);
    println!(
        "  accepted: {}  rejected: {}  failed: {}",
        accepted,
        tally.rejected.load(Ordering::Relaxed),
        tally.failed.load(Ordering::Relaxed)
    );
    println!(
        "  throughput: {:.0} req/s",
        total as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    // Give the aggregator a moment to settle before reading counters
    tokio::time::sleep(Duration::from_millis(200)).await;

    let counters: Value = client
        .get(format!("{}/stats/counters", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!();
    println!("Server counters: {}", serde_json::to_string_pretty(&counters)?);

    let report = client
        .get(format!("{}/stats", base_url))
        .send()
        .await?
        .text()
        .await?;
    println!("Averages: {}", report);

    Ok(())
}
