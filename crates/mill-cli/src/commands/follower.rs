use anyhow::{Context, Result};
use mill_algo::{build_responder, leader_revenue, FollowerStrategy};
use mill_cli::{FollowerArgs, MillConfig};
use mill_core::{PriceVector, Side};
use mill_io::{read_instance, write_json};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Follower response output format
#[derive(Debug, Serialize)]
struct FollowerReport {
    method: String,
    leader_prices: PriceVector,
    follower_prices: PriceVector,
    follower_revenue: i64,
    leader_revenue: i64,
    solve_time_ms: u64,
}

pub fn handle(args: &FollowerArgs, mut config: MillConfig) -> Result<()> {
    config.apply_input(&args.input);
    let method = FollowerStrategy::from_str(&args.method)?;
    let seed = args.seed.unwrap_or(config.coordinator.seed);

    let instance = read_instance(&args.instance, &config.input)?;
    instance
        .check_prices(Side::Leader, &args.leader_prices)
        .context("invalid --leader-prices")?;

    let solver = config.solver.build_solver();
    let responder = build_responder(method, &instance, solver.as_ref(), &config.coordinator);

    let started = Instant::now();
    let response = responder
        .respond(&args.leader_prices, seed)
        .with_context(|| format!("{} follower response", method.as_str()))?;
    let elapsed = started.elapsed();
    let leader = leader_revenue(&instance, &args.leader_prices, &response.prices);

    println!("Follower prices: {}", response.prices);
    println!("Follower revenue: {}", response.revenue);
    println!("Leader revenue: {}", leader);

    if let Some(out) = &args.out {
        let report = FollowerReport {
            method: method.as_str().to_string(),
            leader_prices: PriceVector::from(args.leader_prices.clone()),
            follower_prices: response.prices,
            follower_revenue: response.revenue,
            leader_revenue: leader,
            solve_time_ms: elapsed.as_millis() as u64,
        };
        write_json(out, &report)?;
        info!("Response written to {}", out.display());
    }
    Ok(())
}
