use anyhow::{Context, Result};
use mill_algo::{BilevelCoordinator, BilevelSolution};
use mill_cli::{MillConfig, SolveArgs};
use mill_io::{read_instance, write_json};
use tracing::info;

use crate::commands::util::apply_search;

pub fn handle(args: &SolveArgs, mut config: MillConfig) -> Result<()> {
    config.apply_input(&args.input);
    apply_search(&mut config, &args.search)?;

    let instance = read_instance(&args.instance, &config.input)?;
    info!(
        instance = %args.instance.display(),
        strategy = config.coordinator.strategy.as_str(),
        solver = config.solver.as_str(),
        "solving"
    );

    let solver = config.solver.build_solver();
    let solution = BilevelCoordinator::new(&instance, solver.as_ref(), &config.coordinator)
        .solve()
        .with_context(|| format!("solving {}", args.instance.display()))?;

    print_solution(&solution);

    if let Some(out) = &args.out {
        write_json(out, &solution)?;
        info!("Solution written to {}", out.display());
    }
    Ok(())
}

fn print_solution(solution: &BilevelSolution) {
    println!("Leader prices: {}", solution.leader_prices);
    println!("Follower prices: {}", solution.follower_prices);
    println!("Leader revenue: {}", solution.leader_revenue);
    println!("Follower revenue: {}", solution.follower_revenue);
    println!(
        "Iterations: {} ({} follower evaluations)",
        solution.iterations, solution.follower_evaluations
    );
    if let Some(check) = &solution.exact_check {
        println!("Exact follower prices: {}", check.follower_prices);
        println!(
            "Exact follower revenue: {} (gap {})",
            check.follower_revenue, check.follower_gap
        );
    }
    println!("Result: {}", solution.reported_revenue());
    println!("Time: {:.3}", solution.elapsed_secs);
}
