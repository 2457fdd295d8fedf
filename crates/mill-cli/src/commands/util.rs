use mill_cli::{MillConfig, SearchArgs};
use rayon::ThreadPoolBuilder;
use tracing::debug;

/// Size the global rayon pool. Unparseable counts fall back to all cores.
pub fn configure_threads(requested: &str) -> usize {
    let count = if requested.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        requested.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
    count
}

/// Apply the search flags, sizing the pool when `--threads` is given.
pub fn apply_search(config: &mut MillConfig, args: &SearchArgs) -> anyhow::Result<()> {
    config.apply_search(args)?;
    if let Some(requested) = &args.threads {
        let threads = configure_threads(requested);
        config.coordinator.leader_vnd.parallel = threads > 1;
        debug!(
            threads,
            parallel = config.coordinator.leader_vnd.parallel,
            "thread pool configured"
        );
    }
    Ok(())
}
