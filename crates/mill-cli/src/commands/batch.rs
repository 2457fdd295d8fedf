use anyhow::{bail, Context, Result};
use mill_algo::BilevelCoordinator;
use mill_cli::{BatchArgs, MillConfig};
use mill_io::{read_instance, write_json, write_records, RunRecord};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::commands::util::apply_search;

pub fn handle(args: &BatchArgs, mut config: MillConfig) -> Result<()> {
    config.apply_input(&args.input);
    apply_search(&mut config, &args.search)?;

    let files = instance_files(&args.dir, &[Some(args.out.as_path()), args.json.as_deref()])?;
    if files.is_empty() {
        bail!("no instance files in {}", args.dir.display());
    }
    info!(
        instances = files.len(),
        strategy = config.coordinator.strategy.as_str(),
        "batch started"
    );

    let solver = config.solver.build_solver();
    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        let instance = match read_instance(path, &config.input) {
            Ok(instance) => instance,
            Err(err) => {
                warn!("skipping {}: {:#}", path.display(), err);
                continue;
            }
        };

        let started = Instant::now();
        let solution = BilevelCoordinator::new(&instance, solver.as_ref(), &config.coordinator)
            .solve()
            .with_context(|| format!("solving {}", path.display()))?;
        let record = RunRecord::new(
            path.display().to_string(),
            solution.reported_revenue(),
            started.elapsed().as_secs_f64(),
        );
        println!("{}", record);
        records.push(record);
        write_records(&args.out, &records)?;
    }

    if records.is_empty() {
        bail!("no instance in {} could be read", args.dir.display());
    }
    if let Some(json) = &args.json {
        write_json(json, &records)?;
    }
    info!(
        solved = records.len(),
        report = %args.out.display(),
        "batch finished"
    );
    Ok(())
}

/// Regular files directly inside `dir`, sorted by name, minus the report outputs.
fn instance_files(dir: &Path, outputs: &[Option<&Path>]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if outputs.iter().flatten().any(|out| *out == path.as_path()) {
            continue;
        }
        files.push(path);
    }
    Ok(files)
}
