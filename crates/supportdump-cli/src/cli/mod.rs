pub mod args;

use crate::exit_codes;
use anyhow::Context;
use args::Cli;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use supportdump_core::{
    interlock_configs, run_dump, DirWalker, DumpConfig, PayloadSource, TracingLog,
};

/// Merge the optional config file with command line overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<DumpConfig> {
    let mut cfg = match &cli.config {
        Some(path) => DumpConfig::load(path)?,
        None => DumpConfig::default(),
    };

    if let Some(dir) = &cli.output_dir {
        cfg.output_dir = dir.clone();
    }
    if let Some(prefix) = &cli.prefix {
        cfg.prefix = prefix.clone();
    }
    if let Some(capacity) = cli.capacity {
        cfg.channel_capacity = capacity;
    }
    if let Some(level) = cli.level {
        cfg.compression_level = level;
    }
    if let Some(policy) = cli.on_failure {
        cfg.on_failure = policy.into();
    }
    if cli.no_sample_configs {
        cfg.include_sample_configs = false;
    }

    cfg.validate()
        .map_err(anyhow::Error::msg)
        .context("invalid options")?;
    Ok(cfg)
}

/// Map each include dir to `files/<dir name>`. Dirs sharing a name get
/// `files/<dir name>-2`, `-3` and so on, so their entries never collide.
fn dir_walkers(dirs: &[PathBuf]) -> Vec<DirWalker> {
    let mut taken = HashSet::new();
    dirs.iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("root");
            let mut prefix = format!("files/{}", name);
            let mut n = 1;
            while !taken.insert(prefix.clone()) {
                n += 1;
                prefix = format!("files/{}-{}", name, n);
            }
            DirWalker::new(dir, &prefix)
        })
        .collect()
}

pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let cfg = resolve_config(&cli)?;

    let samples = interlock_configs();
    let walkers = dir_walkers(&cli.include_dirs);

    let mut sources: Vec<&dyn PayloadSource> = Vec::new();
    if cfg.include_sample_configs {
        sources.push(&samples);
    }
    for walker in &walkers {
        sources.push(walker);
    }

    tracing::debug!(
        output_dir = %cfg.output_dir.display(),
        sources = sources.len(),
        "starting support dump"
    );

    match run_dump(&cfg, &sources, Arc::new(TracingLog)).await {
        Ok(report) => {
            tracing::info!(
                entries = report.entries,
                bytes = report.bytes,
                "support dump written"
            );
            println!("{}", report.path.display());
            Ok(exit_codes::SUCCESS)
        }
        Err(e) if e.is_setup() => {
            eprintln!("error: {}", e);
            Ok(exit_codes::SETUP_ERROR)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(exit_codes::DUMP_FAILED)
        }
    }
}
