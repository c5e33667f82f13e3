pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod render;
pub mod statefile;
pub mod store;
pub mod tabs;
pub mod task;
pub mod theme;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting slate");

    let mut cfg = config::Config::load(cli.slaterc.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    debug!(data_dir = %data_dir.display(), "resolved data directory");

    let file = statefile::StateFile::open(data_dir.join("state.json"));
    let prefix = cfg
        .get("task.prefix")
        .unwrap_or_else(|| "SLT".to_string());
    let mut store = store::Store::open(file, prefix);

    let mut renderer = render::Renderer::new(&cfg)?;
    let inv = cli::Invocation::parse(&cfg, cli.rest)?;

    commands::dispatch(&mut store, &cfg, &mut renderer, inv)?;

    info!("done");
    Ok(())
}
