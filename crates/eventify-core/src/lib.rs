pub mod auth;
pub mod calendar;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod draft;
pub mod event;
pub mod filter;
pub mod reminder;
pub mod render;
pub mod session;
pub mod wizard;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting eventify CLI"
    );

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );
    debug!(files = ?cfg.loaded_files, "configuration loaded");

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = datastore::DataStore::open(&data_dir).with_context(|| {
        format!("failed to open datastore at {}", data_dir.display())
    })?;
    let sessions = session::SessionStore::open(&data_dir);

    let mut catalog = catalog::MockEventSource::seeded();
    let auth = auth::MockAuth::new();

    let mut renderer = render::Renderer::new(&cfg)?;
    let inv = cli::Invocation::parse(&cfg, cli.rest)?;

    commands::dispatch(
        &store,
        &sessions,
        &mut catalog,
        &auth,
        &cfg,
        &mut renderer,
        inv,
    )?;

    info!("done");
    Ok(())
}
