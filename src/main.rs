use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

mod cli;
mod consolidate;
mod model;
mod naming;
mod planner;
mod runner;
mod store;
mod util;
mod weeks;

use crate::cli::{normalize, Cli};
use crate::store::Store;

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Logs to stderr; stdout carries only the JSON run summary.
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::from_default_env().add_directive("log_report_builder=info".parse()?),
    )
    .with_writer(std::io::stderr)
    .init();

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;

  // Phase 2: resolve now and open the store
  let now = util::effective_now(util::parse_now_override(cfg.now_override.as_deref())?);
  let store = Store::open(&cfg.db)?;

  // Phase 3: run the consolidation and report
  let summary = runner::process_run(&cfg, &store, now)?;
  println!("{}", serde_json::to_string_pretty(&summary)?);

  info!(
    created = summary.created_tables(),
    failed = summary.failed_tables(),
    "run complete"
  );
  if summary.failed_tables() > 0 {
    bail!("{} base name(s) failed to consolidate", summary.failed_tables());
  }
  Ok(())
}
