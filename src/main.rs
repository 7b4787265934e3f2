use anyhow::{bail, Result};
use shopreport::{
    config::Config,
    logging,
    report::{self, failures},
    sink::ArtifactSink,
    source::DataSource,
};
use std::time::Instant;
use tracing::{error, info};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();
    info!("startup");
    let start = Instant::now();

    // ─── 2) configuration & data source ──────────────────────────────
    let config = Config::from_env();
    let ds = DataSource::open(&config)?;
    let sink = ArtifactSink::from_config(&config);

    // ─── 3) six charts + export ──────────────────────────────────────
    let outcomes = report::run_default(&ds, &sink);
    let failed_names: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.name.as_str())
        .collect();

    // ─── 4) shutdown ─────────────────────────────────────────────────
    ds.close()?;
    let failed = failures(&outcomes);
    info!(
        reports = outcomes.len(),
        failed,
        elapsed = ?start.elapsed(),
        "all done"
    );
    if failed > 0 {
        error!(reports = ?failed_names, "some reports failed");
        bail!("{} of {} reports failed", failed, outcomes.len());
    }
    Ok(())
}
