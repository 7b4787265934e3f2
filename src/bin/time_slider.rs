use anyhow::Result;
use shopreport::{config::Config, logging, report, sink::ArtifactSink, source::DataSource};
use tracing::info;

fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env();
    let ds = DataSource::open(&config)?;
    let sink = ArtifactSink::from_config(&config);

    let artifact = report::run_time_slider(&ds, &sink)?;
    info!(file = %artifact.path.display(), "open the page in a browser to scrub through months");

    ds.close()
}
