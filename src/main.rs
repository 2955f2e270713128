use anyhow::Context;
use gpu_life::{LifeApp, LifeConfig};

fn main() -> anyhow::Result<()> {
    gpu_life::logging::init();

    let config = LifeConfig::default();
    LifeApp::new(config)
        .context("invalid configuration")?
        .run()
        .context("game of life terminated")?;
    Ok(())
}
