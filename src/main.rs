mod config; // brings `config.rs` in as `crate::config`

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ev3_tacho::{Sysfs, SysfsPortResolver, TachoMotor};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = config::load_config().context("loading configuration")?;
    let port = settings.get_string("motor.port").unwrap_or_default();
    let driver = settings
        .get_string("motor.driver")
        .context("motor.driver is required")?;
    let root = settings
        .get_string("sysfs.root")
        .unwrap_or_else(|_| Sysfs::DEFAULT_ROOT.to_owned());

    let store = Arc::new(Sysfs::new(root));
    let resolver = SysfsPortResolver::new(Arc::clone(&store));
    let (motor, mismatch) = TachoMotor::find(store, &resolver, &port, &driver)
        .context("resolving motor")?;
    if let Some(mismatch) = mismatch {
        warn!(want = %mismatch.want, have = %mismatch.have, "resolved motor reports a different driver");
    }

    info!(motor = %motor.id(), "motor resolved");
    info!(address = %motor.address()?, driver = %motor.driver()?);
    info!(
        state = ?motor.state()?,
        position = motor.position()?,
        duty_cycle = motor.duty_cycle()?,
        speed = motor.speed()?,
        "motor status"
    );
    Ok(())
}
