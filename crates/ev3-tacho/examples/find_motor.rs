//! Resolve the first connected large motor and print its status.

use std::sync::Arc;

use ev3_tacho::{Error, Sysfs, SysfsPortResolver, TachoMotor};

fn main() -> Result<(), Error> {
    let store = Arc::new(Sysfs::default());
    let resolver = SysfsPortResolver::new(Arc::clone(&store));

    let (motor, mismatch) = TachoMotor::find(store, &resolver, "", "lego-ev3-l-motor")?;
    if let Some(mismatch) = mismatch {
        eprintln!("warning: {mismatch}");
    }

    println!("motor {} at {}", motor.id(), motor.address()?);
    println!("driver:   {}", motor.driver()?);
    println!("state:    {:?}", motor.state()?);
    println!("position: {}", motor.position()?);
    Ok(())
}
