//! Runs a reduced configuration sweep and prints the availability matrix.
//!
//! The full study sweeps 1..=20 machines against 1..=20 dryers over a
//! thousand days each; this demo keeps the grid and day count small so
//! it finishes in seconds.

use laundrette::{SimulationConfig, SweepDriver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SimulationConfig {
        simulation_days: 100,
        ..SimulationConfig::default()
    };

    let driver = SweepDriver::new(config)?
        .with_grid(1..=6, 1..=6)?
        .with_base_seed(42);

    let matrix = driver.run()?;
    println!("availability in % by appliance counts");
    println!("{matrix}");
    Ok(())
}
