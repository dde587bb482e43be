use rand::Rng;
use tracing::info;

use crate::errors::ForecastError;
use crate::models::{SimulationMode, SimulationPoint, SimulationResult};

/// Largest fractional move per day in `Percent` mode
pub const MAX_PERCENT_STEP: f64 = 0.02;
/// Largest absolute move per day in `Absolute` mode
pub const MAX_ABSOLUTE_STEP: f64 = 5.0;
pub const MAX_SIMULATION_DAYS: usize = 3650;

pub fn validate_simulation(initial_price: f64, days: usize) -> Result<(), ForecastError> {
    if !initial_price.is_finite() || initial_price <= 0.0 {
        return Err(ForecastError::InvalidInput(format!(
            "initial price must be positive, got {}",
            initial_price
        )));
    }
    if days == 0 || days > MAX_SIMULATION_DAYS {
        return Err(ForecastError::InvalidInput(format!(
            "days must be between 1 and {}, got {}",
            MAX_SIMULATION_DAYS, days
        )));
    }
    Ok(())
}

/// Random-walk price path of `days` steps starting from `initial_price`.
///
/// Steps are drawn uniformly; `Absolute` steps are not floored, so a path
/// started near zero can go negative.
pub fn simulate<R: Rng + ?Sized>(
    rng: &mut R,
    initial_price: f64,
    days: usize,
    mode: SimulationMode,
) -> Result<SimulationResult, ForecastError> {
    validate_simulation(initial_price, days)?;

    let mut current = initial_price;
    let mut points = Vec::with_capacity(days + 1);
    points.push(SimulationPoint {
        day: 0,
        price: current,
    });

    for day in 1..=days {
        current = match mode {
            SimulationMode::Percent => {
                current * (1.0 + rng.random_range(-MAX_PERCENT_STEP..MAX_PERCENT_STEP))
            }
            SimulationMode::Absolute => {
                current + rng.random_range(-MAX_ABSOLUTE_STEP..MAX_ABSOLUTE_STEP)
            }
        };
        points.push(SimulationPoint {
            day,
            price: current,
        });
    }

    info!(
        "Simulated {} day(s) in {:?} mode: {:.2} -> {:.2}",
        days, mode, initial_price, current
    );

    Ok(SimulationResult {
        mode,
        initial_price,
        final_price: current,
        points,
    })
}
