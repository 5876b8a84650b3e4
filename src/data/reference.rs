//! Compiled-in reference dataset.
//!
//! Ten unit-cell volume measurements between 20 K and 270 K for a 24-atom cell.
//! The Boltzmann constant is a calibration value in the same (unspecified)
//! length/energy units as the volumes.

use crate::domain::DatasetConfig;

pub const REFERENCE_TEMPERATURES: [f64; 10] =
    [270.0, 240.0, 210.0, 170.0, 130.0, 90.0, 70.0, 50.0, 30.0, 20.0];

pub const REFERENCE_VOLUMES: [f64; 10] = [
    587.613, 587.246, 586.94, 586.649, 586.416, 586.134, 586.107, 586.055, 586.083, 586.065,
];

pub const REFERENCE_ATOM_COUNT: u32 = 24;

pub const REFERENCE_BOLTZMANN: f64 = 1.38e7;

/// `(theta_D, gamma/B0, V0)`.
pub const REFERENCE_INITIAL_GUESS: [f64; 3] = [200.0, 1e-10, 586.15];

pub fn reference_dataset() -> DatasetConfig {
    DatasetConfig {
        temperatures: REFERENCE_TEMPERATURES.to_vec(),
        volumes: REFERENCE_VOLUMES.to_vec(),
        atom_count: REFERENCE_ATOM_COUNT,
        boltzmann_constant: REFERENCE_BOLTZMANN,
        initial_guess: REFERENCE_INITIAL_GUESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_dataset_validates() {
        let dataset = reference_dataset().validate().unwrap();
        assert_eq!(dataset.measurements.len(), 10);
        assert_eq!(dataset.measurements.temperature_range(), (20.0, 270.0));
        assert!((dataset.constants.nkb() - 3.312e8).abs() < 1e-3);
        assert_eq!(dataset.initial_guess.theta_d, 200.0);
    }
}
