//! Bunch charge profile and longitudinal loss factor.

use crate::error::{DspError, DspResult};
use lib_types::units::{Coulombs, Meters};
use lib_types::wake::{ChargeDistribution, WakePotential};

/// Gaussian charge distribution sampled on the wake's offset axis.
pub fn charge_distribution(wake: &WakePotential, charge: Coulombs, sigma_z: Meters) -> DspResult<ChargeDistribution> {
    if !(sigma_z.0 > 0.0) || !sigma_z.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "bunch length sigma_z must be positive, got {} m",
            sigma_z.0
        )));
    }
    if charge.0 == 0.0 || !charge.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "bunch charge must be finite and non-zero, got {} C",
            charge.0
        )));
    }
    Ok(ChargeDistribution::gaussian(&wake.s, charge, sigma_z))
}

/// Loss factor `k = -sum(lambda_norm * W * ds)` [V/pC].
///
/// A decelerating wake under the bunch gives a positive loss factor.
pub fn loss_factor(lambda: &ChargeDistribution, wake: &WakePotential) -> DspResult<f64> {
    if lambda.len() != wake.len() {
        return Err(DspError::malformed(
            "charge distribution",
            format!("{} samples for a wake of {} samples", lambda.len(), wake.len()),
        ));
    }
    let ds = wake
        .ds()
        .ok_or(DspError::InsufficientData { needed: 3, got: wake.len() })?
        .0;
    if !(ds > 0.0) {
        return Err(DspError::malformed("offset axis", format!("step ds = {} must be positive", ds)));
    }

    let sum: f64 = lambda
        .normalized()
        .iter()
        .zip(wake.values.iter())
        .map(|(l, w)| l * w * ds)
        .sum();
    let k = -sum;

    tracing::info!("Loss factor k = {:.3e} V/pC", k);
    Ok(k)
}
