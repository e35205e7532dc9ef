use rand::Rng;

use crate::geo::normalize_degrees;

/// `nominal` plus uniform noise within `±fraction * |nominal|`.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, nominal: f64, fraction: f64) -> f64 {
    let band = nominal.abs() * fraction;
    if band.is_nan() || band <= 0.0 {
        return nominal;
    }
    nominal + rng.gen_range(-band..=band)
}

pub fn jitter_non_negative<R: Rng + ?Sized>(rng: &mut R, nominal: f64, fraction: f64) -> f64 {
    jitter(rng, nominal, fraction).max(0.0)
}

/// Angular jitter with an absolute band in degrees, wrapped into `[0, 360)`.
pub fn jitter_angle<R: Rng + ?Sized>(rng: &mut R, degrees: f64, band: f64) -> f64 {
    if band.is_nan() || band <= 0.0 {
        return normalize_degrees(degrees);
    }
    normalize_degrees(degrees + rng.gen_range(-band..=band))
}

/// Slowly wandering baseline: a bounded random walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    value: f64,
    step: f64,
    bounds: DriftBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DriftBounds {
    Clamped { min: f64, max: f64 },
    Circular,
}

impl Drift {
    pub fn clamped(initial: f64, step: f64, min: f64, max: f64) -> Self {
        Self {
            value: initial.clamp(min, max),
            step,
            bounds: DriftBounds::Clamped { min, max },
        }
    }

    pub fn circular(initial: f64, step: f64) -> Self {
        Self {
            value: normalize_degrees(initial),
            step,
            bounds: DriftBounds::Circular,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let delta = if self.step > 0.0 {
            rng.gen_range(-self.step..=self.step)
        } else {
            0.0
        };

        self.value = match self.bounds {
            DriftBounds::Clamped { min, max } => (self.value + delta).clamp(min, max),
            DriftBounds::Circular => normalize_degrees(self.value + delta),
        };
        self.value
    }
}
