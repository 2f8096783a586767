//! Sampling strategies injected into components.
//!
//! Every sampler is a closure over the owning component's private
//! `ChaCha8Rng`, so a fixed seed reproduces the same sequence no matter
//! what other components draw.

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Uniform};

use crate::error::{SimError, SimResult};

/// Draws the delay until the next arrival.
pub type InterArrivalSampler = Box<dyn FnMut(&mut ChaCha8Rng) -> f64>;

/// Builds the next load.
pub type LoadFactory<L> = Box<dyn FnMut(&mut ChaCha8Rng) -> L>;

/// Draws the service duration for a load.
pub type ServiceTimeSampler<L> = Box<dyn FnMut(&L, &mut ChaCha8Rng) -> f64>;

/// Always returns `value`.
pub fn constant(value: f64) -> impl FnMut(&mut ChaCha8Rng) -> f64 + Clone {
    move |_rng: &mut ChaCha8Rng| value
}

/// Uniform on `[low, high)`; degenerates to `low` when the bounds match.
pub fn uniform(low: f64, high: f64) -> SimResult<impl FnMut(&mut ChaCha8Rng) -> f64 + Clone> {
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(SimError::out_of_range(
            "uniform bounds",
            format!("need finite low <= high, got [{}, {})", low, high),
        ));
    }
    let dist = (low < high).then(|| Uniform::new(low, high));
    Ok(move |rng: &mut ChaCha8Rng| match &dist {
        Some(dist) => dist.sample(rng),
        None => low,
    })
}

/// Exponential with the given mean.
pub fn exponential(mean: f64) -> SimResult<impl FnMut(&mut ChaCha8Rng) -> f64 + Clone> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(SimError::out_of_range(
            "exponential mean",
            format!("must be finite and positive, got {}", mean),
        ));
    }
    let dist = Exp::new(1.0 / mean)
        .map_err(|e| SimError::out_of_range("exponential mean", format!("{} ({})", e, mean)))?;
    Ok(move |rng: &mut ChaCha8Rng| dist.sample(rng))
}

/// Load factory yielding `start, start + 1, ...` without touching the stream.
pub fn sequence(start: u64) -> impl FnMut(&mut ChaCha8Rng) -> u64 {
    let mut next = start;
    move |_rng: &mut ChaCha8Rng| {
        let id = next;
        next += 1;
        id
    }
}
