//! Pause policies applied after each send and between companies.

use std::time::Duration;

use rand_distr::{Distribution, Uniform};

/// Source of pause lengths. Called once per pause.
pub trait DelayPolicy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random pause in `[min, max]` seconds.
#[derive(Debug, Clone)]
pub struct RandomDelay {
    min_secs: f64,
    dist: Option<Uniform<f64>>,
}

impl RandomDelay {
    /// Bounds are clamped to be non-negative and swapped if reversed.
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let (lo, hi) = {
            let (a, b) = (clean(min_secs), clean(max_secs));
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        let dist = if hi > lo {
            Uniform::new_inclusive(lo, hi).ok()
        } else {
            None
        };
        Self { min_secs: lo, dist }
    }

    pub fn from_bounds(bounds: (f64, f64)) -> Self {
        Self::new(bounds.0, bounds.1)
    }
}

impl DelayPolicy for RandomDelay {
    fn next_delay(&self) -> Duration {
        let secs = match &self.dist {
            Some(dist) => {
                let mut rng = rand::rng();
                dist.sample(&mut rng)
            }
            None => self.min_secs,
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Always the same pause.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelayPolicy for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// No pause at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayPolicy for NoDelay {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_stays_in_bounds() {
        let policy = RandomDelay::new(5.0, 10.0);
        for _ in 0..200 {
            let d = policy.next_delay().as_secs_f64();
            assert!((5.0..=10.0).contains(&d), "delay {} out of bounds", d);
        }
    }

    #[test]
    fn test_random_delay_swaps_reversed_bounds() {
        let policy = RandomDelay::from_bounds((20.0, 10.0));
        for _ in 0..50 {
            let d = policy.next_delay().as_secs_f64();
            assert!((10.0..=20.0).contains(&d));
        }
    }

    #[test]
    fn test_random_delay_degenerate_bounds() {
        assert_eq!(RandomDelay::new(3.0, 3.0).next_delay(), Duration::from_secs(3));
        assert_eq!(RandomDelay::new(-4.0, -1.0).next_delay(), Duration::ZERO);
        assert_eq!(RandomDelay::new(f64::NAN, 0.0).next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_fixed_and_no_delay() {
        assert_eq!(FixedDelay(Duration::from_millis(7)).next_delay(), Duration::from_millis(7));
        assert_eq!(NoDelay.next_delay(), Duration::ZERO);
    }
}
