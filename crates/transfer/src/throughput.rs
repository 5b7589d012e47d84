//! Sources for the simulated link speed assigned to each session.

use rand::Rng;

/// Picks the throughput of a new session, in bytes per second.
pub trait ThroughputSource: Send + Sync {
    /// Returns a value within `min..=max`.
    fn draw(&self, min: f64, max: f64) -> f64;
}

/// Uniform random draw, one per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformThroughput;

impl ThroughputSource for UniformThroughput {
    fn draw(&self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Always returns the same throughput, ignoring the configured range.
#[derive(Debug, Clone, Copy)]
pub struct FixedThroughput(pub f64);

impl ThroughputSource for FixedThroughput {
    fn draw(&self, _min: f64, _max: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let source = UniformThroughput;
        for _ in 0..1000 {
            let v = source.draw(50.0, 200.0);
            assert!((50.0..=200.0).contains(&v));
        }
    }

    #[test]
    fn uniform_degenerate_range() {
        assert_eq!(UniformThroughput.draw(75.0, 75.0), 75.0);
    }

    #[test]
    fn fixed_ignores_range() {
        assert_eq!(FixedThroughput(42.0).draw(50.0, 200.0), 42.0);
    }
}
