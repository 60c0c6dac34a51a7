//! Shared numeric helpers
//!
//! Online mean/variance (Welford) and vector magnitude, shared by both
//! stream processors. All summaries degrade to 0 on empty input rather than
//! producing NaN.

/// Euclidean norm of a 3-axis vector sample
pub fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    (x * x + y * y + z * z).sqrt()
}

/// Single-pass mean/variance/max accumulator (Welford's method).
///
/// Variance is population variance (summed squared deviations divided by N,
/// not N − 1). `population_std_dev` returns 0 for fewer than two samples;
/// `mean` and `max` return 0 when empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate over a sample slice
    pub fn from_samples(samples: &[f32]) -> Self {
        let mut stats = Self::new();
        for &sample in samples {
            stats.push(sample);
        }
        stats
    }

    /// Fold one sample into the accumulator
    pub fn push(&mut self, sample: f32) {
        let value = f64::from(sample);
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean (0 if empty)
    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.mean as f32
        }
    }

    /// Maximum sample (0 if empty)
    pub fn max(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.max as f32
        }
    }

    /// Population standard deviation, dividing by N (0 for < 2 samples)
    pub fn population_std_dev(&self) -> f32 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / self.count as f64).sqrt() as f32
    }
}
