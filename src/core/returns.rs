use std::f64::consts::PI;

use rand::Rng;

pub const ANNUAL_RETURN_STANDARD_DEVIATION: f64 = 0.10;

pub fn volatile_return<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return mean;
    }
    mean + standard_normal(rng) * std_dev
}

// Box-Muller.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u = open_unit(rng);
    let v = open_unit(rng);
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}

// ln(0) is undefined, so zero draws are rejected.
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.random();
        if u != 0.0 {
            return u;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FixedRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SAMPLES: usize = 10_000;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn draw_samples(mean: f64, std_dev: f64, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..SAMPLES)
            .map(|_| volatile_return(&mut rng, mean, std_dev))
            .collect()
    }

    fn moments(samples: &[f64]) -> (f64, f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let skew = samples
            .iter()
            .map(|x| ((x - mean) / std_dev).powi(3))
            .sum::<f64>()
            / n;
        (mean, std_dev, skew)
    }

    #[test]
    fn half_uniform_draws_give_regression_value() {
        let mut rng = FixedRng::constant(0.5);
        let value = volatile_return(&mut rng, 0.07, 0.10);
        assert_approx_tol(value, -0.04774100225154747, 1e-12);
    }

    #[test]
    fn zero_uniform_draws_are_redrawn() {
        let mut rng = FixedRng::sequence(&[0.0, 0.5, 0.0, 0.5]);
        let value = volatile_return(&mut rng, 0.07, 0.10);
        assert_approx_tol(value, -0.04774100225154747, 1e-12);
        assert_eq!(rng.draws(), 4);
    }

    #[test]
    fn zero_std_dev_returns_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(volatile_return(&mut rng, 0.05, 0.0), 0.05);
        }
    }

    #[test]
    fn sample_moments_match_parameters() {
        let samples = draw_samples(0.07, 0.10, 42);
        let (mean, std_dev, skew) = moments(&samples);
        assert_approx_tol(mean, 0.07, 0.005);
        assert_approx_tol(std_dev, 0.10, 0.005);
        assert_approx_tol(skew, 0.0, 0.1);
    }

    #[test]
    fn samples_follow_empirical_rule() {
        let (mean, std_dev) = (0.05, 0.15);
        let samples = draw_samples(mean, std_dev, 7);
        let within = |k: f64| {
            samples
                .iter()
                .filter(|x| (*x - mean).abs() <= k * std_dev)
                .count() as f64
                / SAMPLES as f64
        };

        assert_approx_tol(within(1.0), 0.6827, 0.02);
        assert_approx_tol(within(2.0), 0.9545, 0.01);
        assert!(within(3.0) >= 0.99);
    }
}
