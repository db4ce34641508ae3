//! Jitter port: source of the bounded noise added to fallback estimates.

/// Supplies jitter for the fallback estimator.
pub trait JitterSource: Send + Sync {
    /// Draw a value in `[-5.0, 5.0)`.
    fn sample(&self) -> f64;
}
