//! Reader configuration.

/// Closeness test used to match a requested time against recorded samples.
///
/// Two times `a` and `t` match when `|a - t| <= atol + rtol * |t|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeTolerance {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
}

impl TimeTolerance {
    /// Exact comparison.
    pub const EXACT: Self = Self { rtol: 0.0, atol: 0.0 };

    /// Check whether `recorded` matches `requested`.
    pub fn is_close(&self, recorded: f64, requested: f64) -> bool {
        (recorded - requested).abs() <= self.atol + self.rtol * requested.abs()
    }
}

impl Default for TimeTolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

/// Configuration shared by single-file and multi-file readers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderConfig {
    /// Tolerance for locating a time within one file's samples.
    pub time_tolerance: TimeTolerance,
    /// Widening applied to both ends of each file's time range when
    /// selecting the files that cover a requested time.
    pub range_tolerance: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            time_tolerance: TimeTolerance::default(),
            range_tolerance: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerance_absorbs_float_noise() {
        let tol = TimeTolerance::default();
        assert!(tol.is_close(0.1 + 0.2, 0.3));
        assert!(tol.is_close(1000.0, 1000.005));
        assert!(!tol.is_close(1.0, 1.1));
    }

    #[test]
    fn exact_tolerance_requires_equality() {
        assert!(TimeTolerance::EXACT.is_close(2.0, 2.0));
        assert!(!TimeTolerance::EXACT.is_close(0.1 + 0.2, 0.3));
    }
}
