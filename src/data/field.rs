//! Reconstructed per-element fields.

use crate::error::Result;
use ndarray::{concatenate, Array1, Array2, Axis, ErrorKind, ShapeError};
use std::fmt;
use tracing::debug;

/// Node positions and values of every element in a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    /// X position of each element node, elements × nodes-per-element.
    pub x: Array2<f64>,
    /// Y position of each element node.
    pub y: Array2<f64>,
    /// Z position of each element node.
    pub z: Array2<f64>,
    /// One value per element.
    pub values: Array1<f64>,
}

impl FieldData {
    /// Bundle coordinates and values, checking that they describe the same elements.
    pub fn new(x: Array2<f64>, y: Array2<f64>, z: Array2<f64>, values: Array1<f64>) -> Result<Self> {
        if x.dim() != y.dim() || x.dim() != z.dim() || x.nrows() != values.len() {
            debug!(
                x = ?x.dim(),
                y = ?y.dim(),
                z = ?z.dim(),
                values = values.len(),
                "field shapes disagree"
            );
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        Ok(Self { x, y, z, values })
    }

    /// Stack several fields along the element axis, in order.
    pub fn concatenate(parts: &[FieldData]) -> Result<Self> {
        let stack2 = |pick: fn(&FieldData) -> &Array2<f64>| {
            let views: Vec<_> = parts.iter().map(|p| pick(p).view()).collect();
            concatenate(Axis(0), &views)
        };
        let views: Vec<_> = parts.iter().map(|p| p.values.view()).collect();
        Ok(Self {
            x: stack2(|p| &p.x)?,
            y: stack2(|p| &p.y)?,
            z: stack2(|p| &p.z)?,
            values: concatenate(Axis(0), &views)?,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the field has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Summary statistics over the finite values.
    pub fn stats(&self) -> FieldStats {
        FieldStats::of(self.values.iter().copied())
    }
}

/// Summary of a field's finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Minimum and maximum.
    pub min_max: Option<(f64, f64)>,
    /// Mean value.
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    /// Count of finite values.
    pub valid_count: usize,
}

impl FieldStats {
    /// Compute statistics, skipping NaN and infinite values.
    pub fn of(values: impl Iterator<Item = f64> + Clone) -> Self {
        let finite = values.filter(|v| v.is_finite());

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in finite.clone() {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        if count == 0 {
            return Self {
                min_max: None,
                mean: None,
                std: None,
                valid_count: 0,
            };
        }

        let mean = sum / count as f64;
        let std = (count > 1).then(|| {
            let ssd: f64 = finite.map(|v| (v - mean) * (v - mean)).sum();
            (ssd / (count - 1) as f64).sqrt()
        });
        Self {
            min_max: Some((min, max)),
            mean: Some(mean),
            std,
            valid_count: count,
        }
    }
}

impl fmt::Display for FieldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.6e}", v));
        writeln!(f, "Valid:     {}", self.valid_count)?;
        writeln!(f, "Min:       {}", show(self.min_max.map(|m| m.0)))?;
        writeln!(f, "Max:       {}", show(self.min_max.map(|m| m.1)))?;
        writeln!(f, "Mean:      {}", show(self.mean))?;
        write!(f, "Std:       {}", show(self.std))
    }
}
