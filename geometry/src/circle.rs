//! Sine/cosine lookup tables sampled around a full or half circle

use cgmath::{Angle, BaseFloat, Rad};

use crate::{try_with_capacity, GeometryError, Result};

/// Precomputed `(sin, cos)` samples at uniformly spaced angles.
///
/// A table built from `n` samples holds `|n| + 1` entries so that it forms
/// a closed loop: the last entry repeats the first for a full circle, and
/// is exactly `(0, -1)` for a half circle.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleTable<T> {
    sin: Vec<T>,
    cos: Vec<T>,
}

impl<T: BaseFloat> CircleTable<T> {
    pub fn len(&self) -> usize {
        self.sin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sin.is_empty()
    }

    pub fn sin(&self) -> &[T] {
        &self.sin
    }

    pub fn cos(&self) -> &[T] {
        &self.cos
    }

    /// Iterate over `(sin, cos)` pairs in sample order
    pub fn iter(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.sin.iter().copied().zip(self.cos.iter().copied())
    }
}

/// Convert a count to the table's scalar type.
fn scalar<T: BaseFloat>(value: usize) -> Result<T> {
    T::from(value)
        .filter(|converted: &T| converted.is_finite())
        .ok_or(GeometryError::ScalarConversion(value))
}

/// Build a circle table of `n` samples.
///
/// The sign of `n` selects the direction: a negative count walks the
/// circle clockwise. With `half_circle` the samples span `0..=π`,
/// otherwise `0..=2π`. Both sequences are reserved before any sample is
/// computed; if either reservation fails the error is returned and
/// nothing is kept.
pub fn circle_table<T: BaseFloat>(n: i32, half_circle: bool) -> Result<CircleTable<T>> {
    let size = n.unsigned_abs() as usize;

    let arc: Rad<T> = if half_circle {
        Rad::turn_div_2()
    } else {
        Rad::full_turn()
    };
    let divisor = if n == 0 {
        T::one()
    } else if n < 0 {
        -scalar::<T>(size)?
    } else {
        scalar(size)?
    };
    let step = arc / divisor;

    let mut sin = try_with_capacity(size + 1, "circle table sine")?;
    let mut cos = try_with_capacity(size + 1, "circle table cosine")?;

    for i in 0..size {
        let (s, c) = if i == 0 {
            (T::zero(), T::one())
        } else {
            (step * scalar::<T>(i)?).sin_cos()
        };
        sin.push(s);
        cos.push(c);
    }

    // Close the loop without trusting sin/cos rounding at π or 2π
    if half_circle {
        sin.push(T::zero());
        cos.push(-T::one());
    } else {
        sin.push(T::zero());
        cos.push(T::one());
    }

    log::trace!(
        "built {} circle table with {} samples",
        if half_circle { "half" } else { "full" },
        sin.len()
    );

    Ok(CircleTable { sin, cos })
}
