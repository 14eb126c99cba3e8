//! Scalar abstraction over plain and tape-recorded arithmetic.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::math::aad::Number;
use crate::math::{normal_cdf, normal_pdf};

/// Numeric type a model or payoff can be written against once and run both
/// ways: `f64` for plain valuation, [`Number`] for valuation with
/// derivatives recorded on the tape.
///
/// Constant (`f64`) operands on the right-hand side keep tape traffic down:
/// they record single-input nodes instead of materializing constant leaves.
pub trait Scalar:
    Copy
    + Debug
    + PartialOrd
    + Send
    + Sync
    + 'static
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<Self, Output = Self>
    + Div<Self, Output = Self>
    + Neg<Output = Self>
    + AddAssign<Self>
    + SubAssign<Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Lifts a plain value into the scalar type (a leaf node under AAD).
    fn constant(value: f64) -> Self;

    /// Plain value, discarding any derivative bookkeeping.
    fn value(self) -> f64;

    /// Re-registers the scalar as a differentiable input on the calling
    /// thread's tape. No-op for plain scalars.
    fn put_on_tape(&mut self) {}

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sqrt(self) -> Self;
    fn powf(self, n: f64) -> Self;
    fn normal_cdf(self) -> Self;
    fn normal_pdf(self) -> Self;

    /// `max(x, 0)` with the pathwise derivative convention.
    fn positive_part(self) -> Self;

    #[inline]
    fn max(self, other: Self) -> Self {
        if self > other { self } else { other }
    }
}

impl Scalar for f64 {
    #[inline]
    fn constant(value: f64) -> Self {
        value
    }

    #[inline]
    fn value(self) -> f64 {
        self
    }

    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn powf(self, n: f64) -> Self {
        f64::powf(self, n)
    }

    #[inline]
    fn normal_cdf(self) -> Self {
        normal_cdf(self)
    }

    #[inline]
    fn normal_pdf(self) -> Self {
        normal_pdf(self)
    }

    #[inline]
    fn positive_part(self) -> Self {
        if self > 0.0 { self } else { 0.0 }
    }
}

impl Scalar for Number {
    #[inline]
    fn constant(value: f64) -> Self {
        Number::new(value)
    }

    #[inline]
    fn value(self) -> f64 {
        Number::value(&self)
    }

    #[inline]
    fn put_on_tape(&mut self) {
        Number::put_on_tape(self);
    }

    #[inline]
    fn exp(self) -> Self {
        Number::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        Number::ln(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        Number::sqrt(self)
    }

    #[inline]
    fn powf(self, n: f64) -> Self {
        Number::powf(self, n)
    }

    #[inline]
    fn normal_cdf(self) -> Self {
        Number::normal_cdf(self)
    }

    #[inline]
    fn normal_pdf(self) -> Self {
        Number::normal_pdf(self)
    }

    #[inline]
    fn positive_part(self) -> Self {
        Number::positive_part(self)
    }
}
