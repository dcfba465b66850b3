use rand::distributions::uniform::SampleUniform;
use num_traits::{ Num, NumCast, NumAssignOps };

use crate::ops::Cops;


/// All types that may be stored in a [Tensor](crate::Tensor).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Inner: PartialEq + Clone + Copy + std::fmt::Debug {}
impl<T: PartialEq + Clone + Copy + std::fmt::Debug> Inner for T {}


/// All numeric types.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Numeric: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum {}
impl<T: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum> Numeric for T {}


/// Continuous numeric types with an accelerated matrix product.
///
/// Implemented for [f32] and [f64].

pub trait Real: Numeric + num_traits::Signed + num_traits::real::Real + SampleUniform + Cops {}
impl<T: Numeric + num_traits::Signed + num_traits::real::Real + SampleUniform + Cops> Real for T {}
