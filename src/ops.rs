use crate::{ Shape, Tensor };
use crate::scalar::{ Inner, Numeric, Real };


/// Low-level compute operations.
///
/// Implemented per element type so that [f32] and [f64] can route
/// through `matrixmultiply` when the `unsafe` feature is enabled.

pub trait Cops: Inner {
  /// Row-major product of two rank 2 tensors whose inner dimensions agree.
  fn matmul(lhs: &Tensor<Self>, rhs: &Tensor<Self>) -> Vec<Self>;
}


/// Shape-level operations available for any [Inner] type.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> &Shape;
  fn broadcast(&self, shape: &Shape) -> Self;
}


/// Operations available for [Numeric] inner types.

pub trait NumericOps<I: Numeric>: Sized {
  fn add(&self, rhs: &Self) -> Self;
  fn mm(&self, rhs: &Self) -> Self;
}


/// Element-wise activations.

pub trait RealOps<I: Real> {
  fn relu(&self) -> Self;
  fn sigmoid(&self) -> Self;
}
