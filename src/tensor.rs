use std::rc::Rc;

use rand::Rng;
use serde::{ Serialize, Deserialize };

mod cops;

use crate::{
  internal::*,
  shape::Shape,
  scalar::{ Inner, Numeric, Real },
  ops::{ BaseOps, NumericOps, RealOps },
};


/// Immutable multidimensional array.
///
/// Tensors may contain any type that satisfies [Inner]. Matrix products
/// and activations are available for [Real] inner types.
///
/// Storage is reference counted, so cloning a tensor or broadcasting it
/// to a larger shape never copies its elements.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TensorParts<T>")]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<Vec<T>>,
}

// Decoded tensors are checked against their storage before use
#[derive(Deserialize)]
struct TensorParts<T> {
  shape: Shape,
  data: Rc<Vec<T>>,
}

impl<T: Inner> TryFrom<TensorParts<T>> for Tensor<T> {
  type Error = String;

  fn try_from(parts: TensorParts<T>) -> Result<Self, Self::Error> {
    if parts.shape.fits(parts.data.len()) {
      Ok(Self { shape: parts.shape, data: parts.data })
    } else {
      Err(format!("{} does not fit storage of {} elements", parts.shape, parts.data.len()))
    }
  }
}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.shape.dims == rhs.shape.dims &&
      self.param_iter().zip(rhs.param_iter()).all(|(a, b)| a == b )
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    assert!(shape.fits(data.len()), "Strides of {} reach outside its data", shape);
    Self { shape, data: Rc::new(data) }
  }

  pub fn new(shape: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(shape), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn fill(shape: &[usize], filler: T) -> Self {
    Self::new(shape, vec![filler; shape.iter().product()])
  }

  pub fn raw(&self) -> &[T] {
    &self.data
  }

  /// Elements in logical order, copying only if storage is shared or strided.

  pub fn into_raw(self) -> Vec<T> {
    if self.is_dense() {
      Rc::try_unwrap(self.data).unwrap_or_else(|data| (*data).clone() )
    } else {
      self.param_iter().collect()
    }
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  pub fn dims(&self) -> &[usize] {
    &self.shape.dims
  }

  // Row-major and backed by exactly its own elements
  pub(crate) fn is_dense(&self) -> bool {
    self.shape.contiguous() && self.shape.offset == 0 && self.shape.size() == self.data.len()
  }

  pub(crate) fn in_bounds(&self) -> bool {
    self.shape.fits(self.data.len())
  }

  pub fn item(&self) -> T {
    assert!(self.size() == 1,
      "Can't extract item from non-scalar {}", self.shape);
    self.data[self.shape.offset]
  }

  pub fn contiguous(&self) -> Self {
    if self.shape.contiguous() {
      self.clone()
    } else {
      self.vectorize(|a| a )
    }
  }

  pub fn zip<O,F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn((T, T)) -> O,
  {
    let rhs = rhs.broadcast(&self.shape);
    let data: Vec<O> = self.broadcast(&rhs.shape).param_iter()
      .zip(rhs.param_iter())
      .map(cb)
      .collect();
    Tensor::new(&rhs.shape.dims, data)
  }

  pub fn vectorize<O,F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.param_iter().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  pub fn param_iter(&self) -> impl Iterator<Item = T> + '_ {
    self.shape.iter().map(move |i| self.data[i] )
  }
}

impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn scalar(item: T) -> Self {
    Self::new(&[], vec![item])
  }

  fn shape(&self) -> &Shape {
    &self.shape
  }

  fn broadcast(&self, shape: &Shape) -> Self {
    Self {
      shape: self.shape.broadcast(shape),
      data: self.data.clone(),
    }
  }
}

impl<T: Numeric> Tensor<T> {
  pub fn ones(shape: &[usize]) -> Self {
    Self::fill(shape, T::one())
  }

  pub fn zeros(shape: &[usize]) -> Self {
    Self::fill(shape, T::zero())
  }

  pub fn arrange(shape: &[usize], start: T, step: T) -> Self {
    let mut value = start;
    Self::new(shape, (0..shape.iter().product())
      .map(|_| {
        let out = value;
        value += step;
        out
      })
      .collect())
  }
}

impl<T: Real> NumericOps<T> for Tensor<T> {
  fn add(&self, rhs: &Self) -> Self {
    self.zip(rhs, |(a, b)| a + b )
  }

  fn mm(&self, rhs: &Self) -> Self {
    assert!(self.rank() == 2 && rhs.rank() == 2,
      "Matrix multiply expects two matrices, got {} & {}", self.shape, rhs.shape);
    assert!(self.shape[-1] == rhs.shape[-2],
      "Could not multiply {} & {}", self.shape, rhs.shape);
    let data = T::matmul(self, rhs);
    Self::new(&[self.shape[-2], rhs.shape[-1]], data)
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn relu(&self) -> Self {
    self.vectorize(|a| if a > T::zero() { a } else { T::zero() })
  }

  fn sigmoid(&self) -> Self {
    self.vectorize(|a| T::one() / (T::one() + (-a).exp()) )
  }
}

impl<T: Real> Tensor<T> {
  /// Uniform samples from `[0, 1)`.

  pub fn rand<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
    let data = (0..shape.iter().product())
      .map(|_| rng.gen_range(T::zero(), T::one()) )
      .collect();
    Self::new(shape, data)
  }

  /// Standard normal samples.

  pub fn randn<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
    let len = shape.iter().product();
    let mut data = Vec::with_capacity(len + 1);
    while data.len() < len {
      let (r1, r2): (T, T) = randn(&mut *rng);
      data.push(r1);
      data.push(r2);
    }
    data.truncate(len);
    Self::new(shape, data)
  }
}

impl<T: Real> std::ops::Add for &Tensor<T> {
  type Output = Tensor<T>;

  fn add(self, rhs: Self) -> Tensor<T> {
    NumericOps::add(self, rhs)
  }
}

impl<T: Real> std::ops::Add<&Tensor<T>> for Tensor<T> {
  type Output = Tensor<T>;

  fn add(self, rhs: &Tensor<T>) -> Tensor<T> {
    NumericOps::add(&self, rhs)
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    let data: Vec<T> = self.param_iter().collect();
    print_chunks(0, &self.shape, &data, f)
  }
}

fn print_chunks<T: std::fmt::Debug>(idx: usize, shape: &Shape, vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = "  ".repeat(idx);
  if shape.rank() == 0 {
    write!(f, "{indent}{:?}", vec[0])?;
  } else if idx == shape.rank() - 1 {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    writeln!(f, "{indent}[")?;
    if shape.dims[idx] > 0 {
      for chunk in vec.chunks((vec.len() / shape.dims[idx]).max(1)) {
        print_chunks(idx + 1, shape, chunk, f)?;
      }
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::internal::make_rng;

  #[test]
  fn broadcast_add() {
    let x = Tensor::new(&[2,3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = Tensor::vec(&[1.0, 2.0, 3.0]);
    assert_eq!(&x + &b, Tensor::new(&[2,3], vec![2.0, 4.0, 6.0, 5.0, 7.0, 9.0]));
    assert_eq!(&b + &x, Tensor::new(&[2,3], vec![2.0, 4.0, 6.0, 5.0, 7.0, 9.0]));
  }

  #[test]
  fn broadcast_shares_storage() {
    let b = Tensor::vec(&[1, 2, 3]);
    let wide = b.broadcast(&Shape::new(&[4,3]));
    assert_eq!(wide.dims(), &[4, 3]);
    assert!(Rc::ptr_eq(&b.data, &wide.data));
    assert_eq!(wide.into_raw(), vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3]);
  }

  #[test]
  fn sigmoid() {
    let x = Tensor::vec(&[0.0f64, 100.0, -100.0]).sigmoid();
    let raw = x.raw();
    assert_eq!(raw[0], 0.5);
    assert!(raw[1] > 0.999 && raw[1] <= 1.0);
    assert!(raw[2] >= 0.0 && raw[2] < 0.001);
  }

  #[test]
  fn relu() {
    let x = Tensor::vec(&[-1.0f32, 0.0, 2.5]).relu();
    assert_eq!(x, Tensor::vec(&[0.0, 0.0, 2.5]));
  }

  #[test]
  fn rand_range() {
    let t = Tensor::<f32>::rand(&[1,784], &mut make_rng(Some(1)));
    assert_eq!(t.dims(), &[1, 784]);
    assert!(t.param_iter().all(|a| (0.0..1.0).contains(&a) ));
  }

  #[test]
  fn randn_odd_length() {
    let t = Tensor::<f32>::randn(&[7], &mut make_rng(Some(3)));
    assert_eq!(t.size(), 7);
    assert_eq!(t.raw().len(), 7);
  }

  #[test]
  fn randn_seeded() {
    let a = Tensor::<f64>::randn(&[256], &mut make_rng(Some(9)));
    let b = Tensor::<f64>::randn(&[256], &mut make_rng(Some(9)));
    assert_eq!(a, b);
  }

  #[test]
  fn item() {
    assert_eq!(Tensor::scalar(4.0f32).item(), 4.0);
    assert_eq!(Tensor::vec(&[7]).item(), 7);
  }

  #[test]
  #[should_panic(expected = "doesn't match data length")]
  fn wrong_length() {
    Tensor::new(&[2,2], vec![1, 2, 3]);
  }

  #[test]
  #[should_panic(expected = "reach outside its data")]
  fn stale_strides() {
    let mut shape = Shape::new(&[1,100]);
    shape.dims = vec![100, 1];
    Tensor::from_shape(shape, vec![0.0f32; 100]);
  }

  #[test]
  fn decode_rejects_oversized_dims() {
    let mut bytes = postcard::to_allocvec(&Tensor::new(&[1,1], vec![1.0f32])).unwrap();
    // Leading varints: dims length, then each dim
    assert_eq!(&bytes[..3], &[2, 1, 1]);
    bytes[2] = 4;
    let decoded: Result<Tensor<f32>, _> = postcard::from_bytes(&bytes);
    assert!(decoded.is_err());
  }

  #[test]
  fn decode_keeps_valid_tensor() {
    let t = Tensor::new(&[2,2], vec![1.0f32, 2.0, 3.0, 4.0]);
    let decoded: Tensor<f32> = postcard::from_bytes(&postcard::to_allocvec(&t).unwrap()).unwrap();
    assert_eq!(decoded, t);
  }

  #[test]
  fn contiguous_materializes_broadcast() {
    let wide = Tensor::vec(&[1, 2]).broadcast(&Shape::new(&[2,2]));
    let dense = wide.contiguous();
    assert!(dense.is_dense());
    assert_eq!(dense.raw(), &[1, 2, 1, 2]);

    let row = Tensor::<f32>::ones(&[1,3]);
    assert!(Rc::ptr_eq(&row.contiguous().data, &row.data));
    assert_eq!(row.raw(), &[1.0, 1.0, 1.0]);
  }

  #[test]
  fn display() {
    let t = Tensor::arrange(&[2,2], 1, 1);
    assert_eq!(t.to_string(), "Tensor[2, 2] [\n  [1, 2]\n  [3, 4]\n]\n");
  }
}
