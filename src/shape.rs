use serde::{ Serialize, Deserialize };

use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Besides its dimensions, a shape records how they map onto
/// linear storage, which lets broadcasts share data without copying.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
  pub dims: Vec<usize>,
  pub(crate) strides: Vec<isize>,
  pub(crate) offset: usize,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    let strides = Self::make_strides(dims);
    Self {
      dims: dims.to_vec(),
      strides,
      offset: 0,
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<isize> {
    if dims.is_empty() { return vec![] }
    let mut strides = vec![0; dims.len()];
    strides[dims.len() - 1] = 1;
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] as isize * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  /// Row-major layout. Strides of size-1 dimensions are never used
  /// to step, so they may hold anything.

  pub fn contiguous(&self) -> bool {
    self.strides.len() == self.dims.len() &&
      self.dims.iter()
        .zip(self.strides.iter().zip(Self::make_strides(&self.dims)))
        .all(|(&n, (&s, expected))| n == 1 || s == expected )
  }

  /// Whether every index this shape can produce lies inside
  /// storage of `len` elements.

  pub(crate) fn fits(&self, len: usize) -> bool {
    if self.strides.len() != self.dims.len() { return false }
    if self.dims.contains(&0) { return true }
    let mut low = self.offset as isize;
    let mut high = low;
    for (&n, &s) in self.dims.iter().zip(&self.strides) {
      let step = match (n as isize - 1).checked_mul(s) {
        Some(step) => step,
        None => return false,
      };
      match (low.checked_add(step.min(0)), high.checked_add(step.max(0))) {
        (Some(l), Some(h)) => { low = l; high = h; },
        _ => return false,
      }
    }
    low >= 0 && (high as usize) < len
  }

  /// Storage indices in logical row-major order.

  pub fn iter(&self) -> Box<dyn Iterator<Item=usize> + '_> {
    if self.contiguous() {
      Box::new(self.offset..self.offset + self.size())
    } else {
      Box::new(ShapeIterator::new(self))
    }
  }

  /// Stretch this shape to be element-wise compatible with `other`.
  ///
  /// Dimensions are aligned from the right. Stretched dimensions get a
  /// stride of zero, so the same storage element is revisited.

  pub fn broadcast(&self, other: &Self) -> Self {
    let mut dims = vec![];
    let mut strides = vec![];
    self.dims.iter()
      .rev()
      .chain(std::iter::repeat(&1))
      .zip(other.dims.iter()
        .rev()
        .chain(std::iter::repeat(&1)))
      .take(self.rank().max(other.rank()))
      .inspect(|(&a, &b)|
        assert!(a == b || a == 1 || b == 1, "Could not broadcast {} & {}", self, other) )
      .zip(self.strides.iter()
        .rev()
        .chain(std::iter::repeat(&0)))
      .for_each(|((&dl, &dr), &stride)| {
        dims.push(dl.max(dr));
        strides.push(if dl == 1 && dr != 1 { 0 } else { stride });
      });
    dims.reverse();
    strides.reverse();
    Self { dims, strides, offset: self.offset }
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    let idx = negative_index(i, self.rank(), false);
    &self.dims[idx]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


/// Iterate through a strided [Shape]'s indices.

pub struct ShapeIterator<'a> {
  shape: &'a Shape,
  counter: Vec<usize>,
  idx: isize,
  finished: bool,
}

impl<'a> ShapeIterator<'a> {
  fn new(shape: &'a Shape) -> Self {
    Self {
      counter: vec![0; shape.rank()],
      idx: shape.offset as isize,
      shape,
      finished: shape.size() == 0,
    }
  }
}

impl<'a> Iterator for ShapeIterator<'a> {
  type Item = usize;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished { return None }
    let out = self.idx as usize;
    let len = self.counter.len();
    if len == 0 { self.finished = true }
    // Walk backward through dimensions
    for cd in (0..len).rev() {
      // Increment counter on full turn of right hand dimension
      if cd == len - 1 || self.counter[cd + 1] == 0 {
        let count = &mut self.counter[cd];
        // Full turn?
        if *count == self.shape.dims[cd] - 1 {
          if cd == 0 { self.finished = true; break }
          *count = 0;
          let backstride = (self.shape.dims[cd] as isize - 1) * self.shape.strides[cd];
          self.idx -= backstride;
        } else {
          *count += 1;
          self.idx += self.shape.strides[cd];
        }
      } else {
        break
      }
    }
    Some(out)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strides() {
    let shape = Shape::new(&[784,256]);
    assert_eq!(shape.strides, vec![256,1]);

    let shape = Shape::new(&[2,3,2]);
    assert_eq!(shape.strides, vec![6,2,1]);
  }

  #[test]
  fn scalar() {
    let shape = Shape::new(&[]);
    assert_eq!(shape.size(), 1);
    assert_eq!(shape.iter().collect::<Vec<_>>(), vec![0]);
  }

  #[test]
  fn index() {
    let shape = Shape::new(&[1,10]);
    assert_eq!(shape[-1], 10);
    assert_eq!(shape[0], 1);
  }

  #[test]
  fn broadcast_bias() {
    let shape = Shape::new(&[3]).broadcast(&Shape::new(&[2,3]));
    assert_eq!(shape.dims, vec![2,3]);
    assert_eq!(shape.strides, vec![0,1]);
    assert!(!shape.contiguous());
    let indices: Vec<_> = shape.iter().collect();
    assert_eq!(indices, vec![0, 1, 2, 0, 1, 2]);
  }

  #[test]
  fn broadcast_row_stays_contiguous() {
    let shape = Shape::new(&[256]).broadcast(&Shape::new(&[1,256]));
    assert_eq!(shape.strides, vec![0,1]);
    assert!(shape.contiguous());
    assert_eq!(shape.iter().collect::<Vec<_>>(), (0..256).collect::<Vec<_>>());
  }

  #[test]
  fn fits_storage() {
    assert!(Shape::new(&[2,3]).fits(6));
    assert!(!Shape::new(&[2,3]).fits(5));
    assert!(Shape::new(&[3]).broadcast(&Shape::new(&[4,3])).fits(3));
    assert!(Shape::new(&[0,3]).fits(0));
    let mut shape = Shape::new(&[1,4]);
    shape.offset = 2;
    assert!(shape.fits(6));
    assert!(!shape.fits(5));
    shape.strides = vec![4];
    assert!(!shape.fits(100));
  }

  #[test]
  fn broadcast() {
    let shape = Shape::new(&[2,3,2]).broadcast(&Shape::new(&[2,1,2]));
    assert_eq!(shape.dims, vec![2,3,2]);
    assert_eq!(shape.strides, vec![6,2,1]);

    let shape = Shape::new(&[2,1,2]).broadcast(&Shape::new(&[2,3,1]));
    assert_eq!(shape.dims, vec![2,3,2]);
    assert_eq!(shape.strides, vec![2,0,1]);

    let indices: Vec<_> = shape.iter().collect();
    assert_eq!(indices, vec![0, 1, 0, 1, 0, 1, 2, 3, 2, 3, 2, 3]);
  }

  #[test]
  #[should_panic(expected = "Could not broadcast")]
  fn broadcast_mismatch() {
    Shape::new(&[256]).broadcast(&Shape::new(&[1,10]));
  }

  #[test]
  fn display() {
    assert_eq!(Shape::new(&[1,784]).to_string(), "Shape[1, 784]");
  }
}
