use crate::{
  tensor::Tensor,
  scalar::Numeric,
  ops::Cops,
};


// Portable fallback that honors strides and offsets of both operands

#[cfg_attr(feature = "unsafe", allow(dead_code))]
fn strided_matmul<T: Numeric>(lhs: &Tensor<T>, rhs: &Tensor<T>) -> Vec<T> {
  let rows_l = lhs.shape[-2];
  let cols_l = lhs.shape[-1];
  let cols_r = rhs.shape[-1];

  let data_l = lhs.raw();
  let data_r = rhs.raw();
  let (rs_l, cs_l) = (lhs.shape.strides[0], lhs.shape.strides[1]);
  let (rs_r, cs_r) = (rhs.shape.strides[0], rhs.shape.strides[1]);
  let offset_l = lhs.shape.offset as isize;
  let offset_r = rhs.shape.offset as isize;

  let mut data = vec![T::zero(); rows_l * cols_r];
  for i in 0..rows_l {
    for k in 0..cols_l {
      let a = data_l[(offset_l + i as isize * rs_l + k as isize * cs_l) as usize];
      for j in 0..cols_r {
        data[i * cols_r + j] += a * data_r[(offset_r + k as isize * rs_r + j as isize * cs_r) as usize];
      }
    }
  }

  data
}

macro_rules! impl_cops {
  ($type:ty, $gemm:ident) => {
    impl Cops for $type {
      #[cfg(feature = "unsafe")]
      fn matmul(lhs: &Tensor<$type>, rhs: &Tensor<$type>) -> Vec<$type> {
        let rows_l = lhs.shape[-2];
        let cols_l = lhs.shape[-1];
        let cols_r = rhs.shape[-1];

        assert!(lhs.in_bounds() && rhs.in_bounds(),
          "Matrix operands {} & {} reach outside their storage", lhs.shape, rhs.shape);

        let mut data = vec![0.0; rows_l * cols_r];

        // Both operands are rank 2 with matching inner dimensions and
        // were just checked against their storage.
        unsafe {
          matrixmultiply::$gemm(
            rows_l,
            cols_l,
            cols_r,
            1.0,
            lhs.raw().as_ptr().add(lhs.shape.offset),
            lhs.shape.strides[0],
            lhs.shape.strides[1],
            rhs.raw().as_ptr().add(rhs.shape.offset),
            rhs.shape.strides[0],
            rhs.shape.strides[1],
            0.0,
            data.as_mut_ptr(),
            cols_r as isize,
            1,
          );
        };

        data
      }

      #[cfg(not(feature = "unsafe"))]
      fn matmul(lhs: &Tensor<$type>, rhs: &Tensor<$type>) -> Vec<$type> {
        strided_matmul(lhs, rhs)
      }
    }
  };
}

impl_cops!(f32, sgemm);
impl_cops!(f64, dgemm);
