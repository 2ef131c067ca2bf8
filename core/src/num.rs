// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!

General helpers for numerics.

*/

use crate::errors::{CoreError, Result};
use ndarray::{Array, Dimension, IntoDimension, Ix1, Ix2, Ix3, IxDyn};

/// Adapt a slice representing an array shape into an `ndarray::Dimension` type.
///
/// In `ndarray` array dimensionalities are statically typed, but we read
/// arrays from data files where the array dimensionality may not match the
/// expectations of the compiled code. This trait makes it possible to convert
/// a runtime-flexible array shape into one of the compile-time types … if the
/// two dimensionalities are in fact the same.
pub trait DimFromShapeSlice<T>: Sized {
    /// Try to create the implementing type from the specified array shape,
    /// specified as a slice.
    ///
    /// Returns `CoreError::DimensionMismatch` if the slice size does not
    /// match the expected dimensionality.
    fn from_shape_slice(shape: &[T]) -> Result<Self>;
}

macro_rules! impl_dim_from_shape_slice {
    ($dimtype:ty; $ndim:expr; $($numbers:expr);*) => {
        impl DimFromShapeSlice<u64> for $dimtype {
            fn from_shape_slice(shape: &[u64]) -> Result<Self> {
                if shape.len() == $ndim {
                    Ok([$(shape[$numbers] as usize),*].into_dimension())
                } else {
                    Err(CoreError::DimensionMismatch($ndim, shape.len()))
                }
            }
        }

        impl DimFromShapeSlice<usize> for $dimtype {
            fn from_shape_slice(shape: &[usize]) -> Result<Self> {
                if shape.len() == $ndim {
                    Ok([$(shape[$numbers] as usize),*].into_dimension())
                } else {
                    Err(CoreError::DimensionMismatch($ndim, shape.len()))
                }
            }
        }
    }
}

impl_dim_from_shape_slice! { Ix1; 1; 0 }
impl_dim_from_shape_slice! { Ix2; 2; 0;1 }
impl_dim_from_shape_slice! { Ix3; 3; 0;1;2 }

impl DimFromShapeSlice<u64> for IxDyn {
    fn from_shape_slice(shape: &[u64]) -> Result<Self> {
        let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
        Ok(IxDyn(&dims))
    }
}

impl DimFromShapeSlice<usize> for IxDyn {
    fn from_shape_slice(shape: &[usize]) -> Result<Self> {
        Ok(IxDyn(shape))
    }
}

/// The number of elements implied by an array shape.
pub fn n_elements(shape: &[u64]) -> usize {
    shape.iter().fold(1usize, |p, n| p * (*n as usize))
}

/// Build a row-major array from a flat vector of values and a runtime shape.
///
/// Both the dimensionality and the element count are checked.
pub fn array_from_shape_vec<T, D>(shape: &[u64], values: Vec<T>) -> Result<Array<T, D>>
where
    D: Dimension + DimFromShapeSlice<u64>,
{
    let dim = D::from_shape_slice(shape)?;
    let actual = values.len();

    Array::from_shape_vec(dim, values).map_err(|_| CoreError::ElementCountMismatch {
        shape: shape.to_owned(),
        expected: n_elements(shape),
        actual,
    })
}
