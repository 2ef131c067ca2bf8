// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Weighted averaging over polarizations.
//!
//! Weights are recorded per polarization and record, with no spectral
//! dependence, so each polarization's weight is applied identically to all
//! channels.

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex;

use crate::errors::{Error, Result};
use crate::CollapsedVisibility;

/// The summed weight of every channel of every record, `[nchan, nvis]`.
pub fn combined_weight(weight: &Array2<f64>, n_chan: usize) -> Array2<f64> {
    let per_record = weight.sum_axis(Axis(0));
    let nvis = per_record.len();
    Array2::from_shape_fn((n_chan, nvis), |(_c, v)| per_record[v])
}

/// Average `[npol, nchan, nvis]` visibilities over polarization using the
/// `[npol, nvis]` weights.
///
/// The outputs are always `[nchan, nvis]`, even if there is only one
/// channel. A record whose weights sum to zero, or to a non-finite value, is
/// an error.
pub fn average(data: &Array3<Complex<f64>>, weight: &Array2<f64>) -> Result<CollapsedVisibility> {
    let (npol, nchan, nvis) = data.dim();

    if weight.dim() != (npol, nvis) {
        return Err(Error::Shape(format!(
            "DATA is {:?} but WEIGHT is {:?}",
            data.shape(),
            weight.shape()
        )));
    }

    let sums = weight.sum_axis(Axis(0));

    if let Some(v) = sums.iter().position(|w| !(w.is_finite() && *w != 0.0)) {
        return Err(Error::ZeroWeightSum {
            channel: 0,
            record: v,
        });
    }

    let combined = combined_weight(weight, nchan);

    let mut real = Array2::zeros((nchan, nvis));
    let mut imag = Array2::zeros((nchan, nvis));

    for (p, pol_data) in data.outer_iter().enumerate() {
        let w = weight.row(p);

        for ((c, v), d) in pol_data.indexed_iter() {
            real[[c, v]] += d.re * w[v];
            imag[[c, v]] += d.im * w[v];
        }
    }

    real /= &combined;
    imag /= &combined;

    Ok(CollapsedVisibility {
        real,
        imag,
        weight: combined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn two_polarizations() {
        let data = array![[[Complex::new(1.0, 0.0)]], [[Complex::new(4.0, 0.0)]]];
        let weight = array![[2.0], [1.0]];

        let avg = average(&data, &weight).unwrap();
        assert_eq!(avg.real.dim(), (1, 1));
        assert_abs_diff_eq!(avg.real[[0, 0]], 2.0);
        assert_abs_diff_eq!(avg.imag[[0, 0]], 0.0);
        assert_abs_diff_eq!(avg.weight[[0, 0]], 3.0);
    }

    #[test]
    fn weights_are_flat_across_channels() {
        let data = Array3::from_shape_fn((2, 3, 2), |(p, c, v)| {
            Complex::new((p * 10 + c) as f64, -((v + 1) as f64))
        });
        let weight = array![[1.0, 3.0], [3.0, 1.0]];

        let avg = average(&data, &weight).unwrap();
        assert_eq!(avg.real.dim(), (3, 2));
        assert_abs_diff_eq!(avg.weight, array![[4.0, 4.0], [4.0, 4.0], [4.0, 4.0]]);

        // record 0: (c * 1 + (10 + c) * 3) / 4 = c + 7.5
        // record 1: (c * 3 + (10 + c) * 1) / 4 = c + 2.5
        assert_abs_diff_eq!(
            avg.real,
            array![[7.5, 2.5], [8.5, 3.5], [9.5, 4.5]],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            avg.imag,
            array![[-1.0, -2.0], [-1.0, -2.0], [-1.0, -2.0]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn single_channel_keeps_its_axis() {
        let data = Array3::from_elem((4, 1, 5), Complex::new(1.0, 1.0));
        let weight = Array2::from_elem((4, 5), 0.25);

        let avg = average(&data, &weight).unwrap();
        assert_eq!(avg.real.shape(), &[1, 5]);
        assert_eq!(avg.imag.shape(), &[1, 5]);
        assert_eq!(avg.weight.shape(), &[1, 5]);
        assert_eq!(combined_weight(&weight, 1).shape(), &[1, 5]);
    }

    #[test]
    fn zero_weight_sum_is_an_error() {
        let data = Array3::from_elem((2, 2, 3), Complex::new(1.0, 0.0));
        let weight = array![[1.0, 0.0, 1.0], [1.0, 0.0, 1.0]];

        match average(&data, &weight) {
            Err(Error::ZeroWeightSum { record: 1, .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn non_finite_weight_sums_are_errors() {
        let data = Array3::from_elem((2, 1, 3), Complex::new(1.0, 0.0));

        let weight = array![[1.0, 1.0, f64::NAN], [1.0, 1.0, 1.0]];
        match average(&data, &weight) {
            Err(Error::ZeroWeightSum { record: 2, .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }

        let weight = array![[1.0, f64::INFINITY, 1.0], [1.0, 1.0, 1.0]];
        match average(&data, &weight) {
            Err(Error::ZeroWeightSum { record: 1, .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }

        // Opposite infinities sum to NaN.
        let weight = array![[f64::INFINITY, 1.0, 1.0], [f64::NEG_INFINITY, 1.0, 1.0]];
        assert!(average(&data, &weight).is_err());
    }
}
