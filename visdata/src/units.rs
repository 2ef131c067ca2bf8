// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Conversion of baseline lengths into spatial frequencies.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::SpatialFrequencies;

/// The speed of light, in cm/s.
pub const SPEED_OF_LIGHT_CGS: f64 = 2.99792458e10;

/// The wavelength corresponding to a frequency in Hz, in microns.
#[inline]
pub fn wavelength_microns(freq_hz: f64) -> f64 {
    SPEED_OF_LIGHT_CGS / freq_hz * 1e4
}

/// Convert a baseline coordinate in meters into kilo-wavelengths at the
/// given frequency.
#[inline]
pub fn meters_to_klambda(baseline_m: f64, freq_hz: f64) -> f64 {
    1e-3 * (baseline_m * 1e6) / wavelength_microns(freq_hz)
}

/// Expand the per-record `u` and `v` baseline coordinates (rows 0 and 1 of
/// `uvw`, in meters) into per-channel spatial frequencies.
///
/// Every channel of a record shares the same baseline; the values differ
/// only through the wavelength.
pub fn spatial_frequencies(freqs: ArrayView1<f64>, uvw: ArrayView2<f64>) -> SpatialFrequencies {
    let nchan = freqs.len();
    let nvis = uvw.ncols();

    let uu = Array2::from_shape_fn((nchan, nvis), |(c, v)| {
        meters_to_klambda(uvw[[0, v]], freqs[c])
    });
    let vv = Array2::from_shape_fn((nchan, nvis), |(c, v)| {
        meters_to_klambda(uvw[[1, v]], freqs[c])
    });

    SpatialFrequencies { uu, vv }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn hundred_meters_at_300_ghz() {
        let expected = 100.0 * 1e6 / (SPEED_OF_LIGHT_CGS / 3e11 * 1e4) * 1e-3;
        assert_relative_eq!(meters_to_klambda(100.0, 3e11), expected, max_relative = 1e-6);
        // About 100 kilo-wavelengths, since lambda ~ 1 mm.
        assert_relative_eq!(meters_to_klambda(100.0, 3e11), 100.069, max_relative = 1e-5);
    }

    #[test]
    fn broadcast_over_channels() {
        let freqs = array![1e11, 2e11, 4e11];
        let uvw = array![[100.0, -50.0], [10.0, 0.0], [1.0, 2.0]];
        let sf = spatial_frequencies(freqs.view(), uvw.view());

        assert_eq!(sf.uu.dim(), (3, 2));
        assert_eq!(sf.vv.dim(), (3, 2));

        // Doubling the frequency doubles the spatial frequency.
        assert_relative_eq!(sf.uu[[1, 0]], 2.0 * sf.uu[[0, 0]], max_relative = 1e-12);
        assert_relative_eq!(sf.uu[[2, 1]], 4.0 * sf.uu[[0, 1]], max_relative = 1e-12);
        assert_relative_eq!(sf.uu[[0, 1]], -0.5 * sf.uu[[0, 0]], max_relative = 1e-12);
        assert_eq!(sf.vv[[2, 1]], 0.0);
        assert_relative_eq!(sf.vv[[0, 0]], meters_to_klambda(10.0, 1e11));
    }
}
