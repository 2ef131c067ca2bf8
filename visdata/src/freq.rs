// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Frequency-axis ordering.
//!
//! Interchange datasets always store their channels in increasing frequency
//! order, while native tables may use either order. Everything that is
//! indexed by channel has the channel as its leading axis, so switching
//! between the two orders is a reversal along axis 0.

use ndarray::{Array, ArrayBase, ArrayView1, Axis, Data, Dimension};

use crate::errors::{Error, Result};

/// The direction of a strictly monotonic frequency axis.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FrequencyOrder {
    Increasing,
    Decreasing,
}

impl FrequencyOrder {
    /// Classify a frequency axis.
    ///
    /// A single channel counts as increasing. An empty axis, a repeated
    /// value, or a change of direction is a configuration error.
    pub fn classify(freqs: ArrayView1<f64>) -> Result<Self> {
        if freqs.is_empty() {
            return Err(Error::Configuration(
                "the spectral window has no channels".to_owned(),
            ));
        }

        let increasing = freqs.windows(2).into_iter().all(|w| w[1] > w[0]);

        if increasing {
            return Ok(FrequencyOrder::Increasing);
        }

        let decreasing = freqs.windows(2).into_iter().all(|w| w[1] < w[0]);

        if decreasing {
            return Ok(FrequencyOrder::Decreasing);
        }

        Err(Error::Configuration(format!(
            "channel frequencies are not in strictly increasing or decreasing order \
             ({} channels from {} to {} Hz)",
            freqs.len(),
            freqs[0],
            freqs[freqs.len() - 1]
        )))
    }

    pub fn is_decreasing(self) -> bool {
        self == FrequencyOrder::Decreasing
    }

    /// Convert a channel-major array between this order and increasing
    /// order. The operation is its own inverse.
    pub fn apply<A, S, D>(self, a: &ArrayBase<S, D>) -> Array<A, D>
    where
        A: Clone,
        S: Data<Elem = A>,
        D: Dimension,
    {
        match self {
            FrequencyOrder::Increasing => a.to_owned(),
            FrequencyOrder::Decreasing => reverse_channels(a),
        }
    }
}

/// Reverse an array along its leading (channel) axis.
pub fn reverse_channels<A, S, D>(a: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut view = a.view();
    view.invert_axis(Axis(0));
    view.to_owned()
}
