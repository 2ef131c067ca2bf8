// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
The export and import pipelines.

Export reads a native table, converts it into per-channel spatial
frequencies, polarization-averaged visibilities, and an exclusion mask, and
writes an interchange dataset. Import reads an interchange dataset holding
model visibilities, checks that its geometry matches the native table, and
only then substitutes the model into the table's data column.

With [`SubstitutionMode::DropFlagged`], excluded records are left out of the
exported dataset, and an import writes only the records that were kept.

*/

use ndarray::Array3;
use num_complex::Complex;
use std::path::Path;
use uvport_core::notify::NotificationBackend;
use uvport_core::rn_note;

use crate::codec::InterchangeDataset;
use crate::config::{ConversionConfig, SubstitutionMode};
use crate::errors::{Error, Result};
use crate::flags::FlagPolicy;
use crate::freq::FrequencyOrder;
use crate::polavg;
use crate::store::VisibilityStore;
use crate::units;
use crate::validate::{validate_round_trip, NativeGeometry};
use crate::{RawVisibilityBlock, SpectralWindow};

/// Compute the interchange form of a native table, in the table's channel
/// order.
///
/// The frequency axis is checked before anything else is computed.
pub fn to_interchange(
    window: &SpectralWindow,
    block: &RawVisibilityBlock,
    config: &ConversionConfig,
) -> Result<(FrequencyOrder, InterchangeDataset)> {
    let order = window.order()?;
    check_window(window, block)?;

    let spatial = units::spatial_frequencies(window.frequencies.view(), block.uvw.view());
    let vis = polavg::average(&block.data, &block.weight)?;
    let flag = config
        .flag_policy
        .resolve(&block.flag, &block.antenna1, &block.antenna2)?;

    Ok((
        order,
        InterchangeDataset {
            freqs: window.frequencies.clone(),
            spatial,
            vis,
            flag,
            telescope: config.telescope.clone(),
            format_version: config.format_version.clone(),
        },
    ))
}

/// Recompute the geometry that an import is validated against.
pub fn native_geometry(
    window: &SpectralWindow,
    block: &RawVisibilityBlock,
    policy: FlagPolicy,
) -> Result<NativeGeometry> {
    check_window(window, block)?;

    Ok(NativeGeometry {
        window: window.clone(),
        spatial: units::spatial_frequencies(window.frequencies.view(), block.uvw.view()),
        weight: polavg::combined_weight(&block.weight, block.n_channels()),
        flag: policy.resolve(&block.flag, &block.antenna1, &block.antenna2)?,
    })
}

/// Expand `[nchan, nvis]` model visibilities into a `[npol, nchan, nvis]`
/// data column. The model is unpolarized, so every polarization gets the
/// same value.
pub fn expand_model(model: &InterchangeDataset, n_pols: usize) -> Array3<Complex<f64>> {
    let vis = model.visibilities();
    let (nchan, nvis) = vis.dim();
    Array3::from_shape_fn((n_pols, nchan, nvis), |(_p, c, v)| vis[[c, v]])
}

/// Write `[nchan, nkept]` model visibilities into the given records of a
/// `[npol, nchan, nvis]` data column. Every other record keeps its data.
pub fn substitute_records(
    data: &Array3<Complex<f64>>,
    model: &InterchangeDataset,
    records: &[usize],
) -> Result<Array3<Complex<f64>>> {
    let vis = model.visibilities();

    if vis.dim() != (data.dim().1, records.len()) {
        return Err(Error::Shape(format!(
            "cannot write a model of shape {:?} into {} records of DATA with shape {:?}",
            vis.shape(),
            records.len(),
            data.shape()
        )));
    }

    let mut out = data.clone();

    for (j, v) in records.iter().enumerate() {
        for mut pol in out.outer_iter_mut() {
            pol.column_mut(*v).assign(&vis.column(j));
        }
    }

    Ok(out)
}

fn check_window(window: &SpectralWindow, block: &RawVisibilityBlock) -> Result<()> {
    block.check_shapes()?;

    if window.n_channels() != block.n_channels() {
        return Err(Error::Shape(format!(
            "the spectral window has {} channels but DATA has {}",
            window.n_channels(),
            block.n_channels()
        )));
    }

    Ok(())
}

fn report_block(block: &RawVisibilityBlock, nb: &mut dyn NotificationBackend) {
    rn_note!(nb, "DATA shape: {:?}", block.data.shape());
    rn_note!(nb, "UVW shape: {:?}", block.uvw.shape());
    rn_note!(nb, "FLAG shape: {:?}", block.flag.shape());
    rn_note!(nb, "WEIGHT shape: {:?}", block.weight.shape());
}

/// Export the contents of `store` to an interchange dataset at `out_path`.
pub fn export<S, P>(
    store: &mut S,
    out_path: P,
    config: &ConversionConfig,
    nb: &mut dyn NotificationBackend,
) -> Result<InterchangeDataset>
where
    S: VisibilityStore + ?Sized,
    P: AsRef<Path>,
{
    config.check()?;
    let window = store.spectral_window()?;
    // Fail on a bad frequency axis before reading the bulk data.
    let order = window.order()?;
    let block = store.read_block()?;
    report_block(&block, nb);

    let (_, mut ds) = to_interchange(&window, &block, config)?;
    rn_note!(
        nb,
        "flag mask shape ({} policy): {:?}; {} entries excluded",
        config.flag_policy,
        ds.flag.shape(),
        ds.flag.n_excluded()
    );

    if config.substitution == SubstitutionMode::DropFlagged {
        let kept = ds.flag.kept_records()?;
        rn_note!(
            nb,
            "dropping {} excluded records from the export",
            ds.n_records() - kept.len()
        );
        ds = ds.select_records(&kept);
    }

    if order.is_decreasing() {
        rn_note!(
            nb,
            "the table stores frequencies in decreasing order; flipping them to increasing order"
        );
    }

    ds.write(out_path.as_ref(), order)?;
    rn_note!(
        nb,
        "wrote {} channels x {} records to \"{}\"",
        ds.n_channels(),
        ds.n_records(),
        out_path.as_ref().display()
    );
    Ok(ds)
}

/// Substitute the model visibilities of the interchange dataset at
/// `model_path` into `store`.
///
/// Nothing is written to the store unless the dataset's frequencies,
/// spatial frequencies, weights, and flags all match those recomputed from
/// the store. In the drop-flagged mode they are compared against the
/// records that the store's flags keep, and only those records are written.
pub fn import<S, P>(
    store: &mut S,
    model_path: P,
    config: &ConversionConfig,
    nb: &mut dyn NotificationBackend,
) -> Result<()>
where
    S: VisibilityStore + ?Sized,
    P: AsRef<Path>,
{
    config.check()?;
    let window = store.spectral_window()?;
    let order = window.order()?;

    if order.is_decreasing() {
        rn_note!(
            nb,
            "the table stores frequencies in decreasing order; flipping the model to match"
        );
    }

    let model = InterchangeDataset::read(model_path.as_ref(), order)?;
    config
        .tolerance
        .check_close("frequencies", &model.freqs, &window.frequencies)?;

    let block = store.read_block()?;
    report_block(&block, nb);

    let native = native_geometry(&window, &block, config.flag_policy)?;

    let data = match config.substitution {
        SubstitutionMode::MaskInPlace => {
            validate_round_trip(&config.tolerance, &model, &native)?;
            expand_model(&model, block.n_pols())
        }

        SubstitutionMode::DropFlagged => {
            let kept = native.flag.kept_records()?;

            if model.n_records() != kept.len() {
                return Err(Error::Consistency {
                    quantity: "records".to_owned(),
                    detail: format!(
                        "the dataset has {} records but the table has {} that are not excluded",
                        model.n_records(),
                        kept.len()
                    ),
                });
            }

            validate_round_trip(&config.tolerance, &model, &native.select_records(&kept))?;
            substitute_records(&block.data, &model, &kept)?
        }
    };

    rn_note!(
        nb,
        "\"{}\" matches the table's frequencies, spatial frequencies, weights, and flags",
        model_path.as_ref().display()
    );

    store.replace_data(&data)?;

    if store.remove_corrected_data()? {
        rn_note!(nb, "removed the CORRECTED_DATA column");
    }

    store.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryVisibilityStore;
    use crate::testutil;
    use crate::FlagMask;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, s, Axis};
    use uvport_core::notify::{BufferingNotificationBackend, NoopNotificationBackend};

    fn exported(
        store: &mut MemoryVisibilityStore,
        config: &ConversionConfig,
    ) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        export(store, &path, config, &mut NoopNotificationBackend::new()).unwrap();
        (tmp, path)
    }

    /// Write a "model" that is just the exported data scaled by two.
    fn scale_model(path: &Path, order: FrequencyOrder) {
        let mut m = InterchangeDataset::read(path, order).unwrap();
        m.vis.real *= 2.0;
        m.vis.imag *= 2.0;
        m.write(path, order).unwrap();
    }

    #[test]
    fn export_contents() {
        let mut store = MemoryVisibilityStore::new(testutil::window(3, false), testutil::block(3));
        let mut nb = BufferingNotificationBackend::new();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");

        let ds = export(&mut store, &path, &ConversionConfig::default(), &mut nb).unwrap();
        assert_eq!(ds.spatial.uu.dim(), (3, 4));
        let autos_only = ndarray::Array2::from_shape_fn((3, 4), |(_, v)| v == 3);
        assert_eq!(ds.flag, FlagMask::PerChannel(autos_only));

        let back = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert_eq!(back, ds);
        assert_eq!(back.telescope, "ALMA");
        assert_eq!(back.format_version, "v0.1");

        let msgs: Vec<_> = nb.messages().map(|(_, m)| m.to_owned()).collect();
        assert!(msgs.iter().any(|m| m == "DATA shape: [2, 3, 4]"));
        assert!(msgs.iter().any(|m| m == "WEIGHT shape: [2, 4]"));
        assert!(!msgs.iter().any(|m| m.contains("decreasing")));
    }

    #[test]
    fn decreasing_round_trip() {
        let window = testutil::window(4, true);
        let mut store = MemoryVisibilityStore::new(window.clone(), testutil::block(4));
        let config = ConversionConfig::default();
        let (_tmp, path) = exported(&mut store, &config);

        let stored = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert!(stored.freqs[0] < stored.freqs[3]);
        assert_eq!(stored.freqs[0], window.frequencies[3]);

        // Substituting the unmodified export changes nothing (up to rounding
        // of the averaged value) and the channel order is undone.
        import(&mut store, &path, &config, &mut NoopNotificationBackend::new()).unwrap();
        assert_eq!(store.n_data_writes(), 1);

        let (real, imag) = (&stored.vis.real, &stored.vis.imag);
        let data = &store.block().data;

        for p in 0..2 {
            for c in 0..4 {
                for v in 0..4 {
                    assert_abs_diff_eq!(data[[p, c, v]].re, real[[3 - c, v]], epsilon = 1e-12);
                    assert_abs_diff_eq!(data[[p, c, v]].im, imag[[3 - c, v]], epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn import_substitutes_model() {
        let block = testutil::block(2);
        let corrected = block.data.clone();
        let mut store = MemoryVisibilityStore::new(testutil::window(2, false), block)
            .with_corrected_data(corrected);
        let config = ConversionConfig::default();
        let (_tmp, path) = exported(&mut store, &config);
        scale_model(&path, FrequencyOrder::Increasing);

        let mut nb = BufferingNotificationBackend::new();
        import(&mut store, &path, &config, &mut nb).unwrap();

        let model = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        let data = &store.block().data;
        assert_eq!(data.dim(), (2, 2, 4));
        assert_eq!(data[[0, 1, 2]], Complex::new(model.vis.real[[1, 2]], model.vis.imag[[1, 2]]));
        assert_eq!(data[[1, 1, 2]], data[[0, 1, 2]]);
        assert!(store.corrected_data().is_none());
        assert!(nb.messages().any(|(_, m)| m == "removed the CORRECTED_DATA column"));
    }

    #[test]
    fn mismatched_weights_leave_the_table_untouched() {
        let mut store = MemoryVisibilityStore::new(testutil::window(3, false), testutil::block(3));
        let config = ConversionConfig::default();
        let (_tmp, path) = exported(&mut store, &config);

        let mut m = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        m.vis.weight[[1, 2]] *= 1.01;
        m.vis.real.fill(-1.0);
        m.write(&path, FrequencyOrder::Increasing).unwrap();

        let before = store.block().data.clone();

        match import(&mut store, &path, &config, &mut NoopNotificationBackend::new()) {
            Err(Error::Consistency { quantity, .. }) => assert_eq!(quantity, "weights"),
            other => panic!("unexpected result {:?}", other),
        }

        assert_eq!(store.n_data_writes(), 0);
        assert_eq!(store.block().data, before);
    }

    #[test]
    fn import_into_a_different_table_fails() {
        let mut store = MemoryVisibilityStore::new(testutil::window(3, false), testutil::block(3));
        let config = ConversionConfig::default();
        let (_tmp, path) = exported(&mut store, &config);

        let mut other_block = testutil::block(3);
        other_block.uvw[[0, 1]] += 1.0;
        let mut other = MemoryVisibilityStore::new(testutil::window(3, false), other_block);

        match import(&mut other, &path, &config, &mut NoopNotificationBackend::new()) {
            Err(Error::Consistency { quantity, .. }) => assert_eq!(quantity, "uu"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(other.n_data_writes(), 0);

        // Same geometry but a different flag.
        let mut other_block = testutil::block(3);
        other_block.flag[[1, 0, 0]] = true;
        let mut other = MemoryVisibilityStore::new(testutil::window(3, false), other_block);

        match import(&mut other, &path, &config, &mut NoopNotificationBackend::new()) {
            Err(Error::Consistency { quantity, .. }) => assert_eq!(quantity, "flags"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(other.n_data_writes(), 0);

        // Different tuning.
        let mut window = testutil::window(3, false);
        window.frequencies += 1e7;
        let mut other = MemoryVisibilityStore::new(window, testutil::block(3));

        match import(&mut other, &path, &config, &mut NoopNotificationBackend::new()) {
            Err(Error::Consistency { quantity, .. }) => assert_eq!(quantity, "frequencies"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(other.n_data_writes(), 0);
    }

    #[test]
    fn flag_policies_must_be_paired() {
        let mut store = MemoryVisibilityStore::new(testutil::window(2, false), testutil::block(2));
        let all_axes = ConversionConfig {
            flag_policy: FlagPolicy::AllAxes,
            ..ConversionConfig::default()
        };
        let (_tmp, path) = exported(&mut store, &all_axes);

        let stored = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert_eq!(
            stored.flag,
            FlagMask::PerRecord(ndarray::array![false, false, false, true])
        );

        assert!(matches!(
            import(&mut store, &path, &ConversionConfig::default(), &mut NoopNotificationBackend::new()),
            Err(Error::Consistency { .. })
        ));
        import(&mut store, &path, &all_axes, &mut NoopNotificationBackend::new()).unwrap();
    }

    #[test]
    fn bad_frequency_axes_are_rejected_before_export() {
        let mut window = testutil::window(3, false);
        window.frequencies[2] = window.frequencies[1];
        let mut store = MemoryVisibilityStore::new(window, testutil::block(3));
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");

        assert!(matches!(
            export(&mut store, &path, &ConversionConfig::default(), &mut NoopNotificationBackend::new()),
            Err(Error::Configuration(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn bad_frequency_axes_are_rejected_before_import() {
        let mut store = MemoryVisibilityStore::new(testutil::window(3, false), testutil::block(3));
        let config = ConversionConfig::default();
        let (_tmp, path) = exported(&mut store, &config);

        let mut tied = testutil::window(3, false);
        tied.frequencies[2] = tied.frequencies[1];

        let mut zigzag = testutil::window(3, false);
        zigzag.frequencies[1] = zigzag.frequencies[2] + 1e6;

        for window in vec![tied, zigzag] {
            let mut other = MemoryVisibilityStore::new(window, testutil::block(3));

            match import(&mut other, &path, &config, &mut NoopNotificationBackend::new()) {
                Err(Error::Configuration(_)) => {}
                other => panic!("unexpected result {:?}", other),
            }

            assert_eq!(other.n_data_writes(), 0);
            assert_eq!(other.block().data, testutil::block(3).data);
        }
    }

    #[test]
    fn drop_flagged_import_leaves_excluded_records_alone() {
        let mut block = testutil::block(2);
        block.flag.slice_mut(s![.., .., 1]).fill(true);
        let original = block.data.clone();
        let mut store = MemoryVisibilityStore::new(testutil::window(2, false), block);

        let config = ConversionConfig {
            flag_policy: FlagPolicy::AllAxes,
            substitution: SubstitutionMode::DropFlagged,
            ..ConversionConfig::default()
        };
        let (_tmp, path) = exported(&mut store, &config);

        // Record 1 is flagged and record 3 is an autocorrelation.
        let stored = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert_eq!(stored.n_records(), 2);
        assert_eq!(stored.flag, FlagMask::PerRecord(array![false, false]));
        scale_model(&path, FrequencyOrder::Increasing);

        let in_place = ConversionConfig {
            flag_policy: FlagPolicy::AllAxes,
            ..ConversionConfig::default()
        };
        assert!(matches!(
            import(&mut store, &path, &in_place, &mut NoopNotificationBackend::new()),
            Err(Error::Consistency { .. })
        ));

        let any_axis = ConversionConfig {
            substitution: SubstitutionMode::DropFlagged,
            ..ConversionConfig::default()
        };
        assert!(matches!(
            import(&mut store, &path, &any_axis, &mut NoopNotificationBackend::new()),
            Err(Error::Configuration(_))
        ));
        assert_eq!(store.n_data_writes(), 0);

        import(&mut store, &path, &config, &mut NoopNotificationBackend::new()).unwrap();
        assert_eq!(store.n_data_writes(), 1);

        let model = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        let data = &store.block().data;

        for (j, v) in [0, 2].iter().enumerate() {
            for p in 0..2 {
                for c in 0..2 {
                    assert_eq!(
                        data[[p, c, *v]],
                        Complex::new(model.vis.real[[c, j]], model.vis.imag[[c, j]])
                    );
                }
            }
        }

        for v in &[1, 3] {
            assert_eq!(
                data.index_axis(Axis(2), *v),
                original.index_axis(Axis(2), *v)
            );
        }
    }

    #[test]
    fn drop_flagged_import_checks_the_kept_geometry() {
        let mut block = testutil::block(2);
        block.flag.slice_mut(s![.., .., 0]).fill(true);
        let mut store = MemoryVisibilityStore::new(testutil::window(2, false), block);
        let config = ConversionConfig {
            flag_policy: FlagPolicy::AllAxes,
            substitution: SubstitutionMode::DropFlagged,
            ..ConversionConfig::default()
        };
        let (_tmp, path) = exported(&mut store, &config);

        // Same number of kept records, but a different one.
        let mut block = testutil::block(2);
        block.flag.slice_mut(s![.., .., 1]).fill(true);
        let before = block.data.clone();
        let mut other = MemoryVisibilityStore::new(testutil::window(2, false), block);

        assert!(matches!(
            import(&mut other, &path, &config, &mut NoopNotificationBackend::new()),
            Err(Error::Consistency { .. })
        ));
        assert_eq!(other.n_data_writes(), 0);
        assert_eq!(other.block().data, before);
    }

    #[test]
    fn partially_flagged_records_are_ambiguous() {
        let mut block = testutil::block(2);
        block.flag[[0, 1, 1]] = true;
        let mut store = MemoryVisibilityStore::new(testutil::window(2, false), block);
        let tmp = tempfile::tempdir().unwrap();
        let config = ConversionConfig {
            flag_policy: FlagPolicy::AllAxes,
            ..ConversionConfig::default()
        };

        assert!(matches!(
            export(&mut store, tmp.path().join("x"), &config, &mut NoopNotificationBackend::new()),
            Err(Error::PolicyAmbiguity { record: 1 })
        ));
    }
}
