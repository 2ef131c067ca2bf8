// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*! The main uvport driver command.

`uvport export` converts a native visibility table into an interchange
dataset; `uvport import` substitutes the model visibilities of an interchange
dataset into a copy of a native table.

*/

use anyhow::Error;
use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process;
use uvport_core::ctry;
use uvport_core::notify::{ClapNotificationArgsExt, NotificationBackend};
use uvport_core::rn_note;
use uvport_ms::{copy_table_tree, open_store, Binding};
use uvport_visdata::config::{ConversionConfig, SubstitutionMode, DEFAULT_TELESCOPE};
use uvport_visdata::FlagPolicy;

fn main() {
    let matches = make_app().get_matches();

    process::exit(uvport_core::notify::run_with_notifications(
        matches,
        |matches, nb| -> Result<i32, Error> {
            match matches.subcommand() {
                Some(("export", m)) => do_export(m, nb),
                Some(("import", m)) => do_import(m, nb),
                _ => {
                    make_app().print_long_help()?;
                    Ok(0)
                }
            }
        },
    ));
}

/// The arguments shared by both conversion directions.
fn conversion_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("ms")
            .long("ms")
            .value_name("PATH")
            .value_parser(clap::value_parser!(PathBuf))
            .help("The native visibility table")
            .required(true),
    )
    .arg(
        Arg::new("snapshot")
            .long("snapshot")
            .action(ArgAction::SetTrue)
            .help("Read the table as a uvport snapshot rather than through casacore"),
    )
    .arg(
        Arg::new("flag_policy")
            .long("flag-policy")
            .value_name("POLICY")
            .value_parser(["any-axis", "all-axes"])
            .default_value("any-axis")
            .help("How to collapse per-polarization flags; must match between export and import"),
    )
    .arg(
        Arg::new("substitution")
            .long("substitution")
            .value_name("MODE")
            .value_parser(["mask-in-place", "drop-flagged"])
            .default_value("mask-in-place")
            .help("Whether excluded records are kept in the dataset; drop-flagged needs --flag-policy=all-axes"),
    )
    .arg(
        Arg::new("rtol")
            .long("rtol")
            .value_name("NUMBER")
            .value_parser(clap::value_parser!(f64))
            .default_value("1e-5")
            .help("Relative tolerance of the import consistency checks"),
    )
    .arg(
        Arg::new("atol")
            .long("atol")
            .value_name("NUMBER")
            .value_parser(clap::value_parser!(f64))
            .default_value("1e-8")
            .help("Absolute tolerance of the import consistency checks"),
    )
}

/// It seems that the best way to re-print the help when no sub-command is
/// given is to be able to make multiple Command objects.
fn make_app() -> Command {
    Command::new("uvport")
        .version(crate_version!())
        .about("Convert visibilities between native tables and uvport interchange datasets")
        .uvport_notify_args()
        .subcommand(
            conversion_args(
                Command::new("export").about("Convert a native table into an interchange dataset"),
            )
            .arg(
                Arg::new("out")
                    .long("out")
                    .value_name("PATH")
                    .value_parser(clap::value_parser!(PathBuf))
                    .default_value("data.uvx")
                    .help("The interchange dataset to create"),
            )
            .arg(
                Arg::new("telescope")
                    .long("telescope")
                    .value_name("NAME")
                    .default_value(DEFAULT_TELESCOPE)
                    .help("The instrument name to record in the dataset"),
            ),
        )
        .subcommand(
            conversion_args(
                Command::new("import")
                    .about("Substitute model visibilities into a copy of a native table"),
            )
            .arg(
                Arg::new("model")
                    .long("model")
                    .value_name("PATH")
                    .value_parser(clap::value_parser!(PathBuf))
                    .default_value("model.uvx")
                    .help("The interchange dataset holding the model visibilities"),
            )
            .arg(
                Arg::new("out")
                    .long("out")
                    .value_name("PATH")
                    .value_parser(clap::value_parser!(PathBuf))
                    .default_value("model.ms")
                    .help("Where to write the modified copy of the table"),
            ),
        )
}

fn binding(matches: &ArgMatches) -> Binding {
    if matches.get_flag("snapshot") {
        Binding::Snapshot
    } else {
        Binding::Casa
    }
}

fn path_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a PathBuf, Error> {
    matches
        .get_one::<PathBuf>(name)
        .ok_or_else(|| anyhow::anyhow!("the argument --{} is required", name))
}

fn config_from_matches(matches: &ArgMatches) -> Result<ConversionConfig, Error> {
    let mut config = ConversionConfig::default();

    if let Some(p) = matches.get_one::<String>("flag_policy") {
        config.flag_policy = p.parse::<FlagPolicy>()?;
    }

    if let Some(m) = matches.get_one::<String>("substitution") {
        config.substitution = m.parse::<SubstitutionMode>()?;
    }

    if let Some(rtol) = matches.get_one::<f64>("rtol") {
        config.tolerance.rtol = *rtol;
    }

    if let Some(atol) = matches.get_one::<f64>("atol") {
        config.tolerance.atol = *atol;
    }

    Ok(config)
}

fn do_export(matches: &ArgMatches, nb: &mut dyn NotificationBackend) -> Result<i32, Error> {
    let ms = path_arg(matches, "ms")?;
    let out = path_arg(matches, "out")?;
    let mut config = config_from_matches(matches)?;

    if let Some(t) = matches.get_one::<String>("telescope") {
        config.telescope = t.clone();
    }

    let mut store = ctry!(open_store(binding(matches), ms, false); "failed to open the table \"{}\"", ms.display());

    ctry!(
        uvport_visdata::export(&mut *store, out, &config, nb);
        "failed to export \"{}\" to \"{}\"", ms.display(), out.display()
    );

    Ok(0)
}

fn do_import(matches: &ArgMatches, nb: &mut dyn NotificationBackend) -> Result<i32, Error> {
    let ms = path_arg(matches, "ms")?;
    let model = path_arg(matches, "model")?;
    let out = path_arg(matches, "out")?;
    let config = config_from_matches(matches)?;
    let binding = binding(matches);

    if binding == Binding::Casa {
        uvport_ms::casa::require_casacore()?;
    }

    ctry!(copy_table_tree(ms, out); "failed to copy \"{}\" to \"{}\"", ms.display(), out.display());
    rn_note!(nb, "copied \"{}\" to \"{}\"", ms.display(), out.display());

    let mut store = ctry!(open_store(binding, out, true); "failed to open the table \"{}\"", out.display());

    ctry!(
        uvport_visdata::import(&mut *store, model, &config, nb);
        "failed to import \"{}\" into \"{}\"", model.display(), out.display()
    );

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvport_visdata::Tolerance;

    #[test]
    fn app_definition_is_valid() {
        make_app().debug_assert();
    }

    #[test]
    fn parses_conversion_settings() {
        let m = make_app()
            .try_get_matches_from([
                "uvport",
                "import",
                "--ms",
                "vis.ms",
                "--snapshot",
                "--flag-policy",
                "all-axes",
                "--rtol",
                "1e-3",
            ])
            .unwrap();
        let (name, sub) = m.subcommand().unwrap();
        assert_eq!(name, "import");
        assert_eq!(binding(sub), Binding::Snapshot);
        assert_eq!(path_arg(sub, "out").unwrap(), &PathBuf::from("model.ms"));
        assert_eq!(path_arg(sub, "model").unwrap(), &PathBuf::from("model.uvx"));

        let config = config_from_matches(sub).unwrap();
        assert_eq!(config.flag_policy, FlagPolicy::AllAxes);
        assert_eq!(config.tolerance.rtol, 1e-3);
        assert_eq!(config.tolerance.atol, Tolerance::default().atol);
        assert_eq!(config.substitution, SubstitutionMode::MaskInPlace);
    }

    #[test]
    fn drop_flagged_needs_all_axes() {
        let parse = |args: &[&str]| {
            let m = make_app().try_get_matches_from(args.iter().copied()).unwrap();
            let (_, sub) = m.subcommand().unwrap();
            config_from_matches(sub).unwrap()
        };

        let config = parse(&[
            "uvport",
            "export",
            "--ms",
            "vis.ms",
            "--flag-policy",
            "all-axes",
            "--substitution",
            "drop-flagged",
        ]);
        assert_eq!(config.substitution, SubstitutionMode::DropFlagged);
        config.check().unwrap();

        let config = parse(&["uvport", "import", "--ms", "vis.ms", "--substitution", "drop-flagged"]);
        assert!(config.check().is_err());

        assert!(make_app()
            .try_get_matches_from(["uvport", "import", "--ms", "x", "--substitution", "drop"])
            .is_err());
    }

    #[test]
    fn export_defaults() {
        let m = make_app()
            .try_get_matches_from(["uvport", "export", "--ms", "vis.ms"])
            .unwrap();
        let (_, sub) = m.subcommand().unwrap();
        assert_eq!(binding(sub), Binding::Casa);
        assert_eq!(path_arg(sub, "out").unwrap(), &PathBuf::from("data.uvx"));
        assert_eq!(sub.get_one::<String>("telescope").unwrap(), "ALMA");
        assert_eq!(config_from_matches(sub).unwrap(), ConversionConfig::default());
    }

    #[test]
    fn table_is_required() {
        assert!(make_app()
            .try_get_matches_from(["uvport", "export"])
            .is_err());
        assert!(make_app()
            .try_get_matches_from(["uvport", "export", "--ms", "x", "--flag-policy", "some"])
            .is_err());
    }
}
