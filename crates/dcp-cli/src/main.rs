//! `dcp` binary

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dcp_cli::{commands, logging, PreviewArgs, TreeArgs};
use dcp_model::PackagePath;
use dcp_status::DefaultPolicy;
use std::io::Write;
use std::path::PathBuf;

fn model_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("model")
                .long("model")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Model document (YAML, or JSON for .json files)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .required(true)
                .help("Qualified name of the product component to copy"),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_parser(value_parser!(DefaultPolicy))
                .help("Default decision: copy, link or smart"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_parser(value_parser!(PathBuf))
                .help("Restore decisions from this settings file"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
}

fn cli() -> Command {
    Command::new("dcp")
        .version(dcp_cli::VERSION)
        .about("Deep copy preview for product structures")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log level unless RUST_LOG is set"),
        )
        .subcommand(
            model_args(Command::new("preview").about("Show targets and problems of a deep copy"))
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_parser(value_parser!(PackagePath))
                        .help("Target package"),
                )
                .arg(
                    Arg::new("search")
                        .long("search")
                        .help("Regular expression replaced in kind-ids"),
                )
                .arg(
                    Arg::new("replace")
                        .long("replace")
                        .help("Replacement for --search"),
                )
                .arg(
                    Arg::new("version-id")
                        .long("version-id")
                        .help("Version id of the copies"),
                )
                .arg(
                    Arg::new("new-version")
                        .long("new-version")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("version-id")
                        .help("Use today's version id"),
                )
                .arg(
                    Arg::new("save-settings")
                        .long("save-settings")
                        .value_parser(value_parser!(PathBuf))
                        .help("Save the decisions to this settings file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(model_args(
            Command::new("tree").about("Print the structure with its decisions"),
        ))
}

fn preview_args(args: &ArgMatches) -> PreviewArgs {
    PreviewArgs {
        model: args.get_one::<PathBuf>("model").cloned().unwrap_or_default(),
        root: args.get_one::<String>("root").cloned().unwrap_or_default(),
        target: args.get_one::<PackagePath>("target").cloned(),
        search: args.get_one::<String>("search").cloned(),
        replace: args.get_one::<String>("replace").cloned(),
        version_id: args.get_one::<String>("version-id").cloned(),
        new_version: args.get_flag("new-version"),
        policy: args.get_one::<DefaultPolicy>("policy").copied(),
        settings: args.get_one::<PathBuf>("settings").cloned(),
        save_settings: args.get_one::<PathBuf>("save-settings").cloned(),
        config: args.get_one::<PathBuf>("config").cloned(),
        json: args.get_flag("json"),
    }
}

fn tree_args(args: &ArgMatches) -> TreeArgs {
    TreeArgs {
        model: args.get_one::<PathBuf>("model").cloned().unwrap_or_default(),
        root: args.get_one::<String>("root").cloned().unwrap_or_default(),
        policy: args.get_one::<DefaultPolicy>("policy").copied(),
        settings: args.get_one::<PathBuf>("settings").cloned(),
        config: args.get_one::<PathBuf>("config").cloned(),
    }
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    logging::init(level)?;

    let mut stdout = std::io::stdout().lock();
    match matches.subcommand() {
        Some(("preview", args)) => {
            let has_errors = commands::preview(&preview_args(args), &mut stdout)?;
            if has_errors {
                stdout.flush()?;
                std::process::exit(1);
            }
        }
        Some(("tree", args)) => commands::tree(&tree_args(args), &mut stdout)?,
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn preview_flags_are_parsed() {
        let matches = cli()
            .try_get_matches_from([
                "dcp", "preview", "--model", "m.yaml", "--root", "p.Root 2024-01", "--target",
                "new.pkg", "--policy", "link", "--search", "V1", "--replace", "V2", "--json",
            ])
            .unwrap();
        let Some(("preview", args)) = matches.subcommand() else {
            panic!("preview subcommand expected");
        };
        let args = preview_args(args);
        assert_eq!(args.root, "p.Root 2024-01");
        assert_eq!(args.target, Some("new.pkg".parse().unwrap()));
        assert_eq!(args.policy, Some(DefaultPolicy::AlwaysLink));
        assert!(args.json);
        assert!(!args.new_version);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = cli().try_get_matches_from([
            "dcp", "tree", "--model", "m.yaml", "--root", "x", "--policy", "maybe",
        ]);
        assert!(result.is_err());
    }
}
