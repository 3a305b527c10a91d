// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::models::NodeId;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(NodeId))
        .help(help)
}

fn text_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn number_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .allow_negative_numbers(true)
        .help(help)
}

fn node_field_args(cmd: Command) -> Command {
    cmd.arg(text_arg("owner", "Profile owning the node (defaults to the current profile)"))
        .arg(
            Arg::new("shared")
                .long("shared")
                .action(ArgAction::SetTrue)
                .conflicts_with("owner")
                .help("Make the node visible from every profile"),
        )
        .arg(number_arg("rate", "Annual interest rate in percent (asset/bucket)"))
        .arg(number_arg("target", "Target allocation weight in percent (asset)"))
        .arg(
            Arg::new("sub")
                .long("sub")
                .action(ArgAction::Append)
                .help("Sub-holding as NAME=PCT, repeatable (asset)"),
        )
        .arg(
            Arg::new("x")
                .long("x")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .requires("y"),
        )
        .arg(
            Arg::new("y")
                .long("y")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .requires("x"),
        )
}

/// A command group; run bare it prints its own help.
fn group(name: &'static str) -> Command {
    Command::new(name)
        .subcommand_required(true)
        .arg_required_else_help(true)
}

pub fn build_cli() -> Command {
    Command::new("moneyflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Model monthly money flows between accounts and project future balances")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Path to the SQLite file (defaults to the platform data dir)"),
        )
        .subcommand(Command::new("init").about("Create the database and seed a starter graph"))
        .subcommand(
            group("node")
                .about("Manage income, bucket, expense and asset nodes")
                .subcommand(node_field_args(
                    Command::new("add")
                        .arg(text_arg("type", "income|bucket|expense|asset").required(true))
                        .arg(text_arg("name", "Display name").required(true))
                        .arg(
                            number_arg("value", "Monthly amount or current balance")
                                .default_value("0"),
                        ),
                ))
                .subcommand(node_field_args(
                    Command::new("update")
                        .arg(id_arg("id", "Node id"))
                        .arg(text_arg("type", "income|bucket|expense|asset"))
                        .arg(text_arg("name", "Display name"))
                        .arg(number_arg("value", "Monthly amount or current balance"))
                        .arg(
                            Arg::new("clear-target")
                                .long("clear-target")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("target"),
                        )
                        .arg(
                            Arg::new("clear-subs")
                                .long("clear-subs")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("sub"),
                        ),
                ))
                .subcommand(Command::new("rm").arg(id_arg("id", "Node id")))
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include nodes of every profile"),
                    ),
                )),
        )
        .subcommand(
            group("link")
                .about("Manage monthly flows between nodes")
                .subcommand(
                    Command::new("add")
                        .arg(id_arg("from", "Source node id"))
                        .arg(id_arg("to", "Target node id"))
                        .arg(number_arg("amount", "Monthly amount").required(true)),
                )
                .subcommand(
                    Command::new("update")
                        .arg(id_arg("from", "Source node id"))
                        .arg(id_arg("to", "Target node id"))
                        .arg(number_arg("amount", "Monthly amount"))
                        .arg(
                            id_arg("new-from", "Move the link to this source")
                                .required(false)
                                .requires("new-to"),
                        )
                        .arg(
                            id_arg("new-to", "Move the link to this target")
                                .required(false)
                                .requires("new-from"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(id_arg("from", "Source node id"))
                        .arg(id_arg("to", "Target node id")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            group("profile")
                .about("Manage profiles that partition nodes")
                .subcommand(Command::new("add").arg(text_arg("name", "Profile name").required(true)))
                .subcommand(Command::new("rm").arg(text_arg("name", "Profile name").required(true)))
                .subcommand(Command::new("use").arg(text_arg("name", "Profile name").required(true)))
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            group("sim")
                .about("Projection horizon and inflation settings")
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("months")
                                .long("months")
                                .value_parser(value_parser!(u32))
                                .help("Projection horizon in months, 0 disables projection"),
                        )
                        .arg(number_arg("inflation", "Annual inflation in percent"))
                        .arg(
                            Arg::new("real")
                                .long("real")
                                .action(ArgAction::SetTrue)
                                .help("Show projected values in today's money"),
                        )
                        .arg(
                            Arg::new("nominal")
                                .long("nominal")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("real"),
                        ),
                )
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            group("report")
                .about("Flow statistics for a profile")
                .subcommand(json_flags(
                    Command::new("flows").arg(text_arg("profile", "Profile to report on")),
                ))
                .subcommand(json_flags(
                    Command::new("summary").arg(text_arg("profile", "Profile to report on")),
                ))
                .subcommand(json_flags(
                    Command::new("allocation").arg(text_arg("profile", "Profile to report on")),
                )),
        )
        .subcommand(
            group("strategy")
                .about("Free-text investment strategy notes")
                .subcommand(
                    Command::new("set").arg(text_arg("summary", "Strategy text").required(true)),
                )
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            group("backup")
                .about("Export or restore the whole model document")
                .subcommand(Command::new("export").arg(text_arg("out", "Output file")))
                .subcommand(
                    Command::new("import").arg(text_arg("path", "Backup file").required(true)),
                ),
        )
        .subcommand(
            group("export")
                .about("Export computed data")
                .subcommand(
                    Command::new("flows")
                        .arg(text_arg("format", "csv|json").required(true))
                        .arg(text_arg("out", "Output file").required(true))
                        .arg(text_arg("profile", "Profile to export")),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn bare_group_asks_for_help() {
        for group in ["node", "link", "profile", "sim", "report", "strategy", "backup", "export"] {
            let err = build_cli()
                .try_get_matches_from(["moneyflow", group])
                .unwrap_err();
            assert_eq!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand,
                "{}",
                group
            );
        }
    }

    #[test]
    fn negative_values_parse_as_values() {
        let m = build_cli()
            .try_get_matches_from([
                "moneyflow", "node", "add", "--type", "bucket", "--name", "Card", "--value",
                "-250",
            ])
            .unwrap();
        let (_, node) = m.subcommand().unwrap();
        let (_, add) = node.subcommand().unwrap();
        assert_eq!(add.get_one::<String>("value").unwrap(), "-250");
    }
}
