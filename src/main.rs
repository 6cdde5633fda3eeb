use anyhow::Result;
use clap::{Arg, Command};

use fwatch::commands;
use fwatch::core::config::Config;

fn main() -> Result<()> {
    fwatch::init_logging();

    let matches = Command::new("fwatch")
        .version("0.1.0")
        .about("Packet-filter rule console with live network and system telemetry")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("rules").about("List the current rule table"))
        .subcommand(
            Command::new("add")
                .about("Append a rule to the end of a chain")
                .arg(
                    Arg::new("chain")
                        .long("chain")
                        .value_name("CHAIN")
                        .default_value("INPUT"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_name("TARGET")
                        .help("DROP, ACCEPT or REJECT")
                        .required(true),
                )
                .arg(
                    Arg::new("protocol")
                        .long("protocol")
                        .short('p')
                        .value_name("PROTOCOL")
                        .help("tcp, udp, icmp or all")
                        .default_value("all"),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .short('s')
                        .value_name("IP")
                        .help("Source address, passed to the tool as-is"),
                )
                .arg(
                    Arg::new("dport")
                        .long("dport")
                        .value_name("PORT")
                        .help("Destination port (tcp/udp only)"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a rule by chain and number from the latest listing")
                .long_about(
                    "Delete a rule by chain and number from the latest listing.\n\n\
                     Rule numbers are positional: if another actor changed the chain\n\
                     since the listing you read, the number may address a different rule.",
                )
                .arg(Arg::new("chain").required(true).index(1))
                .arg(Arg::new("number").required(true).index(2)),
        )
        .subcommand(
            Command::new("block")
                .about("Insert a DROP for a source IP at the head of INPUT")
                .arg(Arg::new("ip").required(true).index(1)),
        )
        .subcommand(
            Command::new("unblock")
                .about("Remove the DROP for a source IP from INPUT")
                .arg(Arg::new("ip").required(true).index(1)),
        )
        .subcommand(Command::new("status").about("Show blocked-rule count and newest alerts"))
        .subcommand(Command::new("monitor").about("Live telemetry and rule view"))
        .get_matches();

    let config = Config::load()?;

    match matches.subcommand() {
        Some(("rules", _)) => commands::rules::list(&config),
        Some(("add", sub_matches)) => commands::rules::add(&config, sub_matches),
        Some(("delete", sub_matches)) => commands::rules::delete(&config, sub_matches),
        Some(("block", sub_matches)) => commands::rules::block(&config, sub_matches),
        Some(("unblock", sub_matches)) => commands::rules::unblock(&config, sub_matches),
        Some(("status", _)) => commands::status::execute(&config),
        Some(("monitor", _)) => commands::monitor::execute(&config),
        _ => unreachable!("subcommand is required"),
    }
}
