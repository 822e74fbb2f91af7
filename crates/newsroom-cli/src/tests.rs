use clap::Parser;
use newsroom_core::StagedStatus;

use super::{Cli, Commands, DbCommands};
use crate::staged::StagedCommands;

#[test]
fn cli_parses_without_subcommand() {
    let cli = Cli::try_parse_from(["newsroom-cli"]).expect("bare invocation should parse");
    assert!(cli.command.is_none());
}

#[test]
fn cli_parses_db_subcommands() {
    for (arg, expect_ping, expect_migrate) in
        [("ping", true, false), ("migrate", false, true), ("seed", false, false)]
    {
        let cli = Cli::try_parse_from(["newsroom-cli", "db", arg]).expect("db subcommand");
        match cli.command {
            Some(Commands::Db { command }) => {
                assert_eq!(matches!(command, DbCommands::Ping), expect_ping);
                assert_eq!(matches!(command, DbCommands::Migrate), expect_migrate);
            }
            other => panic!("unexpected parse for {arg}: {other:?}"),
        }
    }
}

#[test]
fn cli_parses_ingest_dry_run_flag() {
    let cli = Cli::try_parse_from(["newsroom-cli", "ingest", "--dry-run"]).expect("ingest");
    assert!(matches!(cli.command, Some(Commands::Ingest { dry_run: true })));

    let cli = Cli::try_parse_from(["newsroom-cli", "ingest"]).expect("ingest");
    assert!(matches!(cli.command, Some(Commands::Ingest { dry_run: false })));
}

#[test]
fn cli_parses_staged_list_filters() {
    let cli = Cli::try_parse_from([
        "newsroom-cli",
        "staged",
        "list",
        "--status",
        "pending",
        "--source",
        "diario-uno",
        "--limit",
        "10",
    ])
    .expect("staged list");

    match cli.command {
        Some(Commands::Staged {
            command:
                StagedCommands::List {
                    status,
                    source,
                    limit,
                },
        }) => {
            assert_eq!(status, Some(StagedStatus::Pending));
            assert_eq!(source.as_deref(), Some("diario-uno"));
            assert_eq!(limit, 10);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn cli_staged_list_defaults_limit() {
    let cli = Cli::try_parse_from(["newsroom-cli", "staged", "list"]).expect("staged list");
    assert!(matches!(
        cli.command,
        Some(Commands::Staged {
            command: StagedCommands::List {
                status: None,
                source: None,
                limit: 50
            }
        })
    ));
}

#[test]
fn cli_rejects_unknown_status() {
    let result =
        Cli::try_parse_from(["newsroom-cli", "staged", "list", "--status", "archived"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_moderation_commands() {
    let cli = Cli::try_parse_from(["newsroom-cli", "approve", "42"]).expect("approve");
    assert!(matches!(cli.command, Some(Commands::Approve { id: 42 })));

    let cli = Cli::try_parse_from(["newsroom-cli", "reject", "7"]).expect("reject");
    assert!(matches!(cli.command, Some(Commands::Reject { id: 7 })));

    let cli = Cli::try_parse_from(["newsroom-cli", "stats"]).expect("stats");
    assert!(matches!(cli.command, Some(Commands::Stats)));

    let cli = Cli::try_parse_from(["newsroom-cli", "sources"]).expect("sources");
    assert!(matches!(cli.command, Some(Commands::Sources)));
}

#[test]
fn cli_approve_requires_numeric_id() {
    assert!(Cli::try_parse_from(["newsroom-cli", "approve", "abc"]).is_err());
    assert!(Cli::try_parse_from(["newsroom-cli", "approve"]).is_err());
}
