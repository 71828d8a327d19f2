use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tools").chain(args.iter().copied()))
        .expect("arguments parse")
}

fn store_command(cli: Cli) -> StoreCommand {
    match cli.command {
        Command::Store(command) => command,
        other => panic!("expected a store command, got {other:?}"),
    }
}

#[test]
fn database_url_defaults_to_local_sqlite_file() {
    let cli = parse(&["stats"]);
    assert_eq!(cli.database_url, "sqlite://./data/garden.db");
    assert!(matches!(store_command(cli), StoreCommand::Stats));
}

#[test]
fn database_url_can_be_overridden() {
    let cli = parse(&["--database-url", "sqlite::memory:", "garden"]);
    assert_eq!(cli.database_url, "sqlite::memory:");
    assert!(matches!(store_command(cli), StoreCommand::Garden));
}

#[test]
fn hash_password_takes_the_password_positionally() {
    let cli = parse(&["hash-password", "letmein"]);
    match cli.command {
        Command::HashPassword { password } => assert_eq!(password, "letmein"),
        other => panic!("expected hash-password, got {other:?}"),
    }
}

#[test]
fn add_takes_the_flower_type_verbatim() {
    match store_command(parse(&["add", "peony"])) {
        StoreCommand::Add { flower_type } => assert_eq!(flower_type, "peony"),
        other => panic!("expected add, got {other:?}"),
    }
}

#[test]
fn store_subcommands_without_arguments_parse() {
    assert!(matches!(store_command(parse(&["sweep"])), StoreCommand::Sweep));
    assert!(matches!(store_command(parse(&["list"])), StoreCommand::List));
}

#[test]
fn missing_or_unknown_subcommands_are_rejected() {
    assert!(Cli::try_parse_from(["tools"]).is_err());
    assert!(Cli::try_parse_from(["tools", "replant"]).is_err());
    assert!(Cli::try_parse_from(["tools", "add"]).is_err());
    assert!(Cli::try_parse_from(["tools", "hash-password"]).is_err());
}
