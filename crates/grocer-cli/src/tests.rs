use super::*;

#[test]
fn parses_stores_command() {
    let cli = Cli::try_parse_from(["grocer-cli", "stores", "Chicago, IL"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Stores { location, chains } => {
            assert_eq!(location, "Chicago, IL");
            assert!(chains.is_empty());
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert!(!cli.compact);
}

#[test]
fn parses_stores_chain_filter() {
    let cli = Cli::try_parse_from(["grocer-cli", "stores", "60605", "--chains", "target,aldi"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Stores { ref chains, .. } if chains == &["target".to_owned(), "aldi".to_owned()]
    ));
}

#[test]
fn parses_products_command() {
    let cli = Cli::try_parse_from([
        "grocer-cli",
        "products",
        "oat milk",
        "--store",
        "Target",
        "--location",
        "Chicago,IL",
        "--compact",
    ])
    .expect("expected valid cli args");

    assert!(cli.compact);
    match cli.command {
        Commands::Products {
            query,
            store_name,
            location,
        } => {
            assert_eq!(query, "oat milk");
            assert_eq!(store_name, "Target");
            assert_eq!(location, "Chicago,IL");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn products_requires_store_and_location() {
    assert!(Cli::try_parse_from(["grocer-cli", "products", "milk"]).is_err());
    assert!(Cli::try_parse_from(["grocer-cli", "products", "milk", "--store", "Target"]).is_err());
}

#[test]
fn parses_details_command() {
    let cli = Cli::try_parse_from([
        "grocer-cli",
        "details",
        "Whole Foods Market",
        "--location",
        "60607",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Details {
            store_name,
            location,
        } => {
            assert_eq!(store_name, "Whole Foods Market");
            assert_eq!(location, "60607");
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert!(Cli::try_parse_from(["grocer-cli", "details", "Target"]).is_err());
}

#[test]
fn parses_aggregate_command_with_and_without_stores() {
    let cli = Cli::try_parse_from([
        "grocer-cli",
        "aggregate",
        "oat milk",
        "--location",
        "60605",
        "--stores",
        "Target,Jewel-Osco",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Aggregate { ref stores, .. }
            if stores == &["Target".to_owned(), "Jewel-Osco".to_owned()]
    ));

    let cli = Cli::try_parse_from(["grocer-cli", "aggregate", "eggs", "--location", "60605"])
        .expect("expected valid cli args");
    match cli.command {
        Commands::Aggregate {
            query,
            location,
            stores,
        } => {
            assert_eq!(query, "eggs");
            assert_eq!(location, "60605");
            assert!(stores.is_empty());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["grocer-cli"]).is_err());
}

#[test]
fn render_respects_compact_flag() {
    let value = serde_json::json!({ "stores_found": 0 });
    assert_eq!(discover::render(&value, true).unwrap(), r#"{"stores_found":0}"#);
    assert!(discover::render(&value, false).unwrap().contains('\n'));
}
