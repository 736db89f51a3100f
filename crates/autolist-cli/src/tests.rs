use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["autolist-cli", "migrate"]).expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn scrape_defaults_to_first_page_of_rest_channel() {
    let cli = Cli::try_parse_from(["autolist-cli", "scrape"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Scrape {
            postal_code: None,
            page: 1,
            channel: Channel::Rest,
            path: None,
        }
    ));
}

#[test]
fn scrape_accepts_all_options() {
    let cli = Cli::try_parse_from([
        "autolist-cli",
        "scrape",
        "--postal-code",
        "M5V3L9",
        "--page",
        "3",
        "--channel",
        "PAGE",
        "--path",
        "/cars/on/toronto/",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Scrape {
            postal_code,
            page,
            channel,
            path,
        } => {
            assert_eq!(postal_code.as_deref(), Some("M5V3L9"));
            assert_eq!(page, 3);
            assert_eq!(channel, Channel::Page);
            assert_eq!(path.as_deref(), Some("/cars/on/toronto/"));
        }
        Commands::Migrate => panic!("expected scrape command"),
    }
}

#[test]
fn unknown_channel_is_rejected() {
    let result = Cli::try_parse_from(["autolist-cli", "scrape", "--channel", "fax"]);
    assert!(result.is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["autolist-cli"]).is_err());
}

#[test]
fn load_config_builds_from_process_environment() {
    let config = load_config().expect("config with defaults");
    assert!(config.upstream_base_url.starts_with("http"));
    assert!(config.page_size >= 1);
}
