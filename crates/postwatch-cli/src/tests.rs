use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["postwatch"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(!cli.verbose);
}

#[test]
fn parses_run_defaults() {
    let cli = Cli::try_parse_from(["postwatch", "run"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            group: None,
            dry_run: false,
            no_sandbox: false
        })
    ));
}

#[test]
fn parses_run_with_group_and_dry_run() {
    let cli = Cli::try_parse_from(["postwatch", "run", "--group", "3", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            group: Some(3),
            dry_run: true,
            ..
        })
    ));
}

#[test]
fn verbose_is_global() {
    let before = Cli::try_parse_from(["postwatch", "--verbose", "run"]).unwrap();
    let after = Cli::try_parse_from(["postwatch", "run", "--verbose"]).unwrap();
    assert!(before.verbose);
    assert!(after.verbose);
}

#[test]
fn parses_groups_command() {
    let cli = Cli::try_parse_from(["postwatch", "groups"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Groups)));
}

#[test]
fn rejects_non_numeric_group() {
    assert!(Cli::try_parse_from(["postwatch", "run", "--group", "abc"]).is_err());
}
