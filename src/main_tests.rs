//! Unit tests for the `gscloud` CLI binary implementation.

use clap::Parser;
use rstest::rstest;

use super::*;
use gscloud::render::Format;
use gscloud::types::{HardwareProfile, IpFamily};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("gscloud").chain(args.iter().copied()))
        .unwrap_or_else(|err| panic!("parse {args:?}: {err}"))
}

#[test]
fn global_flags_select_output_options() {
    let cli = parse(&["server", "ls", "--json", "--noheading", "-q"]);
    let options = cli.output_options();
    assert_eq!(options.format, Format::Json);
    assert!(options.no_header);
    assert!(options.quiet);
}

#[test]
fn server_create_applies_defaults() {
    let cli = parse(&["server", "create", "--name", "web"]);
    let Command::Server(ServerCommand::Create(args)) = cli.command else {
        panic!("expected server create");
    };
    assert_eq!((args.cores, args.memory, args.storage_size), (1, 1, 10));
    assert_eq!(args.profile, HardwareProfile::Q35);
    assert!(args.auto_recovery);
    assert!(args.template.is_none());
}

#[test]
fn server_create_accepts_a_template_and_disabled_recovery() {
    let cli = parse(&[
        "server",
        "create",
        "--name",
        "web",
        "--mem",
        "4",
        "--profile",
        "nested",
        "--auto-recovery",
        "false",
        "--with-template",
        "Ubuntu 22.04",
        "--hostname",
        "web01",
    ]);
    let Command::Server(ServerCommand::Create(args)) = cli.command else {
        panic!("expected server create");
    };
    assert_eq!(args.memory, 4);
    assert_eq!(args.profile, HardwareProfile::Nested);
    assert!(!args.auto_recovery);
    assert_eq!(args.template.as_deref(), Some("Ubuntu 22.04"));
    assert_eq!(args.hostname.as_deref(), Some("web01"));
}

#[test]
fn unknown_hardware_profiles_are_rejected() {
    let err = Cli::try_parse_from(["gscloud", "server", "create", "--name", "a", "--profile", "x"])
        .err()
        .unwrap_or_else(|| panic!("expected rejection"));
    assert!(err.to_string().contains("unknown hardware profile 'x'"), "{err}");
}

#[test]
fn server_rm_takes_short_switches() {
    let cli = parse(&["server", "rm", "-f", "-i", "abc"]);
    let Command::Server(ServerCommand::Rm {
        force,
        include_related,
        id,
    }) = cli.command
    else {
        panic!("expected server rm");
    };
    assert!(force && include_related);
    assert_eq!(id, "abc");
}

#[rstest]
#[case(&["ip", "ls"], None)]
#[case(&["ip", "ls", "-4"], Some(IpFamily::V4))]
#[case(&["ip", "ls", "--v6"], Some(IpFamily::V6))]
fn ip_listing_switches_pick_a_family(#[case] args: &[&str], #[case] expected: Option<IpFamily>) {
    let cli = parse(args);
    let Command::Ip(IpCommand::Ls { v4, v6 }) = cli.command else {
        panic!("expected ip ls");
    };
    assert_eq!(cli::ip_family(v4, v6), expected);
}

#[test]
fn ip_listing_switches_are_exclusive() {
    assert!(Cli::try_parse_from(["gscloud", "ip", "ls", "-4", "-6"]).is_err());
}

#[test]
fn kubernetes_renewal_requires_a_cluster() {
    assert!(
        Cli::try_parse_from(["gscloud", "kubernetes", "cluster", "renew-credentials"]).is_err()
    );
    let cli = parse(&[
        "kubernetes",
        "cluster",
        "renew-credentials",
        "--cluster",
        "k8s-1",
    ]);
    assert!(matches!(
        cli.command,
        Command::Kubernetes(KubernetesCommand::Cluster(ClusterCommand::RenewCredentials {
            ref cluster
        })) if cluster == "k8s-1"
    ));
}

#[rstest]
#[case(&["ip", "add"], IpFamily::V4)]
#[case(&["ip", "create", "-6", "-n", "edge"], IpFamily::V6)]
fn ip_add_defaults_to_ipv4(#[case] args: &[&str], #[case] expected: IpFamily) {
    let cli = parse(args);
    let Command::Ip(IpCommand::Add { v4, v6, settings }) = cli.command else {
        panic!("expected ip add");
    };
    assert_eq!(cli::ip_family(v4, v6).unwrap_or(IpFamily::V4), expected);
    assert!(!settings.failover);
}

#[test]
fn ip_set_collects_the_settings() {
    let cli = parse(&[
        "ip",
        "set",
        "2001:db8::1",
        "--name",
        "edge",
        "--reverse-dns",
        "example.com",
        "--failover",
    ]);
    let Command::Ip(IpCommand::Set { address, settings }) = cli.command else {
        panic!("expected ip set");
    };
    assert_eq!(address, "2001:db8::1");
    assert_eq!(
        (settings.name.as_str(), settings.reverse_dns.as_str(), settings.failover),
        ("edge", "example.com", true)
    );
}

#[test]
fn storage_set_takes_capacity_and_force() {
    let cli = parse(&["storage", "set", "--capacity", "9", "--force", "sto-1"]);
    let Command::Storage(StorageCommand::Set {
        name,
        capacity,
        force,
        id,
    }) = cli.command
    else {
        panic!("expected storage set");
    };
    assert_eq!((name, capacity, force, id.as_str()), (None, Some(9), true, "sto-1"));
}

#[test]
fn iso_image_create_requires_a_source_url() {
    assert!(Cli::try_parse_from(["gscloud", "iso-image", "create", "--name", "x"]).is_err());
    let cli = parse(&[
        "iso-image",
        "create",
        "--name",
        "rescue",
        "--source-url",
        "https://example.com/r.iso",
    ]);
    assert!(matches!(
        cli.command,
        Command::IsoImage(IsoImageCommand::Create { ref source_url, .. })
            if source_url == "https://example.com/r.iso"
    ));
}

#[test]
fn account_is_a_global_flag() {
    let cli = parse(&["info", "--account", "staging"]);
    assert!(matches!(cli.command, Command::Info));
    assert_eq!(cli.account.as_deref(), Some("staging"));
    assert!(parse(&["server", "ls"]).account.is_none());
}

#[test]
fn move_config_accepts_force_and_a_source() {
    let cli = parse(&["move-config", "-f", "--from", "old.yaml"]);
    let Command::MoveConfig(args) = cli.command else {
        panic!("expected move-config");
    };
    assert!(args.force);
    assert_eq!(args.from.as_deref().map(camino::Utf8Path::as_str), Some("old.yaml"));
}

#[test]
fn request_wait_takes_a_timeout_in_seconds() {
    let cli = parse(&["request", "wait", "req-1", "--timeout", "30"]);
    let Command::Request(RequestCommand::Wait { timeout, id }) = cli.command else {
        panic!("expected request wait");
    };
    assert_eq!((timeout, id.as_str()), (Some(30), "req-1"));
}

#[test]
fn write_error_renders_the_chain() {
    let mut buf = Vec::new();
    let err = CliError::Config(ConfigError::MissingField(
        "gridscale user ID is required".to_owned(),
    ));
    write_error(&mut buf, &err);
    let rendered = String::from_utf8(buf).unwrap_or_else(|err| panic!("utf8: {err}"));
    assert!(
        rendered.starts_with("configuration error: "),
        "rendered: {rendered}"
    );
}
