//! Binary entry point for the gscloud CLI.

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gscloud::client::{ApiError, Client};
use gscloud::commands::{
    CommandError, Console, image, info, ip, kubernetes, make_config, network, postgresql,
    request, server, sshkey, storage,
};
use gscloud::config::{AccountSettings, ConfigError, GridscaleConfig};
use gscloud::config_store::{ConfigStore, StarterConfig};
use gscloud::context::CallContext;
use gscloud::objects::ServerUpdateRequest;
use gscloud::types::IpFamily;

mod cli;

use cli::{
    Cli, ClusterCommand, Command, IpCommand, IpSettingsArgs, IsoImageCommand, KubernetesCommand,
    ListOnly, NetworkCommand, PostgresqlCommand, RequestCommand, ServerCommand, SshKeyCommand,
    StorageCommand,
};

const DEFAULT_FILTER: &str = "warn";
const DEBUG_FILTER: &str = "gscloud=debug";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot create API client: {0}")]
    Client(#[from] ApiError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

/// `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let fallback = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let mut console = Console::new(io::stdout(), io::stderr(), cli.output_options());
    match cli.command {
        Command::MakeConfig(args) => {
            make_config::make_config(
                &ConfigStore::new(),
                &mut console,
                &StarterConfig::default(),
                args.force,
            )?;
            Ok(())
        }
        Command::MoveConfig(args) => {
            make_config::move_config(
                &ConfigStore::new(),
                &mut console,
                args.from.as_deref(),
                args.force,
            )?;
            Ok(())
        }
        Command::Version => {
            make_config::version(&mut console)?;
            Ok(())
        }
        Command::Info => {
            let (client, account) = connect(cli.account)?;
            let ctx = CallContext::background();
            info::info(&client, &ctx, &mut console, &account).await?;
            Ok(())
        }
        command => {
            let (client, _) = connect(cli.account)?;
            let ctx = CallContext::background();
            run_api_command(&client, &ctx, &mut console, command).await?;
            Ok(())
        }
    }
}

fn connect(account: Option<String>) -> Result<(Client, AccountSettings), CliError> {
    let config = GridscaleConfig::load_without_cli_args()?.with_account(account);
    let settings = config.validate()?;
    Ok((Client::new(config.client_config()?)?, settings))
}

async fn run_api_command<O, E>(
    client: &Client,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    command: Command,
) -> Result<(), CommandError>
where
    O: Write,
    E: Write,
{
    match command {
        Command::Server(server_command) => run_server(client, ctx, console, server_command).await,
        Command::Storage(StorageCommand::Ls) => storage::list(client, ctx, console).await,
        Command::Storage(StorageCommand::Rm { id }) => {
            storage::remove(client, ctx, console, &id).await
        }
        Command::Storage(StorageCommand::Set {
            name,
            capacity,
            force,
            id,
        }) => storage::set(client, ctx, console, &id, name, capacity, force).await,
        Command::Network(NetworkCommand::Ls) => network::list(client, ctx, console).await,
        Command::Network(NetworkCommand::Rm { id }) => {
            network::remove(client, ctx, console, &id).await
        }
        Command::Network(NetworkCommand::Create { name }) => {
            network::create(client, ctx, console, &name).await
        }
        Command::Ip(IpCommand::Ls { v4, v6 }) => {
            ip::list(client, ctx, console, cli::ip_family(v4, v6)).await
        }
        Command::Ip(IpCommand::Rm { address }) => ip::remove(client, ctx, console, &address).await,
        Command::Ip(IpCommand::Add { v4, v6, settings }) => {
            let family = cli::ip_family(v4, v6).unwrap_or(IpFamily::V4);
            ip::add(client, ctx, console, family, ip_settings(settings)).await
        }
        Command::Ip(IpCommand::Set { address, settings }) => {
            ip::set(client, ctx, console, &address, ip_settings(settings)).await
        }
        Command::Ip(IpCommand::Release { address }) => {
            ip::release(client, ctx, console, &address).await
        }
        Command::SshKey(SshKeyCommand::Ls) => sshkey::list(client, ctx, console).await,
        Command::SshKey(SshKeyCommand::Add { name, file }) => {
            sshkey::add(client, ctx, console, name, &file).await
        }
        Command::SshKey(SshKeyCommand::Rm { key }) => {
            sshkey::remove(client, ctx, console, &key).await
        }
        Command::Template(ListOnly::Ls) => image::templates(client, ctx, console).await,
        Command::IsoImage(IsoImageCommand::Ls) => image::iso_images(client, ctx, console).await,
        Command::IsoImage(IsoImageCommand::Create { name, source_url }) => {
            image::create_iso_image(client, ctx, console, &name, &source_url).await
        }
        Command::IsoImage(IsoImageCommand::Rm { id }) => {
            image::remove_iso_image(client, ctx, console, &id).await
        }
        Command::Kubernetes(KubernetesCommand::Releases) => {
            kubernetes::releases(client, ctx, console).await
        }
        Command::Kubernetes(KubernetesCommand::Cluster(ClusterCommand::RenewCredentials {
            cluster,
        })) => kubernetes::renew_credentials(client, ctx, console, &cluster).await,
        Command::Postgresql(PostgresqlCommand::Releases) => {
            postgresql::releases(client, ctx, console).await
        }
        Command::Request(RequestCommand::Wait { timeout, id }) => {
            request::wait(client, console, &id, timeout.map(Duration::from_secs)).await
        }
        Command::Info | Command::MakeConfig(_) | Command::MoveConfig(_) | Command::Version => {
            Err(CommandError::InvalidArgument(
                "command is handled before connecting".to_owned(),
            ))
        }
    }
}

fn ip_settings(args: IpSettingsArgs) -> ip::IpSettings {
    ip::IpSettings {
        name: args.name,
        failover: args.failover,
        reverse_dns: args.reverse_dns,
    }
}

async fn run_server<O, E>(
    client: &Client,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    command: ServerCommand,
) -> Result<(), CommandError>
where
    O: Write,
    E: Write,
{
    match command {
        ServerCommand::Ls => server::list(client, ctx, console).await,
        ServerCommand::On { id } => server::on(client, ctx, &id).await,
        ServerCommand::Off { force, id } => server::off(client, ctx, &id, force).await,
        ServerCommand::Rm {
            force,
            include_related,
            id,
        } => {
            let args = server::RemoveServer {
                id,
                force,
                include_related,
            };
            server::remove(client, ctx, console, &args).await
        }
        ServerCommand::Create(args) => {
            let request = server::CreateServer {
                name: args.name,
                cores: args.cores,
                memory: args.memory,
                profile: args.profile,
                availability_zone: args.availability_zone,
                auto_recovery: args.auto_recovery,
                template: args.template,
                storage_size: args.storage_size,
                hostname: args.hostname,
                password: args.password,
            };
            server::create(client, ctx, console, request).await
        }
        ServerCommand::Set(args) => {
            let update = ServerUpdateRequest {
                name: args.name,
                cores: args.cores,
                memory: args.memory,
                labels: None,
            };
            server::set(client, ctx, &args.id, update).await
        }
        ServerCommand::Events { id } => server::events(client, ctx, console, &id).await,
        ServerCommand::Assign { id, address } => server::assign(client, ctx, &id, &address).await,
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod main_tests;
