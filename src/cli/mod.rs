//! Command-line interface definitions for the `gscloud` binary.

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser, Subcommand};

use gscloud::render::{Format, OutputOptions};
use gscloud::types::{HardwareProfile, IpFamily};

/// Top-level CLI for the `gscloud` binary.
#[derive(Debug, Parser)]
#[command(
    name = "gscloud",
    about = "Manage gridscale cloud resources from the command line",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Print JSON instead of tables.
    #[arg(short = 'j', long, global = true)]
    pub(crate) json: bool,
    /// Omit the heading row of tables.
    #[arg(long = "noheading", global = true)]
    pub(crate) no_heading: bool,
    /// Print object identifiers only.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,
    /// Log API traffic to standard error.
    #[arg(long, global = true)]
    pub(crate) debug: bool,
    /// Name of the configured account to use.
    #[arg(long, global = true, value_name = "NAME")]
    pub(crate) account: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    pub(crate) const fn output_options(&self) -> OutputOptions {
        OutputOptions {
            format: if self.json { Format::Json } else { Format::Table },
            no_header: self.no_heading,
            quiet: self.quiet,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Operations on servers.
    #[command(subcommand)]
    Server(ServerCommand),
    /// Operations on storages.
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Operations on networks.
    #[command(subcommand)]
    Network(NetworkCommand),
    /// Operations on IP addresses.
    #[command(subcommand)]
    Ip(IpCommand),
    /// Operations on SSH keys.
    #[command(name = "ssh-key", subcommand)]
    SshKey(SshKeyCommand),
    /// Operations on storage templates.
    #[command(subcommand)]
    Template(ListOnly),
    /// Operations on ISO images.
    #[command(name = "iso-image", subcommand)]
    IsoImage(IsoImageCommand),
    /// Operations on managed Kubernetes clusters.
    #[command(subcommand)]
    Kubernetes(KubernetesCommand),
    /// Operations on managed PostgreSQL services.
    #[command(subcommand)]
    Postgresql(PostgresqlCommand),
    /// Asynchronous API requests.
    #[command(subcommand)]
    Request(RequestCommand),
    /// Print the selected account and its object counts.
    Info,
    /// Write a starter configuration file.
    #[command(name = "make-config")]
    MakeConfig(MakeConfigCommand),
    /// Import the accounts of a legacy config.yaml.
    #[command(name = "move-config")]
    MoveConfig(MoveConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ServerCommand {
    /// List servers.
    Ls,
    /// Power a server on.
    On {
        /// Server identifier.
        id: String,
    },
    /// Shut a server down.
    Off {
        /// Cut power instead of an ACPI shutdown.
        #[arg(long)]
        force: bool,
        /// Server identifier.
        id: String,
    },
    /// Remove a server.
    Rm {
        /// Power the server off first and remove related objects.
        #[arg(short, long)]
        force: bool,
        /// Also remove attached storages and assigned IP addresses.
        #[arg(short = 'i', long)]
        include_related: bool,
        /// Server identifier.
        id: String,
    },
    /// Create a server.
    Create(CreateServerArgs),
    /// Change properties of a server.
    Set(SetServerArgs),
    /// List the events of a server.
    Events {
        /// Server identifier.
        id: String,
    },
    /// Assign an IP address to a server.
    Assign {
        /// Server identifier.
        id: String,
        /// IP address identifier or literal address.
        address: String,
    },
}

#[derive(Debug, Args)]
pub(crate) struct CreateServerArgs {
    /// Name of the server.
    #[arg(long)]
    pub(crate) name: String,
    /// Number of cores.
    #[arg(long, default_value_t = 1)]
    pub(crate) cores: u32,
    /// Memory in GB.
    #[arg(long = "mem", default_value_t = 1)]
    pub(crate) memory: u32,
    /// Hardware profile.
    #[arg(long, default_value = "q35")]
    pub(crate) profile: HardwareProfile,
    /// Availability zone.
    #[arg(long)]
    pub(crate) availability_zone: Option<String>,
    /// Restart the server automatically after a failure.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) auto_recovery: bool,
    /// Template to provision a boot storage from.
    #[arg(long = "with-template", value_name = "NAME")]
    pub(crate) template: Option<String>,
    /// Boot storage size in GB.
    #[arg(long, default_value_t = 10)]
    pub(crate) storage_size: u32,
    /// Host name of the provisioned system.
    #[arg(long)]
    pub(crate) hostname: Option<String>,
    /// Root password; generated when omitted.
    #[arg(long)]
    pub(crate) password: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct SetServerArgs {
    /// Server identifier.
    pub(crate) id: String,
    /// New name.
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// New number of cores.
    #[arg(long)]
    pub(crate) cores: Option<u32>,
    /// New memory in GB.
    #[arg(long = "mem")]
    pub(crate) memory: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum StorageCommand {
    /// List storages.
    Ls,
    /// Remove a storage.
    Rm {
        /// Storage identifier.
        id: String,
    },
    /// Rename or resize a storage.
    Set {
        /// New name.
        #[arg(short, long)]
        name: Option<String>,
        /// New size in GB.
        #[arg(long)]
        capacity: Option<u32>,
        /// Allow shrinking the storage.
        #[arg(long)]
        force: bool,
        /// Storage identifier.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum NetworkCommand {
    /// List networks.
    Ls,
    /// Remove a network.
    Rm {
        /// Network identifier.
        id: String,
    },
    /// Create a network.
    Create {
        /// Name of the network.
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum IpCommand {
    /// List IP addresses.
    Ls {
        /// Only IPv4 addresses.
        #[arg(short = '4', long = "v4", conflicts_with = "v6")]
        v4: bool,
        /// Only IPv6 addresses.
        #[arg(short = '6', long = "v6")]
        v6: bool,
    },
    /// Delete an IP address.
    #[command(alias = "remove")]
    Rm {
        /// IP address identifier or literal address.
        address: String,
    },
    /// Allocate an IP address.
    #[command(alias = "create")]
    Add {
        /// Allocate an IPv4 address (the default).
        #[arg(short = '4', long = "v4", conflicts_with = "v6")]
        v4: bool,
        /// Allocate an IPv6 address.
        #[arg(short = '6', long = "v6")]
        v6: bool,
        #[command(flatten)]
        settings: IpSettingsArgs,
    },
    /// Update the properties of an IP address.
    Set {
        /// IP address identifier or literal address.
        address: String,
        #[command(flatten)]
        settings: IpSettingsArgs,
    },
    /// Detach an IP address from its server or load balancer.
    Release {
        /// IP address identifier or literal address.
        address: String,
    },
}

#[derive(Debug, Args)]
pub(crate) struct IpSettingsArgs {
    /// Name of the address.
    #[arg(short, long, default_value = "")]
    pub(crate) name: String,
    /// Mark the address as failover address.
    #[arg(long)]
    pub(crate) failover: bool,
    /// Reverse DNS (PTR) entry.
    #[arg(long, default_value = "")]
    pub(crate) reverse_dns: String,
}

/// Address family selected by the `-4` and `-6` switches.
pub(crate) const fn ip_family(v4: bool, v6: bool) -> Option<IpFamily> {
    match (v4, v6) {
        (true, _) => Some(IpFamily::V4),
        (false, true) => Some(IpFamily::V6),
        (false, false) => None,
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum SshKeyCommand {
    /// List SSH keys.
    Ls,
    /// Upload a public key.
    Add {
        /// Name of the key.
        #[arg(long)]
        name: String,
        /// Path of the public key file.
        #[arg(long)]
        file: Utf8PathBuf,
    },
    /// Remove a key by identifier or name.
    Rm {
        /// Key identifier or name.
        key: String,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum ListOnly {
    /// List objects.
    Ls,
}

#[derive(Debug, Subcommand)]
pub(crate) enum IsoImageCommand {
    /// List ISO images.
    Ls,
    /// Import an ISO image from a URL.
    Create {
        /// Name of the image.
        #[arg(long)]
        name: String,
        /// URL the image is downloaded from.
        #[arg(long)]
        source_url: String,
    },
    /// Remove an ISO image.
    #[command(alias = "remove")]
    Rm {
        /// Image identifier.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum PostgresqlCommand {
    /// List available PostgreSQL releases.
    Releases,
}

#[derive(Debug, Subcommand)]
pub(crate) enum RequestCommand {
    /// Wait until an asynchronous request finishes.
    Wait {
        /// Give up after this many seconds.
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
        /// Request identifier.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum KubernetesCommand {
    /// List available Kubernetes releases.
    Releases,
    /// Operations on clusters.
    #[command(subcommand)]
    Cluster(ClusterCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum ClusterCommand {
    /// Issue new credentials for a cluster.
    RenewCredentials {
        /// Cluster identifier.
        #[arg(long)]
        cluster: String,
    },
}

/// Arguments for the `gscloud make-config` subcommand.
#[derive(Debug, Args)]
pub(crate) struct MakeConfigCommand {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub(crate) force: bool,
}

/// Arguments for the `gscloud move-config` subcommand.
#[derive(Debug, Args)]
pub(crate) struct MoveConfigCommand {
    /// Overwrite an existing configuration file.
    #[arg(short, long)]
    pub(crate) force: bool,
    /// Legacy file to import instead of the discovered one.
    #[arg(long, value_name = "PATH")]
    pub(crate) from: Option<Utf8PathBuf>,
}
