use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args as ClapArgs, Subcommand};
use eyre::WrapErr;
use serde::Deserialize;
use tokio::fs;


/// Site that new hosts are created in when neither the config file nor the command line names one.
pub const DEFAULT_SITE_NAME: &str = "UCB";

/// Request timeout used when the config file doesn't set one.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Command-line flags. Settings that can also come from the config file are all optional here; `Settings` resolves the
// final values.
#[derive(Debug, clap::Parser)]
#[command(name = "ddi", version, about, max_term_width = 100)]
pub struct Args {
    /// Enable debug output. Shorthand for '--log-level debug'.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Controls the verbosity of logs.
    ///
    /// Possible log levels are 'error', 'warn', 'info', 'debug', and 'trace' (in that order).
    #[arg(long, env = "DDI_LOG_LEVEL", value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: log::LevelFilter,

    /// Output in JSON, as a JSend envelope with a 'status' of either 'success' or 'fail'.
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable TLS certificate verification.
    #[arg(short = 'S', long, global = true)]
    pub insecure: bool,

    /// The DDI server's URL to connect to.
    #[arg(short, long, env = "DDI_SERVER", value_name = "URL", global = true)]
    pub server: Option<String>,

    /// The DDI username.
    #[arg(short, long, env = "DDI_USERNAME", global = true)]
    pub username: Option<String>,

    /// The DDI user's password.
    ///
    /// When not given, the password stored with 'password set' is used, and failing that it is prompted for.
    #[arg(short, long, env = "DDI_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Path to a TOML file with default settings (server, username, insecure, site_name, timeout).
    #[arg(long, env = "DDI_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Host based commands.
    #[command(subcommand)]
    Host(HostCommand),

    /// CNAME based commands.
    #[command(subcommand)]
    Cname(CnameCommand),

    /// IPv4 based commands.
    #[command(subcommand)]
    Ipv4(Ipv4Command),

    /// Subnet based commands.
    #[command(subcommand)]
    Subnet(SubnetCommand),

    /// Password commands.
    #[command(subcommand)]
    Password(PasswordCommand),
}

impl Command {
    /// Splits multi-value arguments on any run of whitespace.
    ///
    /// Environment fallbacks such as `DDI_HOST_INFO_HOSTS` arrive as a single string.
    pub fn split_items(&mut self) -> eyre::Result<()> {
        match self {
            Command::Host(HostCommand::Delete { hosts, .. } | HostCommand::Info { hosts }) => {
                split_whitespace(hosts, "hosts")
            },
            Command::Ipv4(Ipv4Command::Info { ips }) => split_whitespace(ips, "IP addresses"),
            Command::Subnet(SubnetCommand::Info { subnets }) => split_whitespace(subnets, "subnets"),
            _ => Ok(()),
        }
    }
}

fn split_whitespace(items: &mut Vec<String>, what: &str) -> eyre::Result<()> {
    *items = items.iter().flat_map(|item| item.split_whitespace()).map(str::to_string).collect();
    if items.is_empty() {
        eyre::bail!("No {what} given");
    }
    Ok(())
}

#[derive(Debug, Subcommand)]
pub enum HostCommand {
    /// Add a single host entry into DDI.
    Add(HostAddArgs),

    /// Delete the host(s) from DDI.
    Delete {
        #[arg(env = "DDI_HOST_DELETE_HOSTS", required = true)]
        hosts: Vec<String>,

        #[command(flatten)]
        confirm: Confirm,
    },

    /// Provide information on the given host(s).
    Info {
        #[arg(env = "DDI_HOST_INFO_HOSTS", required = true)]
        hosts: Vec<String>,
    },
}

/// Options for `host add`. Any that are left out are prompted for.
#[derive(Debug, ClapArgs)]
pub struct HostAddArgs {
    /// The FQDN of the new host.
    #[arg(env = "DDI_HOST_ADD_HOST")]
    pub host: String,

    /// The UCB building the host is in.
    #[arg(short, long)]
    pub building: Option<String>,

    /// Additional comment for the host.
    #[arg(long)]
    pub comment: Option<String>,

    /// The UCB contact for the host.
    #[arg(short, long)]
    pub contact: Option<String>,

    /// The UCB department the host belongs to.
    #[arg(short = 'D', long)]
    pub department: Option<String>,

    /// The IPv4 address for the host as a dotted quad.
    #[arg(short, long)]
    pub ip: Option<String>,

    /// The UCB phone number associated with the host.
    #[arg(short = 'P', long)]
    pub phone: Option<String>,

    /// The DDI site to create the host in. Defaults to the config file's 'site_name', or "UCB".
    #[arg(long)]
    pub site: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CnameCommand {
    /// Add a single CNAME entry to an existing host.
    Add {
        #[arg(env = "DDI_CNAME_ADD_HOST")]
        host: String,

        #[arg(env = "DDI_CNAME_ADD_CNAME")]
        cname: String,
    },

    /// Delete a single CNAME entry for a host.
    Delete {
        #[arg(env = "DDI_CNAME_DELETE_CNAME")]
        cname: String,

        #[command(flatten)]
        confirm: Confirm,
    },

    /// Retrieve the host info associated with a CNAME.
    Info {
        #[arg(env = "DDI_CNAME_INFO_CNAME")]
        cname: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum Ipv4Command {
    /// Provide information on the given IPv4 address(es).
    Info {
        #[arg(env = "DDI_IP_INFO_IPS", required = true)]
        ips: Vec<String>,
    },

    /// Find free IPv4 addresses in the subnet starting at the given address (e.g. 172.23.23.0).
    Free {
        #[arg(env = "DDI_IP_FREE_SUBNET")]
        subnet: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubnetCommand {
    /// Provide the DDI info on the given subnet(s).
    Info {
        #[arg(env = "DDI_SUBNET_INFO_SUBNETS", required = true)]
        subnets: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Set the password in the system keyring.
    Set,
}

/// Skips the confirmation prompt of destructive commands.
#[derive(Debug, Clone, Copy, ClapArgs)]
pub struct Confirm {
    /// Confirm the action without prompting.
    #[arg(long)]
    pub yes: bool,
}


/// Defaults read from the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    pub site_name: Option<String>,
    /// Request timeout, in seconds.
    pub timeout: Option<u64>,
}

impl FileConfig {
    pub async fn load(path: &Path) -> eyre::Result<Self> {
        log::debug!("Reading configuration from {}", path.to_string_lossy());

        let text = fs::read_to_string(path).await.wrap_err("Failed to read config file")?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> eyre::Result<Self> {
        let config: FileConfig = toml::from_str(text).wrap_err("Failed to parse config file")?;
        if config.timeout == Some(0) {
            return Err(eyre::eyre!("timeout must be at least 1 second").wrap_err("Invalid configuration"));
        }
        Ok(config)
    }
}

/// Final session settings: command line and environment first, then the config file, then defaults.
///
/// Server and username may still be missing at this point; they are prompted for when a command needs them.
#[derive(Debug)]
pub struct Settings {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_tls: bool,
    pub site_name: String,
    pub timeout: Duration,
    pub json: bool,
}

impl Settings {
    /// Loads the config file named by `args` (if any) and merges it with the command line.
    pub async fn from_args(args: &Args) -> eyre::Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path).await?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, file))
    }

    fn merge(args: &Args, file: FileConfig) -> Self {
        Self {
            server: args.server.clone().or(file.server),
            username: args.username.clone().or(file.username),
            password: args.password.clone(),
            verify_tls: !(args.insecure || file.insecure),
            site_name: file.site_name.unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            timeout: Duration::from_secs(file.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            json: args.json,
        }
    }

    /// The log level after applying `--debug`.
    pub fn log_level(args: &Args) -> log::LevelFilter {
        if args.debug {
            args.log_level.max(log::LevelFilter::Debug)
        } else {
            args.log_level
        }
    }
}
