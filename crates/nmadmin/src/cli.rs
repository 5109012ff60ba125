//! Clap derive structures for the `nmadmin` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nmadmin -- administer mesh VPN networks from the command line
#[derive(Debug, Parser)]
#[command(
    name = "nmadmin",
    version,
    about = "Administer mesh VPN networks from the command line",
    long_about = "Inspect and edit network settings, ingress gateways and external\n\
        clients on a network management server.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "NMADMIN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "NMADMIN_SERVER", global = true)]
    pub server: Option<String>,

    /// Master key (overrides profile and keyring)
    #[arg(long, env = "NMADMIN_MASTER_KEY", global = true, hide_env_values = true)]
    pub master_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NMADMIN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NMADMIN_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NMADMIN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and edit network settings
    #[command(alias = "net", alias = "n")]
    Networks(NetworksArgs),

    /// Manage external clients and view ingress gateways
    #[command(alias = "ext", alias = "x")]
    Extclients(ExtClientsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NETWORKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NetworksArgs {
    #[command(subcommand)]
    pub command: NetworksCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworksCommand {
    /// List networks
    #[command(alias = "ls")]
    List,

    /// Show a network's settings form
    Get {
        /// Network ID
        netid: String,
    },

    /// Change network settings and submit the update
    Edit {
        /// Network ID
        netid: String,

        /// Field assignment, e.g. `--set defaultmtu=1420` (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,

        /// Validate and show the resulting payload without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate network settings without submitting
    ///
    /// With --from-file the check runs offline against a network record in
    /// the server's JSON format; otherwise the record is fetched by NETID.
    Validate {
        /// Network ID (ignored with --from-file)
        #[arg(required_unless_present = "from_file")]
        netid: Option<String>,

        /// Read the network record from a JSON file
        #[arg(long, short = 'f')]
        from_file: Option<PathBuf>,

        /// Field assignment applied before validating (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Treat the server as having remote command execution enabled
        /// (offline mode only)
        #[arg(long, requires = "from_file")]
        rce: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXTERNAL CLIENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExtClientsArgs {
    #[command(subcommand)]
    pub command: ExtClientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExtClientsCommand {
    /// List a network's ingress gateways and external clients
    #[command(alias = "ls")]
    List {
        /// Network ID
        netid: String,
    },

    /// Create an external client on an ingress gateway
    Create {
        /// Network ID
        netid: String,

        /// Ingress gateway node ID
        gateway: String,
    },

    /// Change an external client's metadata
    Edit {
        /// Network ID
        netid: String,

        /// Client ID
        clientid: String,

        /// New client ID
        #[arg(long, value_name = "CLIENTID")]
        rename: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Enable the client
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable the client
        #[arg(long)]
        disable: bool,
    },

    /// Download an external client's WireGuard config
    Config {
        /// Network ID
        netid: String,

        /// Client ID
        clientid: String,

        /// Fetch the QR code (PNG) instead of the config file
        #[arg(long)]
        qr: bool,

        /// Write to this file instead of stdout (required with --qr)
        #[arg(long = "out", value_name = "PATH", required_if_eq("qr", "true"))]
        out: Option<PathBuf>,
    },

    /// Delete an external client
    #[command(alias = "rm")]
    Delete {
        /// Network ID
        netid: String,

        /// Client ID
        clientid: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the current configuration (secrets redacted)
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a master key in the system keyring
    SetKey {
        /// Profile name (defaults to the active profile)
        name: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
