//! `vexdb generate` — connect to a live server, reflect its tables, and
//! emit one generated Rust model file per table.

mod reflection;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use vexdb_net::discovery::DiscoveryClient;
use vexdb_net::registry::parse_registry_csv;
use vexdb_net::{ConnectOptions, SyncSession};

#[derive(Parser)]
#[command(name = "vexdb", about = "vexdb client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reflect live tables and generate Rust model files.
    Generate {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        tls: bool,
        /// Dataset/service name when resolving via --registry instead of --host.
        #[arg(long)]
        service: Option<String>,
        /// Market/cluster qualifier, informational alongside --service.
        #[arg(long)]
        market: Option<String>,
        /// Environment qualifier for --service resolution.
        #[arg(long)]
        env: Option<String>,
        /// Registry CSV path, required when resolving by --service instead of --host.
        #[arg(long)]
        registry: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        #[arg(long, default_value = "./generated")]
        output: PathBuf,
    },
}

/// Config error (exit 1): neither `--host` nor `--service` was given, or
/// service resolution couldn't find a matching registry row.
struct ConfigError(String);

enum ConnectTarget {
    Direct(ConnectOptions),
    Service { dataset: String, env: String, user: Option<String>, password: Option<String>, registry: Vec<vexdb_net::registry::RegistryEntry> },
}

#[allow(clippy::too_many_arguments)]
fn resolve_connect_target(
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    tls: bool,
    service: Option<String>,
    env: Option<String>,
    registry: Option<PathBuf>,
) -> Result<ConnectTarget, ConfigError> {
    match (host, service) {
        (Some(host), _) => {
            let mut opts = ConnectOptions::new(host, port.unwrap_or(vexdb_core::dsn::DEFAULT_PORT)).tls(tls);
            if let Some(u) = user {
                opts = opts.user(u);
            }
            if let Some(p) = password {
                opts = opts.password(p);
            }
            Ok(ConnectTarget::Direct(opts))
        }
        (None, Some(dataset)) => {
            let registry_path = registry.ok_or_else(|| ConfigError("--service requires --registry <path to registry csv>".into()))?;
            let env = env.ok_or_else(|| ConfigError("--service requires --env".into()))?;
            let data = std::fs::read_to_string(&registry_path)
                .map_err(|e| ConfigError(format!("reading registry csv {}: {e}", registry_path.display())))?;
            let entries = parse_registry_csv(&data).map_err(|e| ConfigError(format!("parsing registry csv: {e}")))?;
            Ok(ConnectTarget::Service { dataset, env, user, password, registry: entries })
        }
        (None, None) => Err(ConfigError("one of --host or --service is required".into())),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate { host, port, user, password, tls, service, market: _, env, registry, tables, output } => {
            let target = match resolve_connect_target(host, port, user, password, tls, service, env, registry) {
                Ok(target) => target,
                Err(ConfigError(msg)) => {
                    eprintln!("{} {msg}", "config error:".red().bold());
                    return ExitCode::from(1);
                }
            };

            let connected = match target {
                ConnectTarget::Direct(opts) => SyncSession::connect(opts),
                ConnectTarget::Service { dataset, env, user, password, registry } => {
                    DiscoveryClient::new(registry).connect(&dataset, &env, user.as_deref(), password.as_deref())
                }
            };
            let mut session = match connected {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{} {e}", "rpc error:".red().bold());
                    return ExitCode::from(2);
                }
            };

            match reflection::generate(&mut session, &tables, &output) {
                Ok(count) => {
                    println!("{} generated {count} model file(s) in {}", "✓".green().bold(), output.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{} {e}", "rpc error:".red().bold());
                    ExitCode::from(2)
                }
            }
        }
    }
}
