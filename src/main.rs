mod client;
mod config;
mod report;
mod resolver;
mod schema;

use crate::client::{ApiClient, ApiError, Session};
use crate::config::{EffectiveConfig, Overrides, Scope};
use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sumactl",
    version,
    about = "CLI reports for the SUSE Manager XML-RPC API"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "API endpoint override for this invocation (otherwise read from config)"
    )]
    endpoint: Option<String>,

    #[arg(long, global = true, help = "API username override for this invocation")]
    username: Option<String>,

    #[arg(long, global = true, help = "API password override for this invocation")]
    password: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Skip TLS certificate verification (self-signed endpoints; logged loudly)"
    )]
    insecure_tls: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist the --endpoint/--username/--password/--insecure-tls flags to
    /// the chosen scope
    Configure {
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// User reports
    #[command(subcommand)]
    User(UserCommand),
    /// System reports
    #[command(subcommand)]
    System(SystemCommand),
    /// Validate stored credentials with a login/logout round trip
    Validate,
    /// Show current configuration (password masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Show details for one user
    Get {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// List all users
    List,
}

#[derive(Subcommand)]
enum SystemCommand {
    /// List all registered systems with resolved IP addresses
    List,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let Cli {
        endpoint,
        username,
        password,
        insecure_tls,
        command,
    } = cli;

    match command {
        Commands::Configure { scope } => {
            let username = username
                .ok_or_else(|| anyhow!("provide --username and --password to configure"))?;
            let password = password
                .ok_or_else(|| anyhow!("provide --username and --password to configure"))?;

            let mut existing = config::load_scope(scope.into(), &cwd)?;
            existing.username = Some(username);
            existing.password = Some(password);
            if let Some(endpoint) = endpoint {
                existing.endpoint = Some(endpoint);
            }
            existing.insecure_tls = insecure_tls;

            let path = config::save(scope.into(), &existing, &cwd)?;
            println!("Saved API credentials to {}", path.display());
            Ok(())
        }
        Commands::ConfigShow => {
            let mut masked = config::load(&cwd)?;
            if masked.password.is_some() {
                masked.password = Some("*****".into());
            }
            print!("{}", serde_yaml::to_string(&masked)?);
            Ok(())
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Zsh => {
                    generate(shells::Zsh, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut std::io::stdout())
                }
            }
            Ok(())
        }
        command => {
            let effective = config::resolve(
                &cwd,
                Overrides {
                    endpoint,
                    username,
                    password,
                    insecure_tls,
                },
            )?;

            match command {
                Commands::User(UserCommand::Get { username }) => {
                    with_session(&effective, |client, session| {
                        report::user_detail(client, session, &username)
                    })
                }
                Commands::User(UserCommand::List) => with_session(&effective, report::user_list),
                Commands::System(SystemCommand::List) => {
                    with_session(&effective, report::system_list)
                }
                Commands::Validate => validate(&effective),
                _ => unreachable!("handled earlier"),
            }
        }
    }
}

/// Opens a session, runs one report, and closes the session again. The token
/// is invalidated even when the report step failed; a failed logout is a
/// warning only, since the report output has already been delivered.
fn with_session<F>(cfg: &EffectiveConfig, run_report: F) -> Result<()>
where
    F: FnOnce(&ApiClient, &Session) -> Result<(), ApiError>,
{
    let client = ApiClient::new(&cfg.endpoint, cfg.insecure_tls)?;
    let session = client.login(&cfg.username, &cfg.password)?;

    let outcome = run_report(&client, &session);
    match client.logout(&session) {
        Ok(()) => println!("\nSession closed successfully."),
        Err(err) => eprintln!("WARNING: logout failed - {err}"),
    }

    outcome?;
    Ok(())
}

fn validate(cfg: &EffectiveConfig) -> Result<()> {
    println!(
        "Validating credentials for {} at {}...",
        cfg.username, cfg.endpoint
    );
    let client = ApiClient::new(&cfg.endpoint, cfg.insecure_tls)?;
    match client.login(&cfg.username, &cfg.password) {
        Ok(session) => {
            if let Err(err) = client.logout(&session) {
                eprintln!("WARNING: logout failed - {err}");
            }
            println!("API login: ok");
        }
        Err(err) => println!("API login: FAILED ({err})"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
