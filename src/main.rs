use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ledgergate::api::ApiError;
use ledgergate::audit::{AuditLogQuery, ExportFormat, action_class, local_offset};
use ledgergate::config::{ClientConfig, ConfigError};
use ledgergate::context::AppContext;
use ledgergate::identity::Identity;
use ledgergate::router::NavigationError;
use ledgergate::session::HistoryNavigator;
use ledgergate::storage::FileStore;
use ledgergate::theme::Theme;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

const DEFAULT_GUARD_PATHS: [&str; 3] = ["/", "/home", "/admin/dashboard"];

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("not logged in; run `ledgergate login --token <token>` first")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "ledgergate", about = "Session, route guard and audit log client for the bookkeeping backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the stored session and theme.
    Status,
    /// Store a session for `token`.
    Login {
        #[arg(long, env = "LEDGERGATE_TOKEN")]
        token: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    Logout,
    /// Re-verify the stored session against the backend.
    Check,
    /// Evaluate the route guard for each path.
    Guard { paths: Vec<String> },
    Theme { theme: Option<Theme> },
    Audit {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        export: Option<ExportFormat>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, CliError> {
    // Must run while the process is still single-threaded.
    let offset = local_offset();
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let storage = Arc::new(FileStore::new(config.store_path.clone()));
    let ctx = AppContext::new(config, storage, Arc::new(HistoryNavigator::new()))?;

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => run_status(&ctx),
        Command::Login { token, role, name } => run_login(&ctx, token, role, name).await,
        Command::Logout => {
            ctx.session.logout();
            println!("logged out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => run_check(&ctx).await,
        Command::Guard { paths } => run_guard(&ctx, paths),
        Command::Theme { theme } => {
            if let Some(theme) = theme {
                ctx.set_theme(theme);
            }
            println!("{}", ctx.theme());
            Ok(ExitCode::SUCCESS)
        }
        Command::Audit { page, per_page, action, export } => {
            let query = AuditLogQuery { page, per_page, action, ..AuditLogQuery::default() };
            run_audit(&ctx, &query, export, offset).await
        }
    }
}

fn run_status(ctx: &AppContext) -> Result<ExitCode, CliError> {
    let snapshot = ctx.session.snapshot();
    match &snapshot.identity {
        Some(identity) => {
            let role = identity.role.as_ref().map_or("unknown", |r| r.as_str());
            println!("logged in as {} (role: {role}, admin: {})", identity.label(), identity.is_admin());
        }
        None => println!("logged out"),
    }
    println!("theme: {}", ctx.theme());
    Ok(ExitCode::SUCCESS)
}

async fn run_login(
    ctx: &AppContext,
    token: String,
    role: Option<String>,
    name: Option<String>,
) -> Result<ExitCode, CliError> {
    let mut identity = Identity::new(token);
    if let Some(role) = role {
        identity = identity.with_role(role);
    }
    if let Some(name) = name {
        identity = identity.with_field("name", name);
    }

    if let Some(lookup) = ctx.session.login(identity) {
        if let Err(e) = lookup.await {
            tracing::warn!(error = %e, "role lookup task failed");
        }
    }
    run_status(ctx)
}

async fn run_check(ctx: &AppContext) -> Result<ExitCode, CliError> {
    if ctx.session.check_auth().await {
        println!("session valid");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("session invalid");
        Ok(ExitCode::FAILURE)
    }
}

fn run_guard(ctx: &AppContext, paths: Vec<String>) -> Result<ExitCode, CliError> {
    let paths = if paths.is_empty() {
        DEFAULT_GUARD_PATHS.iter().map(|p| (*p).to_owned()).collect()
    } else {
        paths
    };

    for path in &paths {
        let nav = ctx.guard.before_each(path)?;
        if nav.redirected {
            println!("{path} -> {} ({})", nav.path, nav.route);
        } else {
            println!("{path} ok ({})", nav.route);
        }
    }
    for toast in ctx.toasts.snapshot() {
        println!("[{}] {}", toast.severity, toast.message);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_audit(
    ctx: &AppContext,
    query: &AuditLogQuery,
    export: Option<ExportFormat>,
    offset: UtcOffset,
) -> Result<ExitCode, CliError> {
    let token = ctx.token().ok_or(CliError::NotLoggedIn)?;
    let page = match export {
        Some(format) => ctx.http.export_audit_logs(Some(&token), format, query).await?,
        None => ctx.http.audit_logs(Some(&token), query).await?,
    };

    for entry in &page.logs {
        let class = action_class(&entry.action);
        let class = if class.is_empty() { "-" } else { class };
        println!("{}  {:<22} {class}", entry.display_timestamp(offset), entry.action_label());
    }
    eprintln!("{} entries", page.logs.len());
    Ok(ExitCode::SUCCESS)
}
