
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use dalli::config::{ClientConfig, ConfigError, normalize_api_url};
use dalli::i18n::{Language, Message};
use dalli::state::guard::{self, GuardDecision, RouteGuard};
use dalli::state::prefs::{Preferences, Theme};
use dalli::state::session::{SessionError, SessionStore};
use dalli::state::users::{NoticeKind, UsersScreen};
use dalli::storage::{FileStore, KeyValueStore, StorageError};
use dalli::{ApiError, HttpApi, ManagedUser};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("http client setup failed: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Rejected(String),
    #[error("sign-in required; redirected to {0}")]
    Redirect(&'static str),
    #[error("no route for {0}")]
    NotFound(String),
    #[error("no user with id {0} on the users screen")]
    UnknownUser(i64),
    #[error("name and email are required (and a password when creating)")]
    IncompleteForm,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dalli", about = "Dalli dashboard client")]
struct Cli {
    /// API base URL; overrides DALLI_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for the persisted token and preferences; overrides DALLI_STATE_DIR.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session token.
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DALLI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in with it.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DALLI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the persisted session.
    Signout,
    /// Print the signed-in user.
    Whoami,
    /// Run the route guard for a path and print the decision.
    Open { path: String },
    Users(UsersCommand),
    Settings(SettingsCommand),
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Update a user; omitted fields keep their current values.
    Update {
        user_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Delete {
        user_id: i64,
    },
}

#[derive(Args, Debug)]
struct SettingsCommand {
    #[command(subcommand)]
    command: SettingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SettingsSubcommand {
    Show,
    Language { language: LanguageArg },
    Theme { theme: ThemeArg },
    /// Flip between light and dark, pinning the result as an explicit theme.
    ToggleDark {
        /// Whether the operating system currently prefers dark mode.
        #[arg(long)]
        system_dark: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LanguageArg {
    En,
    Ko,
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::En => Language::En,
            LanguageArg::Ko => Language::Ko,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::System => Theme::System,
        }
    }
}

struct CliContext {
    api: Arc<HttpApi>,
    store: SessionStore,
    prefs: Preferences,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = normalize_api_url(url)?;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_dir)?);
    let api = Arc::new(HttpApi::new(&config)?);
    let store = SessionStore::new(api.clone(), storage.clone());
    let prefs = Preferences::load(storage.clone());
    tracing::debug!(api_url = %config.api_url, state_dir = %config.state_dir.display(), "client configured");

    let mut ctx = CliContext { api, store, prefs };

    match cli.command {
        Command::Signin { email, password } => run_signin(&ctx, &email, &password).await,
        Command::Signup { name, email, password } => run_signup(&ctx, &name, &email, &password).await,
        Command::Signout => {
            ctx.store.logout();
            eprintln!("{}", Message::SignedOut.text(ctx.prefs.language()));
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx).await,
        Command::Open { path } => run_open(&ctx, &path).await,
        Command::Users(users) => run_users(&ctx, users).await,
        Command::Settings(settings) => run_settings(&mut ctx, settings).await,
    }
}

// =============================================================================
// SESSION COMMANDS
// =============================================================================

fn session_failure(error: &SessionError, fallback: Message, lang: Language) -> CliError {
    match error {
        SessionError::Storage(_) => CliError::Rejected(error.to_string()),
        SessionError::Api(_) => CliError::Rejected(error.detail().unwrap_or_else(|| fallback.text(lang)).to_owned()),
    }
}

async fn run_signin(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let lang = ctx.prefs.language();
    ctx.store
        .login(email, password)
        .await
        .map_err(|e| session_failure(&e, Message::LoginFailed, lang))?;
    after_sign_in(ctx)
}

async fn run_signup(ctx: &CliContext, name: &str, email: &str, password: &str) -> Result<(), CliError> {
    let lang = ctx.prefs.language();
    ctx.store
        .register(name, email, password)
        .await
        .map_err(|e| session_failure(&e, Message::RegisterFailed, lang))?;
    after_sign_in(ctx)
}

/// Mirror the form's post-submit navigation to the dashboard.
fn after_sign_in(ctx: &CliContext) -> Result<(), CliError> {
    match RouteGuard::new(ctx.store.clone()).check(guard::DASHBOARD_PATH) {
        GuardDecision::Allow => print_json(&serde_json::to_value(ctx.store.user())?),
        GuardDecision::Redirect(to) => Err(CliError::Redirect(to)),
        GuardDecision::NotFound => Err(CliError::NotFound(guard::DASHBOARD_PATH.to_owned())),
    }
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    ctx.store.hydrate().await;
    print_json(&serde_json::to_value(ctx.store.user())?)
}

async fn run_open(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    ctx.store.hydrate().await;
    let decision = RouteGuard::new(ctx.store.clone()).check(path);
    let rendered = match decision {
        GuardDecision::Allow => serde_json::json!({ "path": path, "decision": "allow" }),
        GuardDecision::Redirect(to) => serde_json::json!({ "path": path, "decision": "redirect", "to": to }),
        GuardDecision::NotFound => serde_json::json!({ "path": path, "decision": "not_found" }),
    };
    print_json(&rendered)
}

/// Hydrate, then require the guard to allow `path`.
async fn enter_protected(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    ctx.store.hydrate().await;
    match RouteGuard::new(ctx.store.clone()).check(path) {
        GuardDecision::Allow => Ok(()),
        GuardDecision::Redirect(to) => Err(CliError::Redirect(to)),
        GuardDecision::NotFound => Err(CliError::NotFound(path.to_owned())),
    }
}

// =============================================================================
// USERS SCREEN
// =============================================================================

async fn run_users(ctx: &CliContext, users: UsersCommand) -> Result<(), CliError> {
    enter_protected(ctx, "/dashboard/users").await?;

    let lang = ctx.prefs.language();
    let mut screen = UsersScreen::new(ctx.api.clone(), lang);
    let loaded = screen.refresh().await;

    match users.command {
        UsersSubcommand::List { page } => {
            report_notice(&screen)?;
            screen.go_to_page(page);
            let rows: Vec<Value> = screen.page_rows().iter().map(|u| row_json(u, lang)).collect();
            if rows.is_empty() {
                eprintln!("{}", Message::NoUsers.text(lang));
            }
            let mut listing = serde_json::json!({ "users": rows });
            if screen.shows_pagination() {
                listing["page"] = screen.current_page().into();
                listing["total_pages"] = screen.total_pages().into();
            }
            print_json(&listing)
        }
        UsersSubcommand::Create { name, email, password } => {
            screen.open_create();
            *screen.form_mut() = dalli::UserForm { name, email, password };
            submit(&mut screen).await
        }
        UsersSubcommand::Update { user_id, name, email, password } => {
            if !loaded {
                report_notice(&screen)?;
            }
            if !screen.open_edit(user_id) {
                return Err(CliError::UnknownUser(user_id));
            }
            let form = screen.form_mut();
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(email) = email {
                form.email = email;
            }
            if let Some(password) = password {
                form.password = password;
            }
            submit(&mut screen).await
        }
        UsersSubcommand::Delete { user_id } => {
            screen.delete(user_id).await;
            report_notice(&screen)
        }
    }
}

async fn submit(screen: &mut UsersScreen) -> Result<(), CliError> {
    if !screen.can_submit() {
        return Err(CliError::IncompleteForm);
    }
    screen.submit().await;
    report_notice(screen)
}

/// Success notices go to stderr; danger notices become the command's error.
fn report_notice(screen: &UsersScreen) -> Result<(), CliError> {
    match screen.notice() {
        Some(notice) if notice.kind == NoticeKind::Danger => Err(CliError::Rejected(notice.message.clone())),
        Some(notice) => {
            eprintln!("{}", notice.message);
            Ok(())
        }
        None => Ok(()),
    }
}

fn row_json(user: &ManagedUser, lang: Language) -> Value {
    let status = if user.is_active { Message::Active } else { Message::Inactive };
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "admin": user.is_admin(),
        "status": status.text(lang),
        "created_at": user.created_at,
    })
}

// =============================================================================
// SETTINGS
// =============================================================================

async fn run_settings(ctx: &mut CliContext, settings: SettingsCommand) -> Result<(), CliError> {
    match settings.command {
        SettingsSubcommand::Show => {}
        SettingsSubcommand::Language { language } => ctx.prefs.set_language(language.into())?,
        SettingsSubcommand::Theme { theme } => ctx.prefs.set_theme(theme.into())?,
        SettingsSubcommand::ToggleDark { system_dark } => {
            ctx.prefs.toggle_dark(system_dark)?;
        }
    }
    print_json(&settings_json(ctx).await)
}

/// Settings view; a held token only counts as signed in once its profile loads.
async fn settings_json(ctx: &CliContext) -> Value {
    ctx.store.hydrate().await;
    serde_json::json!({
        "language": ctx.prefs.language().code(),
        "theme": ctx.prefs.theme().as_str(),
        "signed_in": ctx.store.is_authenticated(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
