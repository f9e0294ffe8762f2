use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use sems_client::guard::{self, RouteAccess};
use sems_client::types::{
    CreateStudentProfileRequest, LoginRequest, RegisterRequest, UpdateStudentProfileRequest, UserRole,
};
use sems_client::config::normalize_url;
use sems_client::{ApiClient, ApiError, ClientConfig, FileTokenStore, SessionError, SessionManager, StudentsApi};

const REVOKE_WAIT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not signed in; run `sems login` first")]
    NotSignedIn,
    #[error("nothing to update; pass at least one field")]
    EmptyUpdate,
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    fn message(&self) -> String {
        match self {
            Self::Session(e) => e.message(),
            Self::Api(e) => e.message(),
            other => other.to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sems", about = "Student Employment System client")]
struct Cli {
    /// Overrides `API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides `API_GATEWAY_URL`.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Overrides `SEMS_TOKEN_FILE`.
    #[arg(long)]
    token_file: Option<String>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the returned tokens.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SEMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in to it.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SEMS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "student")]
        role: UserRole,
    },
    /// Sign out and forget the stored tokens.
    Logout,
    /// Print the signed-in user.
    Whoami,
    /// Print the session state after restoring it.
    Status,
    /// Exchange the refresh token for a new pair.
    Refresh,
    /// Student profile commands.
    StudentProfile(StudentProfileCommand),
    /// Print the effective client configuration.
    Config,
}

#[derive(Args, Debug)]
struct StudentProfileCommand {
    #[command(subcommand)]
    command: StudentProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum StudentProfileSubcommand {
    Get,
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        iin: String,
        #[arg(long)]
        university_id: Option<String>,
    },
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        university_id: Option<String>,
    },
}

type Manager = SessionManager<ApiClient, FileTokenStore>;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.api_url = normalize_url(url);
    }
    if let Some(url) = &cli.gateway_url {
        config.gateway_url = normalize_url(url);
    }
    if let Some(path) = &cli.token_file {
        config.token_file = path.into();
    }
    config
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_config(&cli);
    if matches!(cli.command, Command::Config) {
        return print_json(&json!({
            "api_url": config.api_url,
            "gateway_url": config.gateway_url,
            "effective_base_url": config.effective_base_url(),
            "token_file": config.token_file.display().to_string(),
            "request_timeout_secs": config.timeouts.request_secs,
            "connect_timeout_secs": config.timeouts.connect_secs,
        }));
    }

    let client = ApiClient::from_config(&config)?;
    let session: Manager = SessionManager::new(client.clone(), FileTokenStore::new(&config.token_file));
    session.bootstrap().await;

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(LoginRequest { email, password }).await?;
            print_json(&user)
        }
        Command::Register { email, password, role } => {
            let user = session.register(RegisterRequest { email, password, role }).await?;
            print_json(&user)
        }
        Command::Logout => {
            if let Some(revoke) = session.logout() {
                // Best-effort; the local sign-out already happened.
                let _ = tokio::time::timeout(REVOKE_WAIT, revoke).await;
            }
            print_json(&json!({ "state": session.state().label() }))
        }
        Command::Whoami => {
            let user = session.current_user().ok_or(CliError::NotSignedIn)?;
            print_json(&user)
        }
        Command::Status => {
            let state = session.state();
            print_json(&json!({
                "state": state.label(),
                "authenticated": state.is_authenticated(),
                "protected_route": format!("{:?}", guard::decide(RouteAccess::Protected, &state)),
                "redirect_to_login": guard::should_redirect_unauth(&state),
                "user": state.user(),
            }))
        }
        Command::Refresh => {
            session.refresh().await?;
            print_json(&json!({ "state": session.state().label(), "refreshed": true }))
        }
        Command::StudentProfile(profile) => run_student_profile(&session, StudentsApi::new(client), profile).await,
        Command::Config => Ok(()),
    }
}

async fn run_student_profile(
    session: &Manager,
    students: StudentsApi,
    profile: StudentProfileCommand,
) -> Result<(), CliError> {
    let token = session.access_token().ok_or(CliError::NotSignedIn)?;
    match profile.command {
        StudentProfileSubcommand::Get => {
            let profile = students.get_profile(&token).await?;
            print_json(&profile)
        }
        StudentProfileSubcommand::Create { first_name, last_name, iin, university_id } => {
            let request = CreateStudentProfileRequest { first_name, last_name, iin, university_id };
            let profile = students.create_profile(&token, &request).await?;
            print_json(&profile)
        }
        StudentProfileSubcommand::Update { first_name, last_name, university_id } => {
            let request = UpdateStudentProfileRequest { first_name, last_name, university_id };
            if request.is_empty() {
                return Err(CliError::EmptyUpdate);
            }
            let profile = students.update_profile(&token, &request).await?;
            print_json(&profile)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
