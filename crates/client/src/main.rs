//! `tricol`: command-line access to the Tricol session.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use tricol_auth::{AuthContext, FileStorage, LoginRequest, RegisterRequest, decode_claims};
use tricol_client::{ClientConfig, Pipeline, ReqwestTransport, SessionState, TracingNavigator};

#[derive(Parser)]
#[command(
    name = "tricol",
    about = "Sign in to the Tricol back office and inspect the stored session",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the returned tokens
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRICOL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRICOL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
    /// Show whether a valid session is stored
    Status,
    /// List the permissions granted by the stored access token
    Permissions,
    /// Forget the stored session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("invalid TRICOL_* configuration")?;
    tricol_observability::init_with_default(config.log_level());

    let storage = FileStorage::open(&config.storage_path)
        .with_context(|| format!("failed to open session storage at {:?}", config.storage_path))?;
    let ctx = AuthContext::new(Arc::new(storage));

    let transport =
        ReqwestTransport::new(config.api_timeout).context("failed to build HTTP client")?;
    let pipeline =
        Pipeline::authenticated(Arc::new(transport), ctx.clone(), Arc::new(TracingNavigator));
    let session = SessionState::new(ctx.clone(), Arc::new(pipeline), &config.api_url);

    match cli.command {
        Command::Login { email, password } => {
            let auth = session
                .login(&LoginRequest { email, password })
                .await
                .context("login failed")?;
            println!("signed in ({} token stored)", auth.token_type);
            print_permissions(&ctx);
        }
        Command::Register {
            email,
            password,
            full_name,
        } => {
            let answer = session
                .register(&RegisterRequest {
                    email,
                    password,
                    full_name,
                })
                .await
                .context("registration failed")?;
            println!("{answer}");
        }
        Command::Status => {
            if !session.is_authenticated() {
                println!("not signed in");
                return Ok(());
            }
            let expires_at = ctx
                .tokens()
                .access_token()
                .and_then(|t| decode_claims(&t).ok())
                .and_then(|c| c.expires_at());
            match expires_at {
                Some(at) => println!(
                    "signed in; access token expires in {}s",
                    (at - Utc::now()).num_seconds()
                ),
                None => println!("signed in"),
            }
            print_permissions(&ctx);
        }
        Command::Permissions => print_permissions(&ctx),
        Command::Logout => {
            session.logout();
            println!("signed out");
        }
    }

    Ok(())
}

fn print_permissions(ctx: &AuthContext) {
    let permissions = ctx.permissions().user_permissions();
    if permissions.is_empty() {
        println!("no permissions");
        return;
    }
    for permission in &permissions {
        println!("{permission}");
    }
}
