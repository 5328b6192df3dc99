use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

mod auth;
mod balance;
mod config;
mod error;
mod reports;
mod routes;
mod schemas;
mod store;

use crate::auth::{issue_token, TokenKey};
use crate::config::Config;
use crate::routes::AppState;
use crate::schemas::UserId;

#[derive(Parser)]
#[command(name = "tourledger")]
#[command(about = "Finance service for tour groups")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a signed bearer token for a user
    IssueToken {
        user_id: UserId,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

fn cors(config: &Config) -> Cors {
    config
        .cors
        .origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.level))
        .init();

    if config.auth.uses_default_secret() {
        warn!("auth.secret is the built-in default, set TOURLEDGER_AUTH__SECRET before deploying");
    }
    let token_key = TokenKey::new(&config.auth.secret);

    if let Some(Commands::IssueToken { user_id, hours }) = cli.command {
        println!("{}", issue_token(&token_key, user_id, Utc::now() + Duration::hours(hours)));
        return Ok(());
    }

    let store = match store::create_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let state = web::Data::new(AppState { store, token_key });
    let bind = (config.server.host.clone(), config.server.port);
    info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&config))
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
