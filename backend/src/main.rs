mod clients;
mod config;
mod db;
mod error;
mod export;
mod extract;
mod job_controller;
mod services;
mod session;
mod state;

use crate::clients::auth::{AuthProvider, HttpAuthProvider, StaticAuthProvider};
use crate::clients::storage::{ensure_bucket, HttpObjectStore, LocalObjectStore, ObjectStore};
use crate::config::{AppConfig, DevAccount};
use crate::db::Database;
use crate::job_controller::state::{start_job_updater, JobsState};
use crate::state::{AppState, REALTIME_BUFFER};
use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{error, info, warn};
use mime_guess::from_path;
use rusqlite::params;
use std::io;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static/dist");

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match STATIC_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::other(format!("{}: {}", context, err))
}

/// Makes sure every configured account has a `users` row and registers it.
fn static_auth(db: &Database, accounts: &[DevAccount]) -> Result<StaticAuthProvider, rusqlite::Error> {
    let conn = db.connect()?;
    let mut auth = StaticAuthProvider::new();
    for account in accounts {
        let email = account.email.to_lowercase();
        conn.execute(
            "INSERT INTO users (id, email, full_name) VALUES (?1, ?2, ?3) ON CONFLICT(email) DO NOTHING",
            params![Uuid::new_v4().to_string(), email, account.full_name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| db::uuid_at(row, 0),
        )?;
        auth = auth.with_account(id, &email, &account.password);
    }
    Ok(auth)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;
    let db = Database::open(&config.database.path)
        .map_err(|e| startup_error("Could not open the database", e))?;

    let (store, auth): (Arc<dyn ObjectStore>, Arc<dyn AuthProvider>) = if config.backend.is_configured() {
        info!("Using managed backend at {}", config.backend.url);
        (
            Arc::new(HttpObjectStore::new(&config.backend.url, &config.backend.service_key)),
            Arc::new(HttpAuthProvider::new(&config.backend.url, &config.backend.anon_key)),
        )
    } else {
        warn!(
            "No managed backend configured: local storage under {} and {} built-in account(s)",
            config.storage.local_root,
            config.auth.dev_accounts.len()
        );
        let auth = static_auth(&db, &config.auth.dev_accounts)
            .map_err(|e| startup_error("Could not register the built-in accounts", e))?;
        (
            Arc::new(LocalObjectStore::new(&config.storage.local_root)),
            Arc::new(auth),
        )
    };

    // the import bucket must exist before the first upload
    ensure_bucket(store.as_ref(), &config.storage.import_bucket)
        .await
        .map_err(|e| startup_error("Could not provision the import bucket", e))?;

    let (jobs, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    let (realtime, _) = broadcast::channel(REALTIME_BUFFER);

    let state = AppState {
        db,
        store,
        auth,
        jobs,
        realtime,
        import_bucket: config.storage.import_bucket.clone(),
    };

    let host = config.server.host.clone();
    let port = config.server.port;
    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(state.clone()))
            .wrap(from_fn(session::require_session))
            .wrap(Logger::default())
            .service(services::auth::configure_routes())
            .service(services::custom_fields::configure_routes())
            .service(services::time_entries::configure_routes())
            .service(services::timesheets::configure_routes())
            .service(services::accounting::configure_routes())
            .service(services::dashboard::configure_routes())
            .service(services::imports::configure_routes())
            .service(services::messages::configure_routes())
            .service(services::realtime::configure_routes())
            .service(services::portal::configure_routes())
            .default_service(web::route().to(serve_embedded))
    })
    .bind((host, port))?
    .run()
    .await
}
