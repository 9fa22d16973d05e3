use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use colored::Colorize;
use tera::Context;

use super::asset;
use super::router::{gen_router, AppState};
use super::template;
use crate::external::http::client::ApiClient;
use crate::man::settings::Settings;
use crate::quiz::page::render_page;
use crate::result::Result;

//https://stackoverflow.com/questions/27840394/how-can-a-rust-program-access-metadata-from-its-cargo-package
pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn start_app() {
    let settings = match crate::man::settings::from_args(std::env::args()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Invalid startup parameters: {}", e);
            return;
        }
    };
    if let Err(e) = serve(settings).await {
        log::error!("{}", e);
    }
}

async fn serve(settings: Settings) -> Result<()> {
    #[cfg(target_os = "windows")]
    let _ = colored::control::set_virtual_terminal(true);

    let state = AppState {
        client: ApiClient::new(&settings)?,
        tera: Arc::new(template::init()?),
    };
    let app = gen_router(state, settings.max_upload_bytes());

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        crate::result::Error::ErrorWithMessage(format!("Binding {} failed: {}", addr, e))
    })?;

    log::info!(
        "  -->  Please open a browser and visit {}{}:{}",
        "http://".bright_green(),
        settings.ip.bright_green(),
        settings.port.to_string().blue()
    );
    log::info!("Quiz service: {}", settings.backend_url.bright_yellow());
    log::info!("Current version: {}", VERSION);
    log::info!(
        "  -->  Press {} to terminate this application",
        "Ctrl+C".bright_red()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::result::Error::ErrorWithMessage(format!("Server stopped: {}", e)))
}

pub(crate) async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    if let Some((body, content_type)) = asset::get(uri.path()) {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        return (StatusCode::OK, headers, body).into_response();
    }
    let mut ctx = Context::new();
    ctx.insert("path", uri.path());
    render_page(&state.tera, "404.html", &ctx, StatusCode::NOT_FOUND)
}

pub(crate) async fn version() -> impl IntoResponse {
    let mut v = String::with_capacity(15);
    v.push('"');
    v.push_str(VERSION);
    v.push('"');
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (headers, v)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("This program has been terminated");
}
