use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tera::Tera;
use tower_http::limit::RequestBodyLimitLayer;

use super::server;
use crate::external::http::client::ApiClient;
use crate::quiz::dto::QuizId;
use crate::quiz::page;
use crate::result::{Error, Result};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: ApiClient,
    pub(crate) tera: Arc<Tera>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Page {
    Home,
    Upload,
    Quiz,
}

impl Page {
    pub(crate) fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Upload => "/upload",
            Page::Quiz => "/quiz",
        }
    }
}

pub(crate) const QUIZ_EXPORT_PATH: &str = "/quiz/export";

#[derive(Default, Deserialize, Serialize)]
pub(crate) struct QuizQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
}

impl QuizQuery {
    pub(crate) fn quiz_id(&self) -> Option<QuizId> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(QuizId::new)
    }
}

/// `path?id=<id>` with the id query-encoded.
pub(crate) fn quiz_link(path: &str, id: &QuizId) -> Result<String> {
    let q = QuizQuery {
        id: Some(String::from(id.as_str())),
    };
    let query = serde_urlencoded::to_string(&q)
        .map_err(|e| Error::ErrorWithMessage(format!("Encoding quiz link failed: {}", e)))?;
    Ok(format!("{}?{}", path, query))
}

pub(crate) fn gen_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(Page::Home.path(), get(page::home))
        .route(
            Page::Upload.path(),
            get(page::upload_form).post(page::upload_submit),
        )
        .route(Page::Quiz.path(), get(page::quiz))
        .route(QUIZ_EXPORT_PATH, get(page::export))
        .route("/version.json", get(server::version))
        .fallback(server::fallback)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}
