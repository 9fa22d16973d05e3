use std::num::NonZeroU32;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;
use tera::{Context, Tera};

use super::dto::{GenerationRequest, QuizId, UploadFile, QUIZ_TYPES};
use super::render::{render, QuizView};
use crate::result::{Error, Result};
use crate::web::router::{quiz_link, AppState, Page, QuizQuery, QUIZ_EXPORT_PATH};

/// What a page shows. A request is awaited inside the handler, so a page is never
/// sent to the browser half way through loading.
pub(crate) enum PageState<T> {
    Idle,
    Error(Error),
    Success(T),
}

#[derive(Clone, Serialize)]
pub(crate) struct UploadForm {
    pub(crate) text: String,
    pub(crate) quiz_type: String,
    pub(crate) num_questions: String,
}

impl Default for UploadForm {
    fn default() -> Self {
        UploadForm {
            text: String::new(),
            quiz_type: String::from(QUIZ_TYPES[0].0),
            num_questions: String::from("5"),
        }
    }
}

#[derive(Serialize)]
struct QuizTypeOption {
    value: &'static str,
    label: &'static str,
}

pub(crate) fn render_page(tera: &Tera, name: &str, ctx: &Context, status: StatusCode) -> Response {
    match tera.render(name, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            let e = Error::from(e);
            log::error!("{}: {}", name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(e.to_string())).into_response()
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::RequestFailed { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(|s| s.is_client_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        Error::NetworkError(_) | Error::DecodeError(_) => StatusCode::BAD_GATEWAY,
        Error::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::ErrorWithMessage(_) => StatusCode::BAD_REQUEST,
    }
}

pub(crate) async fn home(State(state): State<AppState>) -> Response {
    render_page(&state.tera, "home.html", &Context::new(), StatusCode::OK)
}

fn upload_page(state: &AppState, form: &UploadForm, page: PageState<()>) -> Response {
    let mut ctx = Context::new();
    let quiz_types: Vec<QuizTypeOption> = QUIZ_TYPES
        .iter()
        .map(|&(value, label)| QuizTypeOption { value, label })
        .collect();
    ctx.insert("quiz_types", &quiz_types);
    ctx.insert("text", &form.text);
    ctx.insert("quiz_type", &form.quiz_type);
    ctx.insert("num_questions", &form.num_questions);
    let status = match &page {
        PageState::Error(e) => {
            ctx.insert("error", &e.to_string());
            status_for(e)
        }
        PageState::Idle | PageState::Success(_) => StatusCode::OK,
    };
    render_page(&state.tera, "upload.html", &ctx, status)
}

pub(crate) async fn upload_form(State(state): State<AppState>) -> Response {
    upload_page(&state, &UploadForm::default(), PageState::Idle)
}

pub(crate) async fn upload_submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let mut form = UploadForm {
        text: String::new(),
        quiz_type: String::new(),
        num_questions: String::new(),
    };
    let file = match read_upload(multipart, &mut form).await {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Rejected upload: {}", e);
            return upload_page(&state, &form, PageState::Error(e));
        }
    };
    let req = match to_request(&form, file) {
        Ok(r) => r,
        Err(e) => return upload_page(&state, &form, PageState::Error(e)),
    };
    let r = state.client.submit_generation(req).await;
    match r.and_then(|id| quiz_link(Page::Quiz.path(), &id)) {
        Ok(location) => {
            log::info!("Quiz generated, redirecting to {}", &location);
            Redirect::to(&location).into_response()
        }
        Err(e) => {
            log::warn!("Quiz generation failed: {}", e);
            upload_page(&state, &form, PageState::Error(e))
        }
    }
}

// Fields are written into `form` as they arrive so a broken body still leaves the
// user's earlier input in place.
async fn read_upload(mut multipart: Multipart, form: &mut UploadForm) -> Result<Option<UploadFile>> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name() else {
            continue;
        };
        let name = name.to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(String::from).unwrap_or_default();
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                log::info!("Received `{}` ({} bytes)", &file_name, data.len());
                file = Some(UploadFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "text" => form.text = field.text().await?,
            "quiz_type" => form.quiz_type = field.text().await?,
            "num_questions" => form.num_questions = field.text().await?,
            _ => log::info!("Ignoring unknown upload field `{}`", name),
        }
    }
    Ok(file)
}

fn to_request(form: &UploadForm, file: Option<UploadFile>) -> Result<GenerationRequest> {
    let num_questions: NonZeroU32 = form.num_questions.trim().parse().map_err(|_| {
        Error::ErrorWithMessage(format!(
            "Number of questions must be a positive integer, got `{}`",
            form.num_questions
        ))
    })?;
    let text = Some(form.text.clone()).filter(|t| !t.is_empty());
    Ok(GenerationRequest {
        file,
        text,
        quiz_type: form.quiz_type.clone(),
        num_questions,
    })
}

fn quiz_page(state: &AppState, id: Option<&QuizId>, page: PageState<QuizView>) -> Response {
    let mut ctx = Context::new();
    let status = match page {
        PageState::Idle => StatusCode::OK,
        PageState::Error(e) => {
            ctx.insert("error", &e.to_string());
            status_for(&e)
        }
        PageState::Success(view) => {
            ctx.insert("quiz", &view);
            if let Some(id) = id {
                match quiz_link(QUIZ_EXPORT_PATH, id) {
                    Ok(url) => ctx.insert("export_url", &url),
                    Err(e) => log::warn!("{}", e),
                }
            }
            StatusCode::OK
        }
    };
    render_page(&state.tera, "quiz.html", &ctx, status)
}

pub(crate) async fn quiz(State(state): State<AppState>, Query(q): Query<QuizQuery>) -> Response {
    let Some(id) = q.quiz_id() else {
        return quiz_page(&state, None, PageState::Idle);
    };
    let page = match state.client.fetch_quiz(&id).await {
        Ok(quiz) => PageState::Success(render(&quiz)),
        Err(e) => {
            log::warn!("Showing quiz {} failed: {}", &id, e);
            PageState::Error(e)
        }
    };
    quiz_page(&state, Some(&id), page)
}

pub(crate) async fn export(State(state): State<AppState>, Query(q): Query<QuizQuery>) -> Response {
    let Some(id) = q.quiz_id() else {
        let e = Error::ErrorWithMessage(String::from("No quiz id given for export"));
        return quiz_page(&state, None, PageState::Error(e));
    };
    match state.client.export_quiz_pdf(&id).await {
        Ok(pdf) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
            let disposition = format!("attachment; filename=\"quiz_{}.pdf\"", file_stem(&id));
            if let Ok(v) = disposition.parse() {
                headers.insert(header::CONTENT_DISPOSITION, v);
            }
            (StatusCode::OK, headers, pdf).into_response()
        }
        Err(e) => {
            log::warn!("Exporting quiz {} failed: {}", &id, e);
            quiz_page(&state, Some(&id), PageState::Error(e))
        }
    }
}

fn file_stem(id: &QuizId) -> String {
    id.as_str()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
