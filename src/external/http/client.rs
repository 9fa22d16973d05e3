use std::vec::Vec;

use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};

use crate::man::settings::Settings;
use crate::quiz::dto::{GenerateResponse, GenerationRequest, Quiz, QuizId};
use crate::result::{Error, Result};

/// Talks to the quiz generation service. Each call is a single request: no retries,
/// no caching and no timeouts beyond what the transport does by itself.
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub(crate) fn new(settings: &Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.backend_url).map_err(|e| {
            Error::ErrorWithMessage(format!("Invalid backend url {}: {}", settings.backend_url, e))
        })?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::ErrorWithMessage(format!("Building http client failed: {}", e)))?;
        Ok(ApiClient { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::ErrorWithMessage(format!("Backend url {} can not be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // `.` and `..` would be resolved away by the url crate instead of being sent.
    fn quiz_endpoint(&self, id: &QuizId, tail: Option<&str>) -> Result<Url> {
        let segment = id.as_str();
        if segment.is_empty() || segment.chars().all(|c| c == '.') {
            return Err(Error::ErrorWithMessage(format!("Invalid quiz id `{}`", segment)));
        }
        match tail {
            Some(t) => self.endpoint(&["api", "quizzes", segment, t]),
            None => self.endpoint(&["api", "quizzes", segment]),
        }
    }

    pub(crate) async fn submit_generation(&self, req: GenerationRequest) -> Result<QuizId> {
        let url = self.endpoint(&["api", "quizzes", "generate"])?;
        log::info!(
            "Requesting {} {} question(s) of type {} from {}",
            if req.file.is_some() { "file" } else { "text" },
            req.num_questions,
            &req.quiz_type,
            url
        );
        let form = build_form(req)?;
        let res = self.client.post(url).multipart(form).send().await.map_err(|e| {
            log::error!("Submitting quiz generation failed: {}", e);
            Error::NetworkError(e)
        })?;
        let status = res.status();
        if !status.is_success() {
            return Err(failed(res, format!("API Error: {}", status_text(status))).await);
        }
        let body = res.text().await?;
        let r: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            log::warn!("Undecodable generate response: {}", e);
            Error::DecodeError(e)
        })?;
        if let Some(m) = &r.message {
            log::info!("Quiz {} generated: {}", &r.quiz_id, m);
        }
        Ok(r.quiz_id)
    }

    pub(crate) async fn fetch_quiz(&self, id: &QuizId) -> Result<Quiz> {
        let url = self.quiz_endpoint(id, None)?;
        log::info!("Fetching quiz {}", id);
        let res = self.client.get(url).send().await.map_err(|e| {
            log::error!("Fetching quiz {} failed: {}", id, e);
            Error::NetworkError(e)
        })?;
        if !res.status().is_success() {
            return Err(failed(res, String::from("Failed to fetch quiz")).await);
        }
        let body = res.text().await?;
        let quiz: Quiz = serde_json::from_str(&body).map_err(|e| {
            log::warn!("Undecodable quiz {}: {}", id, e);
            Error::DecodeError(e)
        })?;
        Ok(quiz)
    }

    pub(crate) async fn export_quiz_pdf(&self, id: &QuizId) -> Result<Vec<u8>> {
        let url = self.quiz_endpoint(id, Some("export"))?;
        log::info!("Exporting quiz {}", id);
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(failed(res, String::from("Failed to export quiz")).await);
        }
        Ok(res.bytes().await?.to_vec())
    }
}

fn build_form(req: GenerationRequest) -> Result<Form> {
    let mut form = Form::new();
    if let Some(file) = req.file.filter(|f| !f.data.is_empty()) {
        let part = Part::bytes(file.data).file_name(file.file_name);
        let part = match file.content_type {
            Some(ct) => part
                .mime_str(&ct)
                .map_err(|_| Error::ErrorWithMessage(format!("Invalid content type: {}", ct)))?,
            None => part,
        };
        form = form.part("file", part);
    }
    if let Some(text) = req.text.filter(|t| !t.is_empty()) {
        form = form.text("text", text);
    }
    Ok(form
        .text("quiz_type", req.quiz_type)
        .text("num_questions", req.num_questions.to_string()))
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown status")
}

async fn failed(res: Response, message: String) -> Error {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    log::warn!("Quiz service answered {}: {}", status, &message);
    Error::request_failed(status, message, &body)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use wiremock::matchers::{any, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::quiz::dto::UploadFile;

    fn client_for(server: &MockServer) -> ApiClient {
        let settings = Settings {
            backend_url: server.uri(),
            ..Settings::default()
        };
        ApiClient::new(&settings).unwrap()
    }

    fn one() -> NonZeroU32 {
        NonZeroU32::new(1).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_quiz_id_with_exactly_one_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quizzes/generate"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"quiz_id": "abc123", "message": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let req = GenerationRequest::from_text("What is 2+2?", "multiple_choice", one());
        let id = client.submit_generation(req).await.unwrap();
        assert_eq!(id.as_str(), "abc123");

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body).to_string();
        assert!(body.contains("name=\"text\""));
        assert!(body.contains("What is 2+2?"));
        assert!(body.contains("name=\"quiz_type\""));
        assert!(body.contains("multiple_choice"));
        assert!(body.contains("name=\"num_questions\""));
        assert!(!body.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn submit_sends_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quizzes/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"quiz_id": "f1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let req = GenerationRequest {
            file: Some(UploadFile {
                file_name: String::from("notes.txt"),
                content_type: Some(String::from("text/plain")),
                data: b"The sun is a star.".to_vec(),
            }),
            text: Some(String::new()),
            quiz_type: String::from("true_false"),
            num_questions: NonZeroU32::new(3).unwrap(),
        };
        let id = client_for(&server).submit_generation(req).await.unwrap();
        assert_eq!(id.as_str(), "f1");

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body).to_string();
        assert!(body.contains("name=\"file\"; filename=\"notes.txt\""));
        assert!(body.contains("The sun is a star."));
        assert!(!body.contains("name=\"text\""));
    }

    #[tokio::test]
    async fn submit_non_2xx_is_request_failed_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quizzes/generate"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"detail": [{"msg": "field required"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let req = GenerationRequest {
            file: None,
            text: None,
            quiz_type: String::from("mcq"),
            num_questions: one(),
        };
        let err = client_for(&server).submit_generation(req).await.unwrap_err();
        match err {
            Error::RequestFailed { status, message, .. } => {
                assert_eq!(status, 422);
                assert_eq!(message, "API Error: Unprocessable Entity");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[tokio::test]
    async fn submit_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let req = GenerationRequest::from_text("text", "mcq", one());
        let err = client_for(&server).submit_generation(req).await.unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let settings = Settings {
            backend_url: format!("http://127.0.0.1:{}", port),
            ..Settings::default()
        };
        let client = ApiClient::new(&settings).unwrap();
        let req = GenerationRequest::from_text("text", "mcq", one());
        let err = client.submit_generation(req).await.unwrap_err();
        assert!(matches!(err, Error::NetworkError(_)));
        let err = client.fetch_quiz(&QuizId::new("abc123")).await.unwrap_err();
        assert!(matches!(err, Error::NetworkError(_)));
    }

    #[tokio::test]
    async fn fetch_returns_quiz_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quizzes/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Math Quiz",
                "questions": [{"question": "What is 2+2?", "options": ["3", "4", "5"], "answer": "4"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let quiz = client_for(&server)
            .fetch_quiz(&QuizId::new("abc123"))
            .await
            .unwrap();
        assert_eq!(quiz.title, "Math Quiz");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].answer, "4");
    }

    #[tokio::test]
    async fn fetch_unknown_id_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quizzes/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Quiz not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_quiz(&QuizId::new("missing"))
            .await
            .unwrap_err();
        match err {
            Error::RequestFailed {
                status,
                message,
                detail,
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Failed to fetch quiz");
                assert_eq!(detail.as_deref(), Some("Quiz not found"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[tokio::test]
    async fn fetch_malformed_document_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quizzes/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"title\": "))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_quiz(&QuizId::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[tokio::test]
    async fn quiz_id_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quizzes/a%2Fb/export"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let pdf = client_for(&server)
            .export_quiz_pdf(&QuizId::new("a/b"))
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn dot_ids_are_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "export",
                "questions": []
            })))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for id in [".", "..", "...", ""] {
            let err = client.fetch_quiz(&QuizId::new(id)).await.unwrap_err();
            assert!(matches!(err, Error::ErrorWithMessage(_)), "fetch {:?}", id);
            let err = client.export_quiz_pdf(&QuizId::new(id)).await.unwrap_err();
            assert!(matches!(err, Error::ErrorWithMessage(_)), "export {:?}", id);
        }
    }

    #[tokio::test]
    async fn ids_containing_dots_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quizzes/v1.2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Versioned",
                "questions": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let quiz = client_for(&server)
            .fetch_quiz(&QuizId::new("v1.2"))
            .await
            .unwrap();
        assert_eq!(quiz.title, "Versioned");
    }
}
