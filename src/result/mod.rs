use serde::ser::{Serialize, SerializeStruct};
use std::convert::From;
use std::fmt;

pub(crate) type Result<D> = core::result::Result<D, Error>;

#[derive(Debug)]
pub(crate) enum Error {
    /// No response was received from the quiz backend.
    NetworkError(reqwest::Error),
    /// The backend answered with a non-2xx status.
    RequestFailed {
        status: u16,
        message: String,
        detail: Option<String>,
    },
    /// The response body was not the JSON we expected.
    DecodeError(serde_json::Error),
    TemplateError(tera::Error),
    ErrorWithMessage(String),
}

impl Error {
    pub(crate) fn request_failed(status: reqwest::StatusCode, message: String, body: &str) -> Self {
        Error::RequestFailed {
            status: status.as_u16(),
            message,
            detail: backend_detail(body),
        }
    }
}

// FastAPI reports failures as `{"detail": "..."}`; validation errors carry an array
// there which is not worth flattening for display.
fn backend_detail(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }
    let d: Detail = serde_json::from_str(body).ok()?;
    match d.detail {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(e) => write!(f, "Network error: {}", e),
            Self::RequestFailed {
                message, detail, ..
            } => match detail {
                Some(d) => write!(f, "{} ({})", message, d),
                None => f.write_str(message),
            },
            Self::DecodeError(e) => write!(f, "Invalid response from quiz service: {}", e),
            Self::TemplateError(e) => write!(f, "Rendering page failed: {:?}", e),
            Self::ErrorWithMessage(s) => f.write_str(s),
        }
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("Error", 1)?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeError(err)
    }
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        Error::TemplateError(err)
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Error::ErrorWithMessage(format!("Reading upload failed: {}", err.body_text()))
    }
}
