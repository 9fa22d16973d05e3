use std::fmt;
use std::num::NonZeroU32;
use std::vec::Vec;

use serde::{Deserialize, Serialize};

/// Question types the bundled generator understands. The backend decides what is
/// valid, this list only feeds the upload form.
pub(crate) const QUIZ_TYPES: &[(&str, &str)] = &[
    ("mcq", "Multiple choice"),
    ("true_false", "True / False"),
    ("fill_blank", "Fill in the blank"),
    ("identification", "Identification"),
];

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub(crate) struct QuizId(String);

impl QuizId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        QuizId(id.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub(crate) struct Question {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub(crate) question_type: Option<String>,
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    pub(crate) answer: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub(crate) struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
    pub(crate) title: String,
    pub(crate) questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub(crate) metadata: serde_json::Value,
}

#[derive(Deserialize)]
pub(crate) struct GenerateResponse {
    pub(crate) quiz_id: QuizId,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Clone, Debug)]
pub(crate) struct UploadFile {
    pub(crate) file_name: String,
    pub(crate) content_type: Option<String>,
    pub(crate) data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub(crate) struct GenerationRequest {
    pub(crate) file: Option<UploadFile>,
    pub(crate) text: Option<String>,
    pub(crate) quiz_type: String,
    pub(crate) num_questions: NonZeroU32,
}

#[cfg(test)]
impl GenerationRequest {
    pub(crate) fn from_text(text: &str, quiz_type: &str, num_questions: NonZeroU32) -> Self {
        GenerationRequest {
            file: None,
            text: Some(String::from(text)),
            quiz_type: String::from(quiz_type),
            num_questions,
        }
    }
}
