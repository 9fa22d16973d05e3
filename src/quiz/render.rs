use std::vec::Vec;

use serde::Serialize;

use super::dto::Quiz;

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct QuestionBlock {
    pub(crate) label: String,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    pub(crate) answer: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct QuizView {
    pub(crate) title: String,
    pub(crate) blocks: Vec<QuestionBlock>,
}

/// One block per question, numbered from 1 in the order the backend sent them.
/// Questions have no identity of their own, so the position is the key.
pub(crate) fn render(quiz: &Quiz) -> QuizView {
    let blocks = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| QuestionBlock {
            label: format!("{}.", idx + 1),
            question: q.question.clone(),
            options: q.options.clone().unwrap_or_default(),
            answer: q.answer.clone(),
        })
        .collect();
    QuizView {
        title: quiz.title.clone(),
        blocks,
    }
}
