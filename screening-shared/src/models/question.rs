use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while reading a question payload.
#[derive(Debug, Error)]
pub enum QuestionFormatError {
    #[error("question payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question payload object has no `questions` array")]
    MissingQuestions,
    #[error("question {index} is not a string")]
    NonTextQuestion { index: usize },
    #[error("unrecognized question payload: expected an array or an object, got {kind}")]
    UnrecognizedShape { kind: &'static str },
}

/// The two payload shapes the question endpoint is known to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionsPayload {
    /// `["q1", "q2", ...]`
    Sequence(Vec<String>),
    /// `{ "questions": ["q1", ...], "age_group": "children" }`
    Wrapped {
        questions: Vec<String>,
        age_group: Option<String>,
    },
}

impl QuestionsPayload {
    /// Recognize one of the two supported shapes.
    ///
    /// # Errors
    /// Fails for any other JSON shape, for an object without a `questions`
    /// array, and for non-string entries.
    pub fn parse(value: &Value) -> Result<Self, QuestionFormatError> {
        match value {
            Value::Array(items) => Ok(Self::Sequence(texts(items)?)),
            Value::Object(map) => {
                let Some(Value::Array(items)) = map.get("questions") else {
                    return Err(QuestionFormatError::MissingQuestions);
                };
                let age_group = map
                    .get("age_group")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(Self::Wrapped {
                    questions: texts(items)?,
                    age_group,
                })
            }
            other => Err(QuestionFormatError::UnrecognizedShape {
                kind: json_kind(other),
            }),
        }
    }

    /// Parse from raw JSON text (as staged on disk).
    ///
    /// # Errors
    /// See [`QuestionsPayload::parse`].
    pub fn from_json_str(raw: &str) -> Result<Self, QuestionFormatError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::parse(&value)
    }

    #[must_use]
    pub fn into_texts(self) -> Vec<String> {
        match self {
            Self::Sequence(questions) | Self::Wrapped { questions, .. } => questions,
        }
    }
}

fn texts(items: &[Value]) -> Result<Vec<String>, QuestionFormatError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or(QuestionFormatError::NonTextQuestion { index })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A single yes/no question with the user's current answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Position in fetch order.
    pub id: usize,
    pub text: String,
    pub answer: bool,
}

/// An ordered questionnaire, hydrated with unanswered questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a question set from texts in fetch order; every answer starts `false`.
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions = texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Question {
                id,
                text: text.into(),
                answer: false,
            })
            .collect();
        Self { questions }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Flip the answer of question `id`. Returns the new answer, or `None`
    /// when no question has that id.
    pub fn toggle(&mut self, id: usize) -> Option<bool> {
        let question = self.questions.iter_mut().find(|q| q.id == id)?;
        question.answer = !question.answer;
        Some(question.answer)
    }

    /// Set the answer of question `id`. Returns `false` when no question has that id.
    pub fn set_answer(&mut self, id: usize, answer: bool) -> bool {
        match self.questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.answer = answer;
                true
            }
            None => false,
        }
    }

    /// The submission form of the answers: `"1"` for yes, `"0"` for no, in fetch order.
    #[must_use]
    pub fn responses(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| (if q.answer { "1" } else { "0" }).to_string())
            .collect()
    }

    /// The question texts, in fetch order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.text.clone()).collect()
    }
}

impl From<QuestionsPayload> for QuestionSet {
    fn from(payload: QuestionsPayload) -> Self {
        Self::from_texts(payload.into_texts())
    }
}
