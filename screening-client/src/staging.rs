//! Persisted hand-off slots between assessment steps.
//!
//! Questions+age and prediction+age group are two independent lifecycles. Each
//! slot is written separately, so a reader can see a partial session; loads
//! say so explicitly with [`Staged::Incomplete`].

use std::sync::Arc;

use shared::models::{Age, Prediction, QuestionsPayload};
use tracing::{debug, warn};

use crate::{
    error::ClientResult,
    storage::{KeyValueStore, StorageError},
};

pub const QUESTIONS_KEY: &str = "assessment_questions";
pub const AGE_KEY: &str = "user_age";
pub const PREDICTION_KEY: &str = "autism_prediction";
pub const AGE_GROUP_KEY: &str = "age_group";

/// Result of reading a group of staging slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staged<T> {
    Complete(T),
    Incomplete { missing: Vec<&'static str> },
}

impl<T> Staged<T> {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn complete(self) -> Option<T> {
        match self {
            Self::Complete(value) => Some(value),
            Self::Incomplete { .. } => None,
        }
    }
}

/// Staged age and question texts, as written at age entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedQuestions {
    /// Age as entered; re-validated at submission.
    pub age: String,
    pub questions: Vec<String>,
}

/// Staged outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPrediction {
    pub prediction: Prediction,
    pub age_group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StagingStore {
    store: Arc<dyn KeyValueStore>,
}

impl StagingStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stage the question texts, then the age.
    ///
    /// # Errors
    /// Returns the first failing write. The questions may already be staged
    /// when the age write fails; [`StagingStore::load_questions`] reports that
    /// as incomplete.
    pub async fn save_questions(&self, age: &Age, questions: &[String]) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(questions).map_err(|err| {
            StorageError::Unavailable(format!("cannot encode questions: {err}"))
        })?;
        self.store.set_item(QUESTIONS_KEY, &encoded).await?;
        self.store.set_item(AGE_KEY, age.as_str()).await?;
        debug!(age = %age, count = questions.len(), "questions staged");
        Ok(())
    }

    /// Read the staged questions and age.
    ///
    /// # Errors
    /// Storage failures, and a staged question value in neither accepted shape.
    pub async fn load_questions(&self) -> ClientResult<Staged<StagedQuestions>> {
        let (questions, age) = tokio::join!(
            self.store.get_item(QUESTIONS_KEY),
            self.store.get_item(AGE_KEY)
        );
        let questions = questions?.filter(|value| !value.is_empty());
        let age = age?.filter(|value| !value.is_empty());

        match (questions, age) {
            (Some(raw), Some(age)) => {
                let questions = QuestionsPayload::from_json_str(&raw)
                    .inspect_err(|err| warn!(error = %err, "staged questions are malformed"))?
                    .into_texts();
                Ok(Staged::Complete(StagedQuestions { age, questions }))
            }
            (questions, age) => {
                let mut missing = Vec::new();
                if questions.is_none() {
                    missing.push(QUESTIONS_KEY);
                }
                if age.is_none() {
                    missing.push(AGE_KEY);
                }
                warn!(?missing, "staged assessment is incomplete");
                Ok(Staged::Incomplete { missing })
            }
        }
    }

    /// Stage the prediction, then its age group.
    ///
    /// # Errors
    /// Returns the first failing write.
    pub async fn save_prediction(
        &self,
        prediction: &Prediction,
        age_group: &str,
    ) -> Result<(), StorageError> {
        self.store
            .set_item(PREDICTION_KEY, prediction.as_str())
            .await?;
        self.store.set_item(AGE_GROUP_KEY, age_group).await?;
        debug!(prediction = %prediction, age_group, "prediction staged");
        Ok(())
    }

    /// Read the staged prediction. Only the prediction is required; the age
    /// group is informational.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn load_prediction(&self) -> Result<Staged<StagedPrediction>, StorageError> {
        let (prediction, age_group) = tokio::join!(
            self.store.get_item(PREDICTION_KEY),
            self.store.get_item(AGE_GROUP_KEY)
        );

        match prediction? {
            Some(value) => Ok(Staged::Complete(StagedPrediction {
                prediction: Prediction::new(value),
                age_group: age_group?.filter(|group| !group.is_empty()),
            })),
            None => Ok(Staged::Incomplete {
                missing: vec![PREDICTION_KEY],
            }),
        }
    }
}
