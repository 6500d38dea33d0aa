//! The assessment lifecycle: age entry, questionnaire, submission and result.
//!
//! Every network step takes a [`CancellationToken`] standing for the lifetime
//! of the screen that started it. A cancelled step returns
//! [`ClientError::Cancelled`] and leaves the staging slots untouched.

use shared::{
    config::client::DEFAULT_PROVIDER_RADIUS_M,
    models::{Age, Outcome, Prediction, PredictRequest, ProviderListing, QuestionSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult, ValidationError},
    geo::listings_from_places,
    location::LocationProvider,
    staging::{Staged, StagedPrediction, StagingStore},
};

/// Staged age plus the hydrated questionnaire, handed from the questionnaire
/// step to submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentSession {
    age: String,
    questions: QuestionSet,
}

impl AssessmentSession {
    pub fn new(age: impl Into<String>, questions: QuestionSet) -> Self {
        Self {
            age: age.into(),
            questions,
        }
    }

    #[must_use]
    pub fn age(&self) -> &str {
        &self.age
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    AwaitingAge,
    QuestionsFetched {
        age: String,
        count: usize,
    },
    Answering(AssessmentSession),
    Submitting,
    ResultReady(StagedPrediction),
}

impl FlowState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingAge => "awaiting age",
            Self::QuestionsFetched { .. } => "questions fetched",
            Self::Answering(_) => "answering",
            Self::Submitting => "submitting",
            Self::ResultReady(_) => "showing a result",
        }
    }
}

/// The providers part of the result screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvidersSection {
    Listed(Vec<ProviderListing>),
    /// Shown inline in place of the list; the rest of the result still renders.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub prediction: Prediction,
    pub age_group: Option<String>,
    pub outcome: Outcome,
    /// `None` when the outcome does not call for providers.
    pub providers: Option<ProvidersSection>,
}

impl ResultView {
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }
}

/// Drives one user through an assessment.
#[derive(Debug)]
pub struct SessionFlow {
    api: ApiClient,
    staging: StagingStore,
    state: FlowState,
    provider_radius_m: u32,
}

impl SessionFlow {
    pub fn new(api: ApiClient, staging: StagingStore) -> Self {
        Self {
            api,
            staging,
            state: FlowState::AwaitingAge,
            provider_radius_m: DEFAULT_PROVIDER_RADIUS_M,
        }
    }

    #[must_use]
    pub fn with_provider_radius(mut self, radius_m: u32) -> Self {
        self.provider_radius_m = radius_m;
        self
    }

    #[must_use]
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The questionnaire being answered, if any.
    #[must_use]
    pub fn session(&self) -> Option<&AssessmentSession> {
        match &self.state {
            FlowState::Answering(session) => Some(session),
            _ => None,
        }
    }

    /// Validate `input`, fetch the questions for that age and stage both.
    ///
    /// Returns the number of questions staged. An invalid age fails before any
    /// network call and leaves the state unchanged.
    ///
    /// # Errors
    /// Validation, transport, server, question format and storage failures,
    /// and [`ClientError::Cancelled`].
    pub async fn submit_age(&mut self, input: &str, cancel: &CancellationToken) -> ClientResult<usize> {
        let age = Age::parse(input).inspect_err(|err| debug!(error = %err, "age rejected"))?;

        let payload = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            payload = self.api.fetch_questions(&age) => payload?,
        };
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let questions = payload.into_texts();
        self.staging.save_questions(&age, &questions).await?;

        info!(age = %age, count = questions.len(), "questions fetched");
        self.state = FlowState::QuestionsFetched {
            age: age.as_str().to_string(),
            count: questions.len(),
        };
        Ok(questions.len())
    }

    /// Hydrate the questionnaire from staging with every answer `false`.
    ///
    /// # Errors
    /// Missing or malformed staging moves the flow back to age entry; see
    /// [`ClientError::requires_age_entry`].
    pub async fn load_questionnaire(&mut self) -> ClientResult<&AssessmentSession> {
        let staged = match self.staging.load_questions().await {
            Ok(Staged::Complete(staged)) => staged,
            Ok(Staged::Incomplete { missing }) => {
                self.state = FlowState::AwaitingAge;
                return Err(ClientError::IncompleteSession { missing });
            }
            Err(err) => {
                if err.requires_age_entry() {
                    self.state = FlowState::AwaitingAge;
                }
                return Err(err);
            }
        };

        let session = AssessmentSession::new(staged.age, QuestionSet::from_texts(staged.questions));
        debug!(count = session.questions.len(), "questionnaire hydrated");
        self.state = FlowState::Answering(session);
        self.answering("load the questionnaire").map(|session| &*session)
    }

    /// Flip one answer. Unknown ids are ignored and yield `Ok(None)`.
    ///
    /// # Errors
    /// [`ClientError::InvalidTransition`] outside the questionnaire.
    pub fn toggle_answer(&mut self, id: usize) -> ClientResult<Option<bool>> {
        Ok(self.answering("toggle an answer")?.questions.toggle(id))
    }

    /// Set one answer explicitly. Returns `false` for an unknown id.
    ///
    /// # Errors
    /// [`ClientError::InvalidTransition`] outside the questionnaire.
    pub fn set_answer(&mut self, id: usize, answer: bool) -> ClientResult<bool> {
        Ok(self.answering("set an answer")?.questions.set_answer(id, answer))
    }

    /// Submit the answers for a prediction and stage it.
    ///
    /// On any failure the flow returns to the questionnaire with the answers
    /// intact so the user can resubmit.
    ///
    /// # Errors
    /// Validation, transport, server, decode and storage failures, and
    /// [`ClientError::Cancelled`].
    pub async fn submit(&mut self, cancel: &CancellationToken) -> ClientResult<StagedPrediction> {
        let session = match std::mem::replace(&mut self.state, FlowState::Submitting) {
            FlowState::Answering(session) => session,
            other => {
                let state = other.name();
                self.state = other;
                return Err(ClientError::InvalidTransition {
                    action: "submit answers",
                    state,
                });
            }
        };

        match self.submit_session(&session, cancel).await {
            Ok(staged) => {
                info!(prediction = %staged.prediction, "assessment submitted");
                self.state = FlowState::ResultReady(staged.clone());
                Ok(staged)
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.state = FlowState::Answering(session);
                Err(err)
            }
        }
    }

    async fn submit_session(
        &self,
        session: &AssessmentSession,
        cancel: &CancellationToken,
    ) -> ClientResult<StagedPrediction> {
        let age = Age::parse(&session.age)?;
        let responses = session.questions.responses();
        if responses.is_empty() {
            return Err(ValidationError::EmptyResponses.into());
        }

        let request = PredictRequest {
            age: age.as_str().to_string(),
            responses,
        };
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = self.api.predict(&request) => response?,
        };
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        self.staging
            .save_prediction(&response.prediction, &response.age_group)
            .await?;
        Ok(StagedPrediction {
            prediction: response.prediction,
            age_group: Some(response.age_group),
        })
    }

    /// Build the result screen from the staged prediction.
    ///
    /// The device position is resolved alongside the staging read; providers
    /// are only looked up for a nonzero prediction. Location and provider
    /// failures only replace the providers list with an inline message.
    ///
    /// # Errors
    /// [`ClientError::NoResult`] when nothing is staged, storage failures, and
    /// [`ClientError::Cancelled`].
    pub async fn load_result(
        &mut self,
        location: &dyn LocationProvider,
        cancel: &CancellationToken,
    ) -> ClientResult<ResultView> {
        let (staged, position) =
            tokio::join!(self.staging.load_prediction(), location.current_position());

        let Some(staged) = staged?.complete() else {
            warn!("no staged prediction to show");
            return Err(ClientError::NoResult);
        };

        let outcome = staged.prediction.outcome();
        let providers = if outcome.suggests_providers() {
            let section = match position {
                Ok(origin) => {
                    let places = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(ClientError::Cancelled),
                        places = self.api.nearby_places(origin, self.provider_radius_m) => places,
                    };
                    match places {
                        Ok(places) => ProvidersSection::Listed(listings_from_places(origin, places)),
                        Err(err) => {
                            warn!(error = %err, "provider lookup failed");
                            ProvidersSection::Unavailable(format!(
                                "Unable to load nearby providers: {err}"
                            ))
                        }
                    }
                }
                Err(err) => {
                    warn!(error = ?err, "location unavailable");
                    ProvidersSection::Unavailable(err.to_string())
                }
            };
            Some(section)
        } else {
            None
        };

        self.state = FlowState::ResultReady(staged.clone());
        Ok(ResultView {
            prediction: staged.prediction,
            age_group: staged.age_group,
            outcome,
            providers,
        })
    }

    fn answering(&mut self, action: &'static str) -> ClientResult<&mut AssessmentSession> {
        match &mut self.state {
            FlowState::Answering(session) => Ok(session),
            other => Err(ClientError::InvalidTransition {
                action,
                state: other.name(),
            }),
        }
    }
}
