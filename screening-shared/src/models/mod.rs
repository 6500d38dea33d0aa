pub mod age;
pub mod assessment;
pub mod auth;
pub mod errors;
pub mod provider;
pub mod question;

pub use age::{Age, InvalidAge, is_valid_age};
pub use assessment::{AssessmentRecord, Outcome, PredictRequest, PredictResponse, Prediction};
pub use auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
pub use errors::ErrorResponse;
pub use provider::{Coordinates, Geometry, HospitalsResponse, LatLng, Place, ProviderListing};
pub use question::{Question, QuestionFormatError, QuestionSet, QuestionsPayload};
