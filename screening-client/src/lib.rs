#![cfg_attr(not(test), forbid(unsafe_code))]

//! Assessment session lifecycle for the screening client.

pub mod api;
pub mod error;
pub mod flow;
pub mod geo;
pub mod location;
pub mod staging;
pub mod storage;
pub mod token;

pub use api::{ApiClient, RequestOptions};
pub use error::{ClientError, ClientResult, ValidationError};
pub use flow::{AssessmentSession, FlowState, ProvidersSection, ResultView, SessionFlow};
pub use location::{FixedLocation, LocationError, LocationProvider};
pub use staging::{Staged, StagedPrediction, StagedQuestions, StagingStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use token::TokenStore;
