//! End-to-end tests of the assessment lifecycle against an in-process mock API.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
};
use client::{
    ApiClient, ClientError, FileStore, FixedLocation, FlowState, KeyValueStore, MemoryStore,
    ProvidersSection, SessionFlow, StagingStore, TokenStore,
    staging::{AGE_KEY, PREDICTION_KEY, QUESTIONS_KEY},
    token::ACCESS_TOKEN_KEY,
};
use serde_json::{Value, json};
use shared::models::{LoginRequest, Outcome, PredictRequest, SignupRequest};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    body: Option<Value>,
}

/// Canned responses per route, plus a log of everything received.
#[derive(Debug)]
struct MockApi {
    questions: (StatusCode, Value),
    login: (StatusCode, Value),
    signup: (StatusCode, Value),
    predict: (StatusCode, Value),
    assessments: (StatusCode, Value),
    hospitals: (StatusCode, Value),
    seen: Mutex<Vec<Seen>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            questions: (
                StatusCode::OK,
                json!({ "age_group": "children", "questions": ["q1", "q2", "q3"] }),
            ),
            login: (
                StatusCode::OK,
                json!({ "access_token": "tok-1", "message": "Login successful" }),
            ),
            signup: (
                StatusCode::CREATED,
                json!({ "message": "User created successfully" }),
            ),
            predict: (
                StatusCode::OK,
                json!({ "prediction": 1, "age_group": "children" }),
            ),
            assessments: (StatusCode::OK, json!([])),
            hospitals: (
                StatusCode::OK,
                json!({ "results": [
                    {
                        "name": "Far Clinic",
                        "vicinity": "1 North Road",
                        "geometry": { "location": { "lat": 1.0, "lng": 0.0 } },
                        "place_id": "far"
                    },
                    { "name": "Mystery Clinic", "vicinity": "Somewhere" },
                    {
                        "name": "Near Clinic",
                        "vicinity": "2 Centre Street",
                        "geometry": { "location": { "lat": 0.0, "lng": 0.0 } },
                        "place_id": "near"
                    }
                ]}),
            ),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn seen_path(&self, path: &str) -> Vec<Seen> {
        self.seen().into_iter().filter(|s| s.path == path).collect()
    }
}

async fn handle(
    State(api): State<Arc<MockApi>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().trim_start_matches('/').to_string();
    api.seen.lock().unwrap().push(Seen {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let (status, body) = match path.as_str() {
        "get_questions" => api.questions.clone(),
        "login" => api.login.clone(),
        "signup" => api.signup.clone(),
        "predict" => api.predict.clone(),
        "user/assessments" => api.assessments.clone(),
        "proxy/hospitals" => api.hospitals.clone(),
        _ => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
    };
    (status, Json(body))
}

async fn spawn(api: Arc<MockApi>) -> String {
    let router = Router::new().fallback(handle).with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    api: Arc<MockApi>,
    store: Arc<MemoryStore>,
    flow: SessionFlow,
}

async fn harness(api: MockApi) -> Harness {
    let api = Arc::new(api);
    let base_url = spawn(api.clone()).await;
    let store = Arc::new(MemoryStore::new());
    let client = ApiClient::new(&base_url, TokenStore::new(store.clone())).unwrap();
    let flow = SessionFlow::new(client, StagingStore::new(store.clone()));
    Harness { api, store, flow }
}

fn credentials() -> LoginRequest {
    LoginRequest {
        email: "parent@example.com".into(),
        password: "hunter22".into(),
    }
}

#[tokio::test]
async fn full_assessment_from_age_to_providers() {
    let mut h = harness(MockApi::default()).await;
    let cancel = CancellationToken::new();

    h.flow.api().login(&credentials()).await.unwrap();
    assert_eq!(h.flow.submit_age("7", &cancel).await.unwrap(), 3);
    assert_eq!(
        h.flow.state(),
        &FlowState::QuestionsFetched {
            age: "7".into(),
            count: 3
        }
    );
    assert_eq!(
        h.store.get_item(QUESTIONS_KEY).await.unwrap().as_deref(),
        Some(r#"["q1","q2","q3"]"#)
    );
    assert_eq!(h.store.get_item(AGE_KEY).await.unwrap().as_deref(), Some("7"));

    h.flow.load_questionnaire().await.unwrap();
    h.flow.toggle_answer(0).unwrap();
    h.flow.toggle_answer(2).unwrap();
    let staged = h.flow.submit(&cancel).await.unwrap();
    assert_eq!(staged.prediction.as_str(), "1");
    assert_eq!(staged.age_group.as_deref(), Some("children"));

    let predict = h.api.seen_path("predict");
    assert_eq!(predict.len(), 1);
    assert_eq!(predict[0].method, Method::POST);
    assert_eq!(predict[0].authorization.as_deref(), Some("Bearer tok-1"));
    assert_eq!(
        predict[0].body,
        Some(json!({ "age": "7", "responses": ["1", "0", "1"] }))
    );

    let view = h
        .flow
        .load_result(&FixedLocation::at(0.0, 0.0), &cancel)
        .await
        .unwrap();
    assert_eq!(view.outcome, Outcome::IndicatorsPresent);
    assert_eq!(view.age_group.as_deref(), Some("children"));

    let Some(ProvidersSection::Listed(listings)) = view.providers else {
        panic!("expected a provider list, got {:?}", view.providers);
    };
    let names: Vec<_> = listings.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Far Clinic", "Mystery Clinic", "Near Clinic"]);
    let distances: Vec<_> = listings.iter().map(|l| l.distance.as_str()).collect();
    assert_eq!(distances, vec!["111.2 km", "Distance unavailable", "0.0 km"]);

    let hospitals = h.api.seen_path("proxy/hospitals");
    assert_eq!(hospitals.len(), 1);
    assert_eq!(
        hospitals[0].query.as_deref(),
        Some("latitude=0&longitude=0&radius=8080")
    );
    assert_eq!(hospitals[0].authorization, None);
}

#[tokio::test]
async fn questions_request_carries_the_age() {
    let mut h = harness(MockApi::default()).await;
    h.flow
        .submit_age(" 40 ", &CancellationToken::new())
        .await
        .unwrap();

    let seen = h.api.seen_path("get_questions");
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].query.as_deref(), Some("age=40"));
}

#[tokio::test]
async fn bare_question_list_is_accepted() {
    let mut h = harness(MockApi {
        questions: (StatusCode::OK, json!(["only question"])),
        ..MockApi::default()
    })
    .await;

    let count = h
        .flow
        .submit_age("30", &CancellationToken::new())
        .await
        .unwrap();
    let session = h.flow.load_questionnaire().await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(session.questions().texts(), vec!["only question"]);
}

#[tokio::test]
async fn unexpected_question_shape_stages_nothing() {
    let mut h = harness(MockApi {
        questions: (StatusCode::OK, json!("not a questionnaire")),
        ..MockApi::default()
    })
    .await;

    let err = h
        .flow
        .submit_age("30", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::QuestionFormat(_)));
    assert_eq!(h.store.get_item(QUESTIONS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn question_fetch_failure_uses_the_server_message() {
    let mut h = harness(MockApi {
        questions: (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Age parameter is required" }),
        ),
        ..MockApi::default()
    })
    .await;

    let err = h
        .flow
        .submit_age("30", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Age parameter is required");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn zero_prediction_never_asks_for_providers() {
    let mut h = harness(MockApi {
        predict: (
            StatusCode::OK,
            json!({ "prediction": "0", "age_group": "adults" }),
        ),
        ..MockApi::default()
    })
    .await;
    let cancel = CancellationToken::new();

    h.flow.submit_age("40", &cancel).await.unwrap();
    h.flow.load_questionnaire().await.unwrap();
    h.flow.submit(&cancel).await.unwrap();
    let view = h
        .flow
        .load_result(&FixedLocation::at(12.97, 77.59), &cancel)
        .await
        .unwrap();

    assert_eq!(view.outcome, Outcome::LowLikelihood);
    assert_eq!(view.providers, None);
    assert!(h.api.seen_path("proxy/hospitals").is_empty());
}

#[tokio::test]
async fn denied_location_sends_no_provider_request() {
    let mut h = harness(MockApi::default()).await;
    h.store.set_item(PREDICTION_KEY, "1").await.unwrap();

    let view = h
        .flow
        .load_result(&FixedLocation::denied(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        view.providers,
        Some(ProvidersSection::Unavailable(
            "Permission to access location was denied".into()
        ))
    );
    assert!(h.api.seen().is_empty());
}

#[tokio::test]
async fn missing_results_list_is_an_empty_listing() {
    let mut h = harness(MockApi {
        hospitals: (StatusCode::OK, json!({ "status": "ZERO_RESULTS" })),
        ..MockApi::default()
    })
    .await;
    h.store.set_item(PREDICTION_KEY, "1").await.unwrap();

    let view = h
        .flow
        .load_result(&FixedLocation::at(1.0, 1.0), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(view.providers, Some(ProvidersSection::Listed(Vec::new())));
}

#[tokio::test]
async fn failed_submission_returns_to_the_questionnaire() {
    let mut h = harness(MockApi {
        predict: (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        ..MockApi::default()
    })
    .await;
    let cancel = CancellationToken::new();
    h.flow.submit_age("7", &cancel).await.unwrap();
    h.flow.load_questionnaire().await.unwrap();
    h.flow.toggle_answer(1).unwrap();

    let err = h.flow.submit(&cancel).await.unwrap_err();

    assert_eq!(err.to_string(), "Error submitting assessment");
    assert_eq!(h.store.get_item(PREDICTION_KEY).await.unwrap(), None);
    let session = h.flow.session().expect("answers kept for resubmission");
    assert_eq!(session.questions().responses(), vec!["0", "1", "0"]);
}

#[tokio::test]
async fn server_error_text_is_shown_verbatim() {
    let mut h = harness(MockApi {
        predict: (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Token is missing!" }),
        ),
        ..MockApi::default()
    })
    .await;
    let cancel = CancellationToken::new();
    h.flow.submit_age("7", &cancel).await.unwrap();
    h.flow.load_questionnaire().await.unwrap();

    let err = h.flow.submit(&cancel).await.unwrap_err();

    assert_eq!(err.to_string(), "Token is missing!");
    assert_eq!(err.title(), "Request Failed");
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let mut h = harness(MockApi::default()).await;
    let cancel = CancellationToken::new();
    h.flow.submit_age("7", &cancel).await.unwrap();
    h.flow.load_questionnaire().await.unwrap();
    h.flow.submit(&cancel).await.unwrap();

    let predict = h.api.seen_path("predict");
    assert_eq!(predict[0].authorization, None);
}

#[tokio::test]
async fn login_without_a_token_is_rejected() {
    let h = harness(MockApi {
        login: (StatusCode::OK, json!({ "message": "Login successful" })),
        ..MockApi::default()
    })
    .await;

    let err = h.flow.api().login(&credentials()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(h.store.get_item(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn rejected_login_keeps_the_previous_token() {
    let h = harness(MockApi {
        login: (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Invalid email or password" }),
        ),
        ..MockApi::default()
    })
    .await;
    h.flow.api().tokens().set_token("older").await.unwrap();

    let err = h.flow.api().login(&credentials()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(
        h.flow.api().tokens().get_token().await.unwrap().as_deref(),
        Some("older")
    );
    let login = h.api.seen_path("login");
    assert_eq!(login[0].authorization, None);
    assert_eq!(
        login[0].body,
        Some(json!({ "email": "parent@example.com", "password": "hunter22" }))
    );
}

#[tokio::test]
async fn logout_clears_the_token() {
    let h = harness(MockApi::default()).await;
    h.flow.api().login(&credentials()).await.unwrap();
    assert_eq!(
        h.store.get_item(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-1")
    );

    h.flow.api().logout().await.unwrap();
    h.flow.api().logout().await.unwrap();

    assert_eq!(h.flow.api().tokens().get_token().await.unwrap(), None);
}

#[tokio::test]
async fn signup_errors_use_the_server_message_or_fallback() {
    let account = SignupRequest {
        name: "Sam".into(),
        email: "sam@example.com".into(),
        password: "pw".into(),
    };

    let h = harness(MockApi {
        signup: (StatusCode::CONFLICT, json!({ "error": "Email already exists" })),
        ..MockApi::default()
    })
    .await;
    let err = h.flow.api().signup(&account).await.unwrap_err();
    assert_eq!(err.to_string(), "Email already exists");

    let h = harness(MockApi {
        signup: (StatusCode::BAD_REQUEST, json!({ "error": "" })),
        ..MockApi::default()
    })
    .await;
    let err = h.flow.api().signup(&account).await.unwrap_err();
    assert_eq!(err.to_string(), "Something went wrong");
}

#[tokio::test]
async fn signup_succeeds_anonymously() {
    let h = harness(MockApi::default()).await;
    let response = h
        .flow
        .api()
        .signup(&SignupRequest {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.message.as_deref(), Some("User created successfully"));
    assert_eq!(h.api.seen_path("signup")[0].authorization, None);
}

#[tokio::test]
async fn history_is_returned_in_server_order() {
    let h = harness(MockApi {
        assessments: (
            StatusCode::OK,
            json!([
                {
                    "id": 2, "age": 40, "age_group": "adults",
                    "responses": [1, 1], "prediction": true,
                    "created_at": "2024-03-05T14:30:00.123456"
                },
                {
                    "id": 1, "age": "7", "age_group": "children",
                    "responses": [0], "prediction": false,
                    "created_at": "2024-03-01T09:05:00"
                }
            ]),
        ),
        ..MockApi::default()
    })
    .await;
    h.flow.api().tokens().set_token("tok-9").await.unwrap();

    let records = h.flow.api().assessments().await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(records[0].outcome().summary(), "Indicators of ASD present");
    assert_eq!(records[1].outcome().summary(), "Low likelihood of ASD");
    assert_eq!(records[0].responses, vec!["1", "1"]);
    assert_eq!(records[1].responses, vec!["0"]);
    assert_eq!(
        h.api.seen_path("user/assessments")[0].authorization.as_deref(),
        Some("Bearer tok-9")
    );
}

#[tokio::test]
async fn history_failure_falls_back() {
    let h = harness(MockApi {
        assessments: (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        ..MockApi::default()
    })
    .await;

    let err = h.flow.api().assessments().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch assessments");
}

#[tokio::test]
async fn predict_can_be_called_directly() {
    let h = harness(MockApi::default()).await;
    let response = h
        .flow
        .api()
        .predict(&PredictRequest {
            age: "7".into(),
            responses: vec!["1".into()],
        })
        .await
        .unwrap();
    assert_eq!(response.prediction.as_str(), "1");
    assert_eq!(response.age_group, "children");
}

#[tokio::test]
async fn token_survives_a_restart_on_disk() {
    let api = Arc::new(MockApi::default());
    let base_url = spawn(api.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let first = ApiClient::new(&base_url, TokenStore::new(Arc::new(FileStore::new(&path)))).unwrap();
    first.login(&credentials()).await.unwrap();
    drop(first);

    let second =
        ApiClient::new(&base_url, TokenStore::new(Arc::new(FileStore::new(&path)))).unwrap();
    second.assessments().await.unwrap();

    assert_eq!(
        api.seen_path("user/assessments")[0].authorization.as_deref(),
        Some("Bearer tok-1")
    );
}
