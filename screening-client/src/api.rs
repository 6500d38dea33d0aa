//! Typed access to the screening API.
//!
//! Requests go through [`ApiClient::request`] (anonymous) or
//! [`ApiClient::authenticated_request`] (bearer token when one is stored).
//! Both produce a built [`reqwest::Request`] that can be inspected before it is
//! sent. There is no retry, timeout, or refresh-on-401.

use http::{
    HeaderMap, HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use reqwest::{Client, Request, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use shared::{
    config::{ClientConfig, client::join_endpoint},
    models::{
        Age, AssessmentRecord, Coordinates, ErrorResponse, HospitalsResponse, LoginRequest,
        LoginResponse, Place, PredictRequest, PredictResponse, QuestionsPayload, SignupRequest,
        SignupResponse,
    },
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    token::TokenStore,
};

const USER_AGENT: &str = concat!("screening-client/", env!("CARGO_PKG_VERSION"));
const APPLICATION_JSON: &str = "application/json";

/// Method, body, headers and query for one outbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST carrying `body` as JSON.
    ///
    /// # Errors
    /// Fails when `body` cannot be represented as JSON.
    pub fn post<T: Serialize>(body: &T) -> ClientResult<Self> {
        let body =
            serde_json::to_value(body).map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A response that made it back from the server, already parsed as JSON.
#[derive(Debug)]
struct ApiResponse {
    status: StatusCode,
    body: Value,
}

/// API client for the screening backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new API client with the provided base URL.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(base_url: &str, tokens: TokenStore) -> ClientResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(base_url, client, tokens))
    }

    /// Create a client for the configured API base URL.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig, tokens: TokenStore) -> ClientResult<Self> {
        Self::new(config.api_base_url.as_str(), tokens)
    }

    pub fn with_client(base_url: &str, client: Client, tokens: TokenStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            tokens,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        join_endpoint(&self.base_url, path)
    }

    /// Build a request without credentials.
    ///
    /// `Content-Type: application/json` is set unless `options` overrides it.
    ///
    /// # Errors
    /// Fails when the URL or a header is invalid.
    pub fn request(&self, path: &str, options: RequestOptions) -> ClientResult<Request> {
        self.build(path, options, None)
    }

    /// Build a request carrying `Authorization: Bearer <token>` when a token
    /// is stored. A token that cannot be read is treated as absent.
    ///
    /// # Errors
    /// Fails when the URL or a header is invalid.
    pub async fn authenticated_request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<Request> {
        // Read failures were already logged by the token store
        let token = self.tokens.get_token().await.unwrap_or_default();
        if token.is_none() {
            debug!(path, "no access token stored; sending anonymously");
        }
        self.build(path, options, token.as_deref())
    }

    fn build(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> ClientResult<Request> {
        let RequestOptions {
            method,
            body,
            headers: overrides,
            query,
        } = options;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.extend(overrides);

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self.client.request(method, self.api_url(path)).headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            let bytes =
                serde_json::to_vec(&body).map_err(|err| ClientError::Decode(err.to_string()))?;
            builder = builder.body(bytes);
        }

        Ok(builder.build()?)
    }

    /// Send `request` and read the JSON body. Non-2xx responses become
    /// [`ClientError::Server`] with the server's `error` or `fallback`.
    async fn execute(&self, request: Request, fallback: &str) -> ClientResult<ApiResponse> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "sending request");

        let response = self
            .client
            .execute(request)
            .await
            .inspect_err(|err| warn!(%method, %path, error = %err, "request failed"))?;
        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&text);

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .map(ErrorResponse::from_value)
                .unwrap_or_default()
                .message_or(fallback);
            warn!(%method, %path, %status, %message, "request rejected");
            return Err(ClientError::Server { status, message });
        }

        let body = parsed.map_err(|err| ClientError::Decode(err.to_string()))?;
        debug!(%method, %path, %status, "request succeeded");
        Ok(ApiResponse { status, body })
    }

    /// `GET /get_questions?age=<age>`.
    ///
    /// # Errors
    /// Transport and server failures, and a payload in neither accepted shape.
    pub async fn fetch_questions(&self, age: &Age) -> ClientResult<QuestionsPayload> {
        let options = RequestOptions::get()
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
            .query("age", age);
        let request = self.request("get_questions", options)?;
        let response = self.execute(request, "Failed to fetch questions").await?;
        Ok(QuestionsPayload::parse(&response.body)?)
    }

    /// `POST /login`. Stores the issued token.
    ///
    /// A 2xx response without an `access_token` is a failed login and nothing
    /// is stored.
    ///
    /// # Errors
    /// Server rejection, a missing token, transport failures, and a failed
    /// token write.
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<LoginResponse> {
        const FALLBACK: &str = "Invalid credentials";

        let request = self.request("login", RequestOptions::post(credentials)?)?;
        let response = self.execute(request, FALLBACK).await?;
        let login: LoginResponse = decode(response.body.clone())?;

        let Some(token) = login.token() else {
            let message = ErrorResponse::from_value(&response.body).message_or(FALLBACK);
            warn!(status = %response.status, "login response carried no access token");
            return Err(ClientError::Server {
                status: response.status,
                message,
            });
        };

        self.tokens.set_token(token).await?;
        info!(email = %credentials.email, "logged in");
        Ok(login)
    }

    /// `POST /signup`, sent through the authenticated wrapper.
    ///
    /// # Errors
    /// Transport and server failures.
    pub async fn signup(&self, account: &SignupRequest) -> ClientResult<SignupResponse> {
        let request = self
            .authenticated_request("signup", RequestOptions::post(account)?)
            .await?;
        let response = self.execute(request, "Something went wrong").await?;
        info!(email = %account.email, "account created");
        decode(response.body)
    }

    /// Forget the stored token.
    ///
    /// # Errors
    /// The token store's failure, so the caller knows the session may linger.
    pub async fn logout(&self) -> ClientResult<()> {
        self.tokens.clear_token().await?;
        info!("logged out");
        Ok(())
    }

    /// `POST /predict` with the bearer token.
    ///
    /// # Errors
    /// Transport and server failures, and a response without
    /// `prediction`/`age_group`.
    pub async fn predict(&self, submission: &PredictRequest) -> ClientResult<PredictResponse> {
        let options = RequestOptions::post(submission)?
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        let request = self.authenticated_request("predict", options).await?;
        let response = self.execute(request, "Error submitting assessment").await?;
        decode(response.body)
    }

    /// `GET /user/assessments` with the bearer token, in server order.
    ///
    /// # Errors
    /// Transport and server failures.
    pub async fn assessments(&self) -> ClientResult<Vec<AssessmentRecord>> {
        let options =
            RequestOptions::get().header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        let request = self.authenticated_request("user/assessments", options).await?;
        let response = self.execute(request, "Failed to fetch assessments").await?;
        decode(response.body)
    }

    /// `GET /proxy/hospitals` around `origin`, in server order.
    ///
    /// # Errors
    /// Transport and server failures.
    pub async fn nearby_places(&self, origin: Coordinates, radius_m: u32) -> ClientResult<Vec<Place>> {
        let options = RequestOptions::get()
            .query("latitude", origin.latitude)
            .query("longitude", origin.longitude)
            .query("radius", radius_m);
        let request = self.request("proxy/hospitals", options)?;
        let response = self
            .execute(request, "Failed to fetch nearby providers")
            .await?;
        let hospitals: HospitalsResponse = decode(response.body)?;
        Ok(hospitals.results.unwrap_or_default())
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    serde_json::from_value(body).map_err(|err| ClientError::Decode(err.to_string()))
}
