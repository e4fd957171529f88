//! Client for the PERSCOM personnel management API.
//!
//! Every request carries the bearer token and the `X-Perscom-Id` header.
//! Requests are sent one at a time and never retried.

pub mod models;
mod sync;

use reqwest::header;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::error::ConfigError;
use crate::BotError;
use models::Envelope;
use models::Paginated;
use models::Status;
use models::Submission;
pub use sync::sync_applicants;

/// Name of the header identifying the PERSCOM account.
const PERSCOM_ID_HEADER: &str = "x-perscom-id";

/// A configured PERSCOM client.
/// [reqwest::Client] uses an [Arc](std::sync::Arc) internally, so this is cheap to clone.
#[derive(Debug, Clone)]
pub struct PerscomClient {
    http: reqwest::Client,
    base: Url,
}

impl PerscomClient {
    /// Build a client for the API at `api_url`, e.g. `https://api.perscom.io/v2/`.
    pub fn new(api_url: &str, api_token: &str, perscom_id: &str) -> Result<Self, BotError> {
        // Without a trailing slash `Url::join` would replace the last segment.
        let base = if api_url.ends_with('/') {
            Url::parse(api_url)?
        } else {
            Url::parse(&format!("{api_url}/"))?
        };

        let invalid = |what: &str| ConfigError::InvalidConfig {
            reason: format!("PERSCOM {what} contains invalid characters"),
        };

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|_| invalid("api_token"))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::HeaderName::from_static(PERSCOM_ID_HEADER),
            header::HeaderValue::from_str(perscom_id).map_err(|_| invalid("perscom_id"))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self { http, base })
    }

    /// Absolute url of an endpoint relative to the api root.
    fn endpoint(&self, path: &str) -> Result<Url, BotError> {
        Ok(self.base.join(path)?)
    }

    /// Turn non-2xx responses into [BotError::PerscomStatus].
    fn check(response: Response, endpoint: &Url) -> Result<Response, BotError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(BotError::PerscomStatus {
                endpoint: endpoint.path().to_string(),
                status,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BotError> {
        let response = self.http.get(url.clone()).send().await?;
        let body = Self::check(response, &url)?.json().await?;
        Ok(body)
    }

    /// `GET /submissions?page={page}`
    #[instrument(skip(self))]
    pub async fn submissions_page(&self, page: u32) -> Result<Paginated<Submission>, BotError> {
        let mut url = self.endpoint("submissions")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.get_json(url).await
    }

    /// `GET /submissions/{id}/statuses`
    #[instrument(skip(self))]
    pub async fn submission_statuses(&self, submission_id: u64) -> Result<Vec<Status>, BotError> {
        let url = self.endpoint(&format!("submissions/{submission_id}/statuses"))?;
        let envelope: Envelope<Vec<Status>> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    /// `DELETE /users/{id}`
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: u64) -> Result<(), BotError> {
        let url = self.endpoint(&format!("users/{user_id}"))?;
        let response = self.http.delete(url.clone()).send().await?;
        Self::check(response, &url)?;
        Ok(())
    }

    /// `POST /cache`, clears PERSCOM's cached data.
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) -> Result<(), BotError> {
        let url = self.endpoint("cache")?;
        let response = self.http.post(url.clone()).send().await?;
        Self::check(response, &url)?;
        Ok(())
    }
}
