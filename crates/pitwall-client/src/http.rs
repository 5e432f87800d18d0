//! reqwest implementation of the counter endpoints.

use serde::Deserialize;

use crate::{ApiError, AuthToken, ServiceApi, SessionConfig};

/// HTTP client for the unread-count contract.
///
/// Attaches the bearer credential to every call. With no credential present
/// it short-circuits to zero/ok without issuing the request, so an
/// unauthenticated shell renders a quiet badge instead of a 401 storm.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<AuthToken>,
}

/// `GET /notifications/unread/count` body.
#[derive(Debug, Deserialize)]
struct CountBody {
    count: u64,
}

impl HttpApi {
    /// Build from session configuration.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str, token: &AuthToken) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check_status(&response)?;
        Ok(response)
    }
}

fn check_status(response: &reqwest::Response) -> Result<(), ApiError> {
    match response.status().as_u16() {
        401 | 403 => Err(ApiError::Unauthorized),
        status if !response.status().is_success() => Err(ApiError::Status { status }),
        _ => Ok(()),
    }
}

impl ServiceApi for HttpApi {
    async fn unread_notification_count(&self) -> Result<u64, ApiError> {
        let Some(token) = &self.token else {
            return Ok(0);
        };
        let response = self.get("notifications/unread/count", token).await?;
        let body: CountBody =
            response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.count)
    }

    async fn unread_message_count(&self) -> Result<u64, ApiError> {
        let Some(token) = &self.token else {
            return Ok(0);
        };
        // This endpoint returns a bare integer, not an object.
        let response = self.get("messages/unread/count", token).await?;
        response.json::<u64>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        let response = self
            .client
            .put(self.url("notifications/read-all"))
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check_status(&response)
    }
}

#[cfg(test)]
mod tests {
    use pitwall_core::SessionRole;

    use super::*;

    #[test]
    fn url_joining_handles_slashes() {
        let mut config = SessionConfig::new(SessionRole::Customer);
        config.api_url = "http://localhost:8080/api/".into();
        let api = HttpApi::new(&config);
        assert_eq!(
            api.url("/notifications/unread/count"),
            "http://localhost:8080/api/notifications/unread/count"
        );
    }

    /// No credential: zero state, and no request is ever issued; the base
    /// URL here is unroutable, so an attempted call would fail loudly.
    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let mut config = SessionConfig::new(SessionRole::Customer);
        config.api_url = "http://pitwall.invalid".into();
        let api = HttpApi::new(&config);

        assert_eq!(api.unread_notification_count().await, Ok(0));
        assert_eq!(api.unread_message_count().await, Ok(0));
        assert_eq!(api.mark_all_notifications_read().await, Ok(()));
    }
}
