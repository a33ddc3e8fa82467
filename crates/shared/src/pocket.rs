use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::models::{Article, RetrieveResponse};

/// Query parameter carrying the request token back to the callback.
pub const REQUEST_TOKEN_PARAM: &str = "request_token";

#[derive(Debug, Clone, Deserialize)]
pub struct RequestToken {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub username: String,
}

/// Which items `/v3/get` returns. The report always needs both read and
/// unread items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    All,
}

#[derive(Serialize)]
struct RequestTokenBody<'a> {
    consumer_key: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
struct AuthorizeBody<'a> {
    consumer_key: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct RetrieveBody<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    state: ItemState,
    #[serde(rename = "detailType")]
    detail_type: &'a str,
}

pub struct PocketClient {
    client: Client,
    consumer_key: String,
    api_base: String,
}

impl PocketClient {
    pub fn new(consumer_key: String, api_base: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            consumer_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Step one of the OAuth flow.
    pub async fn get_request_token(&self, redirect_uri: &str) -> Result<RequestToken> {
        let body = RequestTokenBody {
            consumer_key: &self.consumer_key,
            redirect_uri,
        };
        self.post("/v3/oauth/request", &body)
            .await
            .context("Failed to obtain a Pocket request token")
    }

    /// Page the browser is sent to so the user can approve the request token.
    pub fn authorize_url(&self, request_token: &str, redirect_uri: &str) -> String {
        format!(
            "{}/auth/authorize?request_token={}&redirect_uri={}",
            self.api_base,
            urlencoding::encode(request_token),
            urlencoding::encode(redirect_uri)
        )
    }

    /// Exchange an approved request token for an access token.
    pub async fn get_access_token(&self, request_token: &str) -> Result<AccessToken> {
        let body = AuthorizeBody {
            consumer_key: &self.consumer_key,
            code: request_token,
        };
        self.post("/v3/oauth/authorize", &body)
            .await
            .context("Failed to exchange the request token for an access token")
    }

    pub async fn get_articles(&self, access_token: &str, state: ItemState) -> Result<Vec<Article>> {
        let body = RetrieveBody {
            consumer_key: &self.consumer_key,
            access_token,
            state,
            detail_type: "simple",
        };
        let response: RetrieveResponse = self
            .post("/v3/get", &body)
            .await
            .context("Failed to fetch saved items from Pocket")?;

        Ok(response.into_articles())
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!(%url, "calling Pocket");

        let response = self
            .client
            .post(&url)
            .header("X-Accept", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let response = Self::check_status(response).await?;

        response
            .json::<T>()
            .await
            .context("Failed to parse Pocket API response")
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Pocket explains failures in a header rather than the body.
        let reason = response
            .headers()
            .get("X-Error")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let error_text = match reason {
            Some(reason) => reason,
            None => response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error")),
        };
        anyhow::bail!("Pocket API returned error: {} - {}", status, error_text);
    }
}

/// Callback URL that carries the request token, so `/results` needs no
/// server-side state to finish the flow.
pub fn callback_with_token(callback_url: &str, request_token: &str) -> Result<String> {
    let mut url = Url::parse(callback_url)
        .with_context(|| format!("Invalid callback URL: {}", callback_url))?;
    url.query_pairs_mut()
        .append_pair(REQUEST_TOKEN_PARAM, request_token);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PocketClient {
        PocketClient::new(
            "key".to_string(),
            "https://getpocket.com/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_callback_with_token() {
        let url = callback_with_token("http://localhost:8451/results", "abc-123").unwrap();
        assert_eq!(url, "http://localhost:8451/results?request_token=abc-123");
    }

    #[test]
    fn test_callback_with_token_encodes() {
        let url = callback_with_token("http://localhost:8451/results", "a b&c").unwrap();
        assert_eq!(url, "http://localhost:8451/results?request_token=a+b%26c");
    }

    #[test]
    fn test_callback_with_invalid_url() {
        assert!(callback_with_token("not a url", "x").is_err());
    }

    #[test]
    fn test_authorize_url() {
        let url = client().authorize_url(
            "tok",
            "http://localhost:8451/results?request_token=tok",
        );
        assert_eq!(
            url,
            "https://getpocket.com/auth/authorize?request_token=tok&redirect_uri=http%3A%2F%2Flocalhost%3A8451%2Fresults%3Frequest_token%3Dtok"
        );
    }

    #[test]
    fn test_retrieve_body_shape() {
        let body = RetrieveBody {
            consumer_key: "k",
            access_token: "t",
            state: ItemState::All,
            detail_type: "simple",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["state"], "all");
        assert_eq!(json["detailType"], "simple");
    }
}
