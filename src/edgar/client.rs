// src/edgar/client.rs
use crate::utils::error::EdgarError;
use reqwest::header;

// SEC rejects requests without a descriptive User-Agent. Override with --user-agent.
pub const DEFAULT_USER_AGENT: &str = "nport_extractor admin@example.com";

/// Source of remote documents. A single attempt per call; retries happen by
/// re-running the whole program.
pub trait Fetch {
    async fn get_text(&self, url: &str) -> Result<String, EdgarError>;
}

/// reqwest-backed client configured for EDGAR interaction.
pub struct EdgarClient {
    http: reqwest::Client,
    user_agent: String,
}

impl EdgarClient {
    pub fn new(user_agent: &str) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent) // Set the required User-Agent
            .build()?;
        Ok(Self {
            http,
            user_agent: user_agent.to_string(),
        })
    }
}

impl Fetch for EdgarClient {
    async fn get_text(&self, url: &str) -> Result<String, EdgarError> {
        tracing::debug!("GET {} (User-Agent: {})", url, self.user_agent);

        let response = self.http.get(url)
            .header(header::ACCEPT, "application/xml,text/xml,text/plain,*/*")
            .send()
            .await?; // Propagates reqwest::Error as EdgarError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::NotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }

        let body = response.text().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

        Ok(body)
    }
}
