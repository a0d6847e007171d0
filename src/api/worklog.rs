use super::{FetchError, PollPayload, PollQuery, WorkLogSource};
use crate::libs::config::ServerConfig;
use reqwest::{header, Client};

/// HTTP client for the work-log polling endpoint.
#[derive(Debug, Clone)]
pub struct WorkLogClient {
    client: Client,
    config: ServerConfig,
}

impl WorkLogClient {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.endpoint.trim_start_matches('/')
        )
    }

    pub async fn get(&self, query: &PollQuery) -> Result<PollPayload, FetchError> {
        let mut request = self
            .client
            .get(self.url())
            .header(header::ACCEPT, "application/json")
            .query(&query.params());
        if !self.config.auth_token.is_empty() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", self.config.auth_token));
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status().as_u16()));
        }

        let body = res.text().await?;
        PollPayload::from_json(&body)
    }
}

impl WorkLogSource for WorkLogClient {
    async fn fetch(&self, query: PollQuery) -> Result<PollPayload, FetchError> {
        self.get(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_endpoint() {
        let client = WorkLogClient::new(&ServerConfig {
            api_url: "https://erp.example.com/api/".into(),
            endpoint: "/worklogs/live".into(),
            auth_token: String::new(),
        });
        assert_eq!(client.url(), "https://erp.example.com/api/worklogs/live");
    }
}
