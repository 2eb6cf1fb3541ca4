use std::time::Duration;

use anyhow::Context;
use url::Url;
use webpi_protocol::ExecuteCommandRequest;
use webpi_protocol::ExecuteCommandResponse;
use webpi_tui::CommandExecutor;
use webpi_tui::ExecutorError;

/// Runs commands by POSTing them as JSON to the remote endpoint.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpExecutor {
    pub fn new(endpoint: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("webpi/{}", webpi_tui::WEBPI_VERSION))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> ExecutorError {
        if err.is_timeout() {
            ExecutorError::Timeout(self.timeout)
        } else {
            ExecutorError::Transport(err.to_string())
        }
    }
}

impl CommandExecutor for HttpExecutor {
    async fn execute(
        &self,
        request: ExecuteCommandRequest,
    ) -> Result<ExecuteCommandResponse, ExecutorError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        let decoded = serde_json::from_slice::<ExecuteCommandResponse>(&body);

        if status.is_success() {
            return decoded.map_err(|err| ExecutorError::MalformedResponse(err.to_string()));
        }

        // Servers report command failures with an error status and a normal
        // body; use that body when it carries anything.
        match decoded {
            Ok(response)
                if response.output_text().is_some()
                    || response.error_text().is_some()
                    || response.new_path_text().is_some() =>
            {
                tracing::debug!(status = status.as_u16(), "using body of error response");
                Ok(response)
            }
            _ => Err(ExecutorError::Status {
                status: status.as_u16(),
            }),
        }
    }
}
