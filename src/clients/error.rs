use reqwest::Response;
use serde::Deserialize;
use thiserror::Error;

/// Failure talking to a remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timeout. Please check your internet connection.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    NotConfigured(String),

    /// The response arrived but saving its result on the device failed.
    #[error("{0}")]
    Storage(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::NotConfigured(format!("Invalid URL: {err}"))
    }
}

impl ClientError {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"message": "..."}`
    Flat { message: String },
    /// `{"error": {"message": "..."}}`
    Nested { error: NestedError },
}

#[derive(Deserialize)]
struct NestedError {
    message: String,
}

/// Passes 2xx responses through; maps anything else to [`ClientError::Upstream`],
/// preferring the message the service put in its JSON body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody::Flat { message } | ErrorBody::Nested { error: NestedError { message } })
            if !message.is_empty() =>
        {
            message
        }
        _ => format!("HTTP {}", status.as_u16()),
    };

    Err(ClientError::Upstream {
        service,
        status: status.as_u16(),
        message,
    })
}
