use reqwest::StatusCode;

/// Why a case fetch was abandoned.
///
/// The API collapses all of these into one "not found" answer, so the
/// variants exist for the logs.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}: {body}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("search response from {url} is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no XSRF-TOKEN cookie was set by {url}")]
    MissingToken { url: String },

    #[error("the supplied URL is not valid: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ScrapeError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        ScrapeError::Transport {
            url: url.to_string(),
            source,
        }
    }

    /// True for failures of the network exchange itself, as opposed to a
    /// reachable site that did not hand out a token.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScrapeError::Transport { .. }
                | ScrapeError::HttpStatus { .. }
                | ScrapeError::Decode { .. }
        )
    }
}
