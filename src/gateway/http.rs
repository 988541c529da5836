// src/gateway/http.rs
// =============================================================================
// Search and fetch gateways backed by a JSON video API over HTTP.
//
// Routes:
//   GET {base}/search?q={keyword}  -> [VideoStub]
//   GET {base}/videos/{id}         -> FetchedVideo
//
// Status handling:
// - 2xx: parse the JSON body
// - 404 / 410 on a video: NotFound (an ordinary outcome)
// - anything else, or a transport error: Unavailable with a short reason
//
// Politeness:
// - One shared client (connection pooling)
// - A small fixed delay after every video fetch
// =============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use super::{FetchGateway, SearchGateway};
use crate::error::{FetchError, SearchError};
use crate::model::{FetchedVideo, VideoStub};

// Delay between video fetches so we don't hammer the API
const POLITE_DELAY: Duration = Duration::from_millis(100);

pub struct HttpGateway {
    client: Client,
    base: Url,
    delay: Duration,
}

impl HttpGateway {
    // Builds a gateway for the API rooted at `base_url`
    //
    // `timeout` applies to each HTTP request, connect + body.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid API URL '{}': {}", base_url, e))?;

        // Url::join replaces the last path segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base,
            delay: POLITE_DELAY,
        })
    }

    fn search_url(&self, keyword: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base.join("search")?;
        url.query_pairs_mut().append_pair("q", keyword);
        Ok(url)
    }

    fn video_url(&self, id: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base.join("videos/")?;
        // push via path_segments so ids are percent-encoded
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        Ok(url)
    }
}

#[async_trait]
impl SearchGateway for HttpGateway {
    async fn search(&self, keyword: &str) -> Result<Vec<VideoStub>, SearchError> {
        let url = self
            .search_url(keyword)
            .map_err(|e| SearchError::Unavailable(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Unavailable(describe_error(&e)))?;

        if !response.status().is_success() {
            return Err(SearchError::Unavailable(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .json::<Vec<VideoStub>>()
            .await
            .map_err(|e| SearchError::Unavailable(format!("invalid search response: {e}")))
    }
}

// GET {base}/videos/{id}, then waits POLITE_DELAY before the next request
//
// Returns: Result<FetchedVideo, FetchError>
//   NotFound: 404 or 410
//   Unavailable: any other failure (network, status, body)
#[async_trait]
impl FetchGateway for HttpGateway {
    async fn fetch(&self, stub: &VideoStub) -> Result<FetchedVideo, FetchError> {
        let url = self
            .video_url(&stub.id)
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let result = self.client.get(url).send().await;
        tokio::time::sleep(self.delay).await;

        let response = result.map_err(|e| FetchError::Unavailable(describe_error(&e)))?;
        classify_status(response.status())?;

        response
            .json::<FetchedVideo>()
            .await
            .map_err(|e| FetchError::Unavailable(format!("invalid video response: {e}")))
    }
}

// Maps a non-success status to the matching fetch outcome
fn classify_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
        Err(FetchError::NotFound)
    } else {
        Err(FetchError::Unavailable(format!("HTTP {}", status.as_u16())))
    }
}

// Turns a reqwest error into a short, human readable reason
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}
