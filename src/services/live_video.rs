// src/services/live_video.rs
//! Cloudflare Stream live-input client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum LiveVideoError {
    #[error("Stream API not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LiveInputResult {
    uid: String,
    rtmps: Option<RtmpsEndpoint>,
    playback: Option<PlaybackUrls>,
}

#[derive(Debug, Deserialize)]
struct RtmpsEndpoint {
    url: Option<String>,
    #[serde(rename = "streamKey")]
    stream_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PlaybackUrls {
    hls: Option<String>,
    dash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordingResult {
    playback: Option<PlaybackUrls>,
}

#[derive(Debug, Serialize)]
struct CreateLiveInputRequest<'a> {
    meta: LiveInputMeta<'a>,
    recording: RecordingOptions,
}

#[derive(Debug, Serialize)]
struct LiveInputMeta<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct RecordingOptions {
    mode: &'static str,
}

/// A freshly created live input
#[derive(Debug, Clone)]
pub struct LiveInput {
    pub uid: String,
    pub rtmps_url: String,
    pub stream_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivePlayback {
    pub hls_url: Option<String>,
    pub dash_url: Option<String>,
}

#[derive(Clone)]
pub struct LiveVideoService {
    client: Client,
    api_base: String,
    account_id: String,
    api_token: Option<String>,
}

impl LiveVideoService {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        account_id: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_id: account_id.into(),
            api_token,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    fn token(&self) -> Result<&str, LiveVideoError> {
        self.api_token
            .as_deref()
            .ok_or(LiveVideoError::NotConfigured)
    }

    fn live_inputs_url(&self) -> String {
        format!("{}/accounts/{}/stream/live_inputs", self.api_base, self.account_id)
    }

    /// Player iframe URL; needs no API credentials.
    pub fn embed_url(&self, live_input_id: &str) -> String {
        format!(
            "https://customer-{}.cloudflarestream.com/{}/iframe",
            self.account_id, live_input_id
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, LiveVideoError> {
        let token = self.token()?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LiveVideoError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LiveVideoError::RequestFailed(format!(
                "provider returned {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LiveVideoError::InvalidResponse(e.to_string()))
    }

    /// Creates a live input with automatic recording.
    pub async fn create_live_input(&self, title: &str) -> Result<LiveInput, LiveVideoError> {
        let token = self.token()?;

        let body = CreateLiveInputRequest {
            meta: LiveInputMeta { name: title },
            recording: RecordingOptions { mode: "automatic" },
        };

        let response = self
            .client
            .post(self.live_inputs_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to reach Stream API");
                LiveVideoError::RequestFailed(e.to_string())
            })?;

        let envelope = response
            .json::<ApiEnvelope<LiveInputResult>>()
            .await
            .map_err(|e| LiveVideoError::InvalidResponse(e.to_string()))?;

        let result = envelope
            .result
            .ok_or_else(|| LiveVideoError::InvalidResponse("missing result".to_string()))?;

        match result.rtmps {
            Some(RtmpsEndpoint {
                url: Some(url),
                stream_key: Some(stream_key),
            }) => {
                info!(live_input_id = %result.uid, "Live input created");
                Ok(LiveInput {
                    uid: result.uid,
                    rtmps_url: url,
                    stream_key,
                })
            }
            _ => {
                error!(live_input_id = %result.uid, "Stream API response has no RTMPS endpoint");
                Err(LiveVideoError::InvalidResponse(
                    "missing rtmps url or stream key".to_string(),
                ))
            }
        }
    }

    /// Removes a live input that no stream record refers to.
    pub async fn delete_live_input(&self, live_input_id: &str) -> Result<(), LiveVideoError> {
        let token = self.token()?;
        let url = format!("{}/{}", self.live_inputs_url(), live_input_id);

        let response = self
            .client
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LiveVideoError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LiveVideoError::RequestFailed(format!(
                "provider returned {}",
                status
            )));
        }

        info!(live_input_id = %live_input_id, "Live input deleted");
        Ok(())
    }

    pub async fn get_playback(&self, live_input_id: &str) -> Result<LivePlayback, LiveVideoError> {
        let url = format!("{}/{}", self.live_inputs_url(), live_input_id);
        let envelope: ApiEnvelope<LiveInputResult> = self.get_json(&url).await?;

        let playback = envelope
            .result
            .and_then(|r| r.playback)
            .unwrap_or_default();

        Ok(LivePlayback {
            hls_url: playback.hls,
            dash_url: playback.dash,
        })
    }

    /// HLS URL of the first recording of a live input, if any exists yet.
    pub async fn latest_recording_url(
        &self,
        live_input_id: &str,
    ) -> Result<Option<String>, LiveVideoError> {
        let url = format!("{}/{}/videos", self.live_inputs_url(), live_input_id);
        let envelope: ApiEnvelope<Vec<RecordingResult>> = self.get_json(&url).await?;

        let recording_url = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.playback)
            .and_then(|p| p.hls);

        debug!(
            live_input_id = %live_input_id,
            found = recording_url.is_some(),
            "Recording lookup finished"
        );
        Ok(recording_url)
    }
}
