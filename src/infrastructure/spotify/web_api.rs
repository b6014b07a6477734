//! Spotify Web API playback adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ports::{PlaybackApi, RemoteError};
use crate::domain::config::DEFAULT_API_BASE_URL;
use crate::domain::playback::{CatalogTrack, Device, PlaybackSnapshot, TrackInfo};
use crate::domain::track::TrackUri;

// Request types

#[derive(Debug, Serialize)]
struct PlayRequest {
    uris: Vec<String>,
    position_ms: u64,
}

// Response types

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<PlayingItem>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    uri: String,
    id: Option<String>,
    #[serde(default)]
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: Vec<DeviceObject>,
}

#[derive(Debug, Deserialize)]
struct DeviceObject {
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    uri: Option<String>,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    tracks: Page<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: String,
}

/// Upper bound on a single Web API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ALBUM_PAGE_SIZE: u32 = 50;
const PLAYLIST_PAGE_SIZE: u32 = 100;

/// Stop following `next` links after this many pages
const MAX_PAGES: usize = 200;

/// Web API client authenticated with a bearer token
pub struct WebApiClient {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl WebApiClient {
    /// Create a client against the public Web API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DEFAULT_API_BASE_URL)
    }

    /// Create a client against a custom API root
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Self::build_client(REQUEST_TIMEOUT),
        }
    }

    /// Replace the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = Self::build_client(timeout);
        self
    }

    fn build_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("HTTP client setup failed ({}), using defaults", e);
                reqwest::Client::new()
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::ApiError(Self::error_message(status, &body)));
        }

        Ok(response)
    }

    /// Prefer the API's own message over the raw body
    fn error_message(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => format!("HTTP {}: {}", status, parsed.error.message),
            Err(_) => format!("HTTP {}: {}", status, body),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))
    }

    /// Collect every item of a paged listing, following `next` links
    async fn paged<T: DeserializeOwned>(&self, first: String) -> Result<Vec<T>, RemoteError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages == MAX_PAGES {
                tracing::warn!("Listing truncated after {} pages", MAX_PAGES);
                break;
            }
            pages += 1;

            let page: Page<T> = self.read_json(self.client.get(&url)).await?;
            tracing::debug!("Fetched {} item(s) from {}", page.items.len(), url);
            items.extend(page.items);
            next = page.next;
        }
        Ok(items)
    }

    fn track_info(track: TrackObject) -> TrackInfo {
        TrackInfo {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            duration_ms: track.duration_ms,
        }
    }

    fn catalog_track(track: TrackObject) -> Option<CatalogTrack> {
        let uri = match track.uri.as_deref().map(str::parse) {
            Some(Ok(uri)) => uri,
            _ => {
                tracing::debug!("Skipping non-track entry {:?}", track.uri);
                return None;
            }
        };

        Some(CatalogTrack {
            uri,
            info: Self::track_info(track),
        })
    }

    fn snapshot(playing: CurrentlyPlaying) -> Option<PlaybackSnapshot> {
        let item = playing.item?;
        let track_id = match item.id {
            Some(id) => id,
            None => item.uri.rsplit(':').next().unwrap_or_default().to_string(),
        };

        Some(PlaybackSnapshot {
            track_uri: item.uri,
            track_id,
            is_playing: playing.is_playing,
            progress_ms: playing.progress_ms.unwrap_or(0),
            duration_ms: item.duration_ms,
        })
    }
}

#[async_trait]
impl PlaybackApi for WebApiClient {
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, RemoteError> {
        let response = self.send(self.client.get(self.url("/me/player"))).await?;

        // No active session
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let playing: CurrentlyPlaying =
            serde_json::from_str(&text).map_err(|e| RemoteError::ParseError(e.to_string()))?;

        Ok(Self::snapshot(playing))
    }

    async fn devices(&self) -> Result<Vec<Device>, RemoteError> {
        let response = self
            .send(self.client.get(self.url("/me/player/devices")))
            .await?;

        let list: DeviceList = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))?;

        Ok(list
            .devices
            .into_iter()
            .map(|d| Device {
                id: d.id,
                name: d.name,
                kind: d.kind,
                is_active: d.is_active,
            })
            .collect())
    }

    async fn start_playback(&self, uri: &TrackUri, position_ms: u64) -> Result<(), RemoteError> {
        let body = PlayRequest {
            uris: vec![uri.as_uri()],
            position_ms,
        };

        self.send(self.client.put(self.url("/me/player/play")).json(&body))
            .await?;
        Ok(())
    }

    async fn track(&self, uri: &TrackUri) -> Result<TrackInfo, RemoteError> {
        let path = format!("/tracks/{}", uri.id());
        let response = self.send(self.client.get(self.url(&path))).await?;

        let track: TrackObject = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))?;

        Ok(Self::track_info(track))
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<CatalogTrack>, RemoteError> {
        let first = self.url(&format!("/albums/{}/tracks?limit={}", album_id, ALBUM_PAGE_SIZE));
        let tracks: Vec<TrackObject> = self.paged(first).await?;

        Ok(tracks.into_iter().filter_map(Self::catalog_track).collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<CatalogTrack>, RemoteError> {
        let first = self.url(&format!(
            "/playlists/{}/tracks?limit={}",
            playlist_id, PLAYLIST_PAGE_SIZE
        ));
        let entries: Vec<PlaylistItem> = self.paged(first).await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter_map(Self::catalog_track)
            .collect())
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<CatalogTrack>, RemoteError> {
        let limit = limit.to_string();
        let url = reqwest::Url::parse_with_params(
            &self.url("/search"),
            [("q", query), ("type", "track"), ("limit", limit.as_str())],
        )
        .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        let results: SearchResults = self.read_json(self.client.get(url)).await?;
        Ok(results
            .tracks
            .items
            .into_iter()
            .filter_map(Self::catalog_track)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = WebApiClient::with_base_url("token", "http://localhost:1234/v1/");
        assert_eq!(client.url("/me/player"), "http://localhost:1234/v1/me/player");
    }

    #[test]
    fn default_base_url() {
        let client = WebApiClient::new("token");
        assert_eq!(client.url("/tracks/a"), "https://api.spotify.com/v1/tracks/a");
    }

    #[test]
    fn snapshot_from_playing_response() {
        let playing: CurrentlyPlaying = serde_json::from_str(
            r#"{
                "is_playing": true,
                "progress_ms": 1234,
                "item": {"uri": "spotify:track:abc", "id": "abc", "duration_ms": 180000}
            }"#,
        )
        .unwrap();

        let snapshot = WebApiClient::snapshot(playing).unwrap();
        assert_eq!(snapshot.track_uri, "spotify:track:abc");
        assert_eq!(snapshot.track_id, "abc");
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.progress_ms, 1234);
        assert_eq!(snapshot.duration_ms, 180000);
    }

    #[test]
    fn snapshot_without_item_is_none() {
        let playing: CurrentlyPlaying =
            serde_json::from_str(r#"{"is_playing": false, "progress_ms": null, "item": null}"#)
                .unwrap();

        assert!(WebApiClient::snapshot(playing).is_none());
    }

    #[test]
    fn snapshot_falls_back_to_uri_for_missing_id() {
        let playing: CurrentlyPlaying = serde_json::from_str(
            r#"{"is_playing": true, "progress_ms": 0, "item": {"uri": "spotify:track:xyz", "id": null, "duration_ms": 1000}}"#,
        )
        .unwrap();

        assert_eq!(WebApiClient::snapshot(playing).unwrap().track_id, "xyz");
    }

    #[test]
    fn play_request_body() {
        let body = PlayRequest {
            uris: vec!["spotify:track:abc".to_string()],
            position_ms: 0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"uris": ["spotify:track:abc"], "position_ms": 0})
        );
    }

    #[test]
    fn catalog_track_skips_local_files_and_episodes() {
        let local: TrackObject = serde_json::from_str(
            r#"{"uri": "spotify:local:Artist:Album:Song:215", "name": "Song", "duration_ms": 215000}"#,
        )
        .unwrap();
        assert!(WebApiClient::catalog_track(local).is_none());

        let episode: TrackObject = serde_json::from_str(
            r#"{"uri": "spotify:episode:512ojhOuo1ktJprKbVcKyQ", "name": "Ep", "duration_ms": 1}"#,
        )
        .unwrap();
        assert!(WebApiClient::catalog_track(episode).is_none());

        let track: TrackObject = serde_json::from_str(
            r#"{"uri": "spotify:track:abc", "name": "Song", "duration_ms": 1000, "artists": [{"name": "A"}]}"#,
        )
        .unwrap();
        let entry = WebApiClient::catalog_track(track).unwrap();
        assert_eq!(entry.uri.id(), "abc");
        assert_eq!(entry.info.artists, vec!["A".to_string()]);
    }

    #[test]
    fn error_message_uses_api_message() {
        let message = WebApiClient::error_message(
            StatusCode::NOT_FOUND,
            r#"{"error": {"status": 404, "message": "Player command failed: No active device found"}}"#,
        );
        assert_eq!(
            message,
            "HTTP 404 Not Found: Player command failed: No active device found"
        );
    }

    #[test]
    fn error_message_falls_back_to_body() {
        let message = WebApiClient::error_message(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(message, "HTTP 502 Bad Gateway: upstream down");
    }
}
