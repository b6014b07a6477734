//! Track URI value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TrackUriParseError;

const URI_PREFIX: &str = "spotify:track:";
const LINK_HOST: &str = "open.spotify.com";

/// A validated `spotify:track:<id>` reference.
///
/// Accepts either the URI form or an `open.spotify.com` share link (with or
/// without a locale segment and query string) and normalizes to the URI form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackUri {
    id: String,
}

impl TrackUri {
    /// The bare track id (base62)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The canonical `spotify:track:<id>` form
    pub fn as_uri(&self) -> String {
        format!("{}{}", URI_PREFIX, self.id)
    }

    /// True if the given URI string refers to this track
    pub fn matches(&self, uri: &str) -> bool {
        uri.strip_prefix(URI_PREFIX) == Some(self.id.as_str())
    }
}

pub(super) fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Splits `spotify:<kind>:<id>` or an `open.spotify.com/<kind>/<id>` link
/// into kind and id. The id is not validated.
pub(super) fn split_reference(input: &str) -> Option<(&str, &str)> {
    if let Some(rest) = input.strip_prefix("spotify:") {
        return rest.split_once(':');
    }

    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))?;
    let rest = rest.strip_prefix(LINK_HOST)?;
    let path = rest.split(['?', '#']).next()?;

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let mut kind = segments.next()?;
    if kind.starts_with("intl-") {
        kind = segments.next()?;
    }
    Some((kind, segments.next().unwrap_or_default()))
}

impl FromStr for TrackUri {
    type Err = TrackUriParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let err = || TrackUriParseError {
            input: s.to_string(),
        };

        let id = match split_reference(input) {
            Some(("track", id)) if is_valid_id(id) => id,
            _ => return Err(err()),
        };

        Ok(Self { id: id.to_string() })
    }
}

impl fmt::Display for TrackUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URI_PREFIX, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

    #[test]
    fn parse_uri_form() {
        let uri: TrackUri = format!("spotify:track:{ID}").parse().unwrap();
        assert_eq!(uri.id(), ID);
        assert_eq!(uri.to_string(), format!("spotify:track:{ID}"));
    }

    #[test]
    fn parse_share_link_with_query() {
        let uri: TrackUri = format!("https://open.spotify.com/track/{ID}?si=abc123")
            .parse()
            .unwrap();
        assert_eq!(uri.id(), ID);
    }

    #[test]
    fn parse_localized_link() {
        let uri: TrackUri = format!("https://open.spotify.com/intl-de/track/{ID}")
            .parse()
            .unwrap();
        assert_eq!(uri.id(), ID);
    }

    #[test]
    fn parse_trims_whitespace() {
        let uri: TrackUri = format!("  spotify:track:{ID}\n").parse().unwrap();
        assert_eq!(uri.id(), ID);
    }

    #[test]
    fn album_and_playlist_are_not_tracks() {
        assert!("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3"
            .parse::<TrackUri>()
            .is_err());
        assert!("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"
            .parse::<TrackUri>()
            .is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<TrackUri>().is_err());
        assert!("spotify:track:".parse::<TrackUri>().is_err());
        assert!("spotify:track:abc-def".parse::<TrackUri>().is_err());
        assert!("https://example.com/track/abc".parse::<TrackUri>().is_err());
    }

    #[test]
    fn matches_only_same_track() {
        let uri: TrackUri = format!("spotify:track:{ID}").parse().unwrap();
        assert!(uri.matches(&format!("spotify:track:{ID}")));
        assert!(!uri.matches("spotify:track:other"));
        assert!(!uri.matches(&format!("spotify:episode:{ID}")));
    }
}
