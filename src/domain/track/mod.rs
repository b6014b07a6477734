//! Track domain module

mod reference;
mod uri;

pub use reference::{CollectionKind, CollectionRef, SpotifyRef};
pub use uri::TrackUri;
