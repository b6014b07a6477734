//! Spotify Web API infrastructure module

mod web_api;

pub use web_api::WebApiClient;
