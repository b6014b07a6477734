//! Spotify Recorder - record tracks from the desktop player to files
//!
//! This crate synchronizes a polled remote playback state with an external
//! audio capture process: it makes sure a playback device exists, starts or
//! observes playback of the requested track, supervises the capture, and
//! checks the produced file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the start-detection state machine, and errors
//! - **Application**: The recording engine and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (Web API, player, capture script, config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
