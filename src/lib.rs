//! cloudtune: a terminal client for a NetEase-compatible music catalogue
//!
//! The engine lives in `model` (menus, navigation, playback, persistence)
//! and `controller` (the single-owner event loop). `view` renders the
//! snapshot the controller exposes; `audio` and `notify` are the output
//! collaborators.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod view;
