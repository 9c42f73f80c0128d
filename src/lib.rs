//! Presence status light: an HTTP-controlled RGB LED matrix.
//!
//! Shows a human presence status (Available/Busy/Away/Off/Rainbow) on a
//! small matrix and exposes an HTTP API to change it.
//!
//! ## Architecture
//! - **Status controller** (`controller`): owns the current status and the
//!   pin flag, stops and joins the running animation before starting the
//!   next one — the display only ever has a single writer.
//! - **Animation engine** (`animation`): solid/blink/rainbow/countdown
//!   loops on dedicated threads with cooperative cancellation.
//! - **Display surface** (`surface`): one capability trait over the
//!   full-size matrix, the mini matrix and a software mock; the backend is
//!   picked once at startup.
//! - **HTTP server** (`server`): axum routes translating requests into
//!   controller calls; webhook notification rides along on transitions.

pub mod animation;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod sensor;
pub mod server;
pub mod surface;
pub mod webhook;

pub use color::Color;
pub use controller::{ControllerState, Status, StatusController};
pub use error::LightError;
pub use surface::DisplaySurface;
