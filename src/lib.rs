//! Workout logging, statistics and coach requests on top of
//! semicolon-delimited flat files.

pub mod accounts;
pub mod activity;
pub mod codec;
pub mod coaching;
pub mod config;
pub mod error;
pub mod logging;
pub mod profile;
pub mod session;
pub mod store;
pub mod tracker;
pub mod training;
pub mod user;

pub use error::{Rejection, Result, TrackerError};
pub use session::Session;
pub use tracker::Tracker;
