//! Aussie Core - shared types for the Aussie web OS core.
//!
//! This crate provides:
//! - The error taxonomy every component reports through ([`ErrorKind`])
//! - Millisecond wall-clock helpers ([`now_millis`])
//! - Lexical path normalisation for the virtual file tree ([`VPath`])

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod path;
mod time;

pub use error::{ErrorKind, PathError};
pub use path::{MAX_DEPTH, VPath};
pub use time::{Millis, now_millis};
