//! Aussie Test - Shared test utilities for the Aussie web OS core.
//!
//! This crate provides scripted executors, an event recorder and
//! ready-wired component fixtures that can be used across multiple Aussie
//! crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! aussie-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use aussie_test::TestCore;
//!
//!     #[tokio::test]
//!     async fn test_write_then_read() {
//!         let core = TestCore::new().await;
//!         core.fs.write_file("/a.txt", "hi", false).unwrap();
//!         assert_eq!(core.fs.read_file("/a.txt").unwrap(), "hi");
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
