//! wikiredirects: redirect resolution for Wikimedia dumps
//!
//! Reads a MediaWiki XML dump (plain or bzip2 multistream) and produces:
//! - A forward map from every redirect title to its canonical article
//! - A reverse map from every canonical article to all of its aliases
//! - Article plain text, paragraph/link associations and surface forms,
//!   with every link rewritten to its canonical target
//!
//! Redirect chains are resolved in parallel against a shared read-only index,
//! with cycle detection and a depth bound.

pub mod artifacts;
pub mod config;
pub mod import;
pub mod redirects;
pub mod types;

pub use config::Config;
pub use types::*;
