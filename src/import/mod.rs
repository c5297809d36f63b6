//! Reading structured records out of offline dumps
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Import Coordinator                          │
//! │                 (passes, limits, progress, edges)                   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       RecordSource Trait                            │
//! │        fn iter_records() -> impl Iterator<ArticleRecord>            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                    │                                 │
//!                    ▼                                 ▼
//!          ┌─────────────────┐               ┌─────────────────┐
//!          │ WikimediaSource │               │  MemorySource   │
//!          │ - XML streaming │               │ - pre-built     │
//!          │ - bz2 decompress│               │   records       │
//!          └─────────────────┘               └─────────────────┘
//! ```

pub mod coordinator;
pub mod progress;
pub mod source;
pub mod wikimedia;
pub mod wikitext;

pub use coordinator::{DumpPass, EdgeCollection, ImportCoordinator};
pub use progress::{DumpProgress, DumpStats};
pub use source::{DumpFormat, ImportError, MemorySource, RecordSource};
pub use wikimedia::WikimediaSource;
pub use wikitext::{ParsedParagraph, WikiTextParser};
