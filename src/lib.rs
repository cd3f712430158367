//! # Paypers Walker
//!
//! A single-source scraper plugin for [The Paypers](https://thepaypers.com)
//! news listing. It walks the paginated listing, opens every article in a
//! secondary browsing context, extracts it into a [`Document`] and hands it to
//! a sink until the listing runs out or an article falls before the
//! configured lower date bound.
//!
//! ## Collaborators
//!
//! The walker is wired by dependency injection; every collaborator is a trait:
//!
//! - [`BrowserSession`]: navigation, element lookup, bounded waits, browsing contexts
//! - [`RestrictionChecker`]: decides whether a document is still in range
//! - [`DocumentSink`]: receives finished documents
//!
//! ## Usage
//!
//! ```ignore
//! let session = HttpSession::new(ReqwestFetcher::new("paypers_walker", timeout)?);
//! let restrictions = Restrictions::new(config.restrictions.clone());
//! let mut walker = ListingWalker::new(session, restrictions, MemorySink::new(), config.walker_settings()?);
//! let summary = walker.run().await?;
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod outputs;
pub mod restrictions;
pub mod scrapers;
pub mod utils;

pub use browser::{BrowserSession, HttpSession, ReqwestFetcher, StaticPages};
pub use config::WalkerConfig;
pub use error::{BrowserError, Error, Result};
pub use models::{Document, MetadataField};
pub use outputs::{DocumentSink, JsonLinesSink, MemorySink};
pub use restrictions::{
    RestrictionChecker, RestrictionKind, RestrictionViolation, Restrictions, RestrictionsConfig,
};
pub use scrapers::{ListingWalker, RunSummary, Termination, WalkerSettings};
