//! Source walkers.
//!
//! Each walker drives a [`BrowserSession`](crate::browser::BrowserSession)
//! over one hard-coded site layout. Walkers are strictly sequential: one
//! listing page, one article and one secondary browsing context at a time.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | The Paypers | [`thepaypers`] | Paginated listing | Stops at the lower date bound |

pub mod thepaypers;

pub use thepaypers::{ListingWalker, RunSummary, Termination, WalkerSettings};
