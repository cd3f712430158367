//! Host restrictions that can halt a source early.
//!
//! The walker only reacts to the signal: a [`RestrictionKind::FromDate`]
//! violation ends the run successfully, every other kind is propagated.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    FromDate,
    ToDate,
    MaximumMaterials,
    ToLastMaterial,
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestrictionKind::FromDate => "from_date",
            RestrictionKind::ToDate => "to_date",
            RestrictionKind::MaximumMaterials => "maximum_materials",
            RestrictionKind::ToLastMaterial => "to_last_material",
        };
        f.write_str(name)
    }
}

/// Signal that a document falls outside a configured restriction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("document {link} is out of the `{kind}` restriction: {detail}")]
pub struct RestrictionViolation {
    pub kind: RestrictionKind,
    pub link: String,
    pub detail: String,
}

impl RestrictionViolation {
    fn new(kind: RestrictionKind, document: &Document, detail: String) -> Self {
        Self {
            kind,
            link: document.link.clone(),
            detail,
        }
    }
}

/// Decides whether a document is still within the configured restrictions.
///
/// Called exactly once per document, before the document reaches the sink.
pub trait RestrictionChecker {
    fn check(&mut self, document: &Document) -> Result<(), RestrictionViolation>;
}

/// Restriction settings supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionsConfig {
    /// Inclusive lower bound on `published`.
    pub from_date: Option<NaiveDateTime>,
    /// Inclusive upper bound on `published`.
    pub to_date: Option<NaiveDateTime>,
    /// Number of documents accepted before the run must stop.
    pub maximum_materials: Option<usize>,
    /// Link of the newest document already stored by the host.
    pub to_last_material: Option<String>,
}

/// The standard checker over a [`RestrictionsConfig`].
#[derive(Debug, Clone)]
pub struct Restrictions {
    config: RestrictionsConfig,
    accepted: usize,
}

impl Restrictions {
    pub fn new(config: RestrictionsConfig) -> Self {
        Self { config, accepted: 0 }
    }

    /// Documents that passed every check so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }
}

impl RestrictionChecker for Restrictions {
    fn check(&mut self, document: &Document) -> Result<(), RestrictionViolation> {
        if let Some(from_date) = self.config.from_date {
            if document.published < from_date {
                return Err(RestrictionViolation::new(
                    RestrictionKind::FromDate,
                    document,
                    format!("published {} is before {}", document.published, from_date),
                ));
            }
        }

        if let Some(to_date) = self.config.to_date {
            if document.published > to_date {
                return Err(RestrictionViolation::new(
                    RestrictionKind::ToDate,
                    document,
                    format!("published {} is after {}", document.published, to_date),
                ));
            }
        }

        if let Some(last) = self.config.to_last_material.as_deref() {
            if document.link == last {
                return Err(RestrictionViolation::new(
                    RestrictionKind::ToLastMaterial,
                    document,
                    "reached the last stored material".to_string(),
                ));
            }
        }

        if let Some(maximum) = self.config.maximum_materials {
            if self.accepted >= maximum {
                return Err(RestrictionViolation::new(
                    RestrictionKind::MaximumMaterials,
                    document,
                    format!("already accepted {maximum} documents"),
                ));
            }
        }

        self.accepted += 1;
        debug!(link = %document.link, accepted = self.accepted, "Document within restrictions");
        Ok(())
    }
}
