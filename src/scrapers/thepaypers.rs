//! The Paypers news listing walker.
//!
//! Walks [The Paypers](https://thepaypers.com/news/all) listing page by page.
//! Every teaser row is opened in a secondary browsing context, extracted into
//! a [`Document`], checked against the host restrictions and handed to the
//! sink. The listing is ordered newest first, so the first document older
//! than the lower date bound ends the whole run.
//!
//! # Page Structure
//!
//! | Element | Selector |
//! |---------|----------|
//! | Listing container | `.index_group` |
//! | Teaser row | `.details_rows` |
//! | Row link / date label | `h3 a` / `.source` (`"<source> \| <date>"`) |
//! | Article container | `.article` |
//! | Title / body | `h1` / `#pageContainer` |
//! | Metadata label cells | `table.category_table td.source` |
//! | Next page | `a.next` |

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::browser::{BrowserSession, PRIMARY_CONTEXT};
use crate::error::{BrowserError, Error, Result};
use crate::models::{Document, MetadataField};
use crate::outputs::DocumentSink;
use crate::restrictions::{RestrictionChecker, RestrictionKind};
use crate::utils::{parse_date_label, truncate_for_log};

pub const LISTING_URL: &str = "https://thepaypers.com/news/all";

const LISTING_CONTAINER: &str = ".index_group";
const ARTICLE_ROW: &str = ".details_rows";
const ROW_LINK: &str = "h3 a";
const ROW_SOURCE_LABEL: &str = ".source";
const ARTICLE_CONTAINER: &str = ".article";
const ARTICLE_TITLE: &str = "h1";
const ARTICLE_BODY: &str = "#pageContainer";
const METADATA_LABELS: &str = "table.category_table td[class='source']";
const METADATA_VALUE_TAG: &str = "td";
const NEXT_PAGE: &str = "a[class='next']";

/// Separates the source name from the date in a row's label.
const LABEL_SEPARATOR: &str = " | ";

/// Timing and location of a walk.
#[derive(Debug, Clone)]
pub struct WalkerSettings {
    pub listing_url: Url,
    /// Bound on every wait for required page structure.
    pub wait_timeout: Duration,
    /// Pause after activating the next-page control.
    pub page_pause: Duration,
}

impl WalkerSettings {
    /// Settings for a walk starting at `listing_url`.
    ///
    /// # Arguments
    ///
    /// * `listing_url` - First listing page; relative row links resolve against it
    ///
    /// # Returns
    ///
    /// Settings with a 20 second structural wait and a 3 second pause after
    /// each next-page click.
    pub fn new(listing_url: Url) -> Self {
        Self {
            listing_url,
            wait_timeout: Duration::from_secs(20),
            page_pause: Duration::from_secs(3),
        }
    }

    /// Bound on the waits for the listing and article containers.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Pause after the next-page click, before waiting for the listing.
    pub fn with_page_pause(mut self, page_pause: Duration) -> Self {
        self.page_pause = page_pause;
        self
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Termination {
    /// The last page had no next-page control.
    #[default]
    Exhausted,
    /// A document older than the lower date bound was found.
    DateBoundReached {
        link: String,
        published: NaiveDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Documents handed to the sink.
    pub emitted: usize,
    /// Listing pages visited.
    pub pages: usize,
    pub termination: Termination,
}

/// What the listing row tells about an article before it is opened.
#[derive(Debug, Clone)]
struct ListingEntry {
    link: Url,
    published: NaiveDateTime,
}

enum Visit {
    Emitted,
    DateBoundReached(Document),
}

/// Drives a browser session over the listing.
///
/// The walker owns its collaborators for the duration of a run and is the
/// only thing that switches browsing contexts. Between rows the listing is
/// always the active context at index [`PRIMARY_CONTEXT`] and no article
/// context is open.
pub struct ListingWalker<B, R, S> {
    session: B,
    restrictions: R,
    sink: S,
    settings: WalkerSettings,
}

impl<B, R, S> ListingWalker<B, R, S>
where
    B: BrowserSession,
    R: RestrictionChecker,
    S: DocumentSink,
{
    /// Wire a walker from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `session` - Browser positioned anywhere; [`ListingWalker::run`] navigates it
    /// * `restrictions` - Checked once per extracted document
    /// * `sink` - Receives documents that pass the check, in listing order
    /// * `settings` - Listing URL and timing
    pub fn new(session: B, restrictions: R, sink: S, settings: WalkerSettings) -> Self {
        Self {
            session,
            restrictions,
            sink,
            settings,
        }
    }

    pub fn session(&self) -> &B {
        &self.session
    }

    pub fn restrictions(&self) -> &R {
        &self.restrictions
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Give back the collaborators, e.g. to inspect a sink after a run.
    pub fn into_parts(self) -> (B, R, S) {
        (self.session, self.restrictions, self.sink)
    }

    /// Walk the listing until it runs out of pages or crosses the lower date bound.
    ///
    /// # Errors
    ///
    /// - [`Error::StructuralTimeout`] when the listing or an article never renders
    /// - [`Error::Restriction`] for any restriction other than the lower date bound
    /// - [`Error::DateLabel`] / [`Error::Extraction`] for rows that cannot be read
    /// - any browser or sink failure
    #[instrument(level = "info", skip_all, fields(listing = %self.settings.listing_url))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        debug!(url = %self.settings.listing_url, "Entering listing");
        self.session.navigate(self.settings.listing_url.as_str()).await?;
        self.await_structure(LISTING_CONTAINER).await?;

        let mut summary = RunSummary {
            pages: 1,
            ..Default::default()
        };

        loop {
            let rows = self.session.find_elements(ARTICLE_ROW).await?;
            debug!(page = summary.pages, rows = rows.len(), "Listing page rendered");

            for row in &rows {
                let entry = self.read_row(row).await?;
                match self.visit_article(entry).await? {
                    Visit::Emitted => summary.emitted += 1,
                    Visit::DateBoundReached(document) => {
                        info!(
                            link = %document.link,
                            published = %document.published,
                            emitted = summary.emitted,
                            "Lower date bound reached; stopping"
                        );
                        summary.termination = Termination::DateBoundReached {
                            link: document.link,
                            published: document.published,
                        };
                        return Ok(summary);
                    }
                }
            }

            if !self.next_page().await? {
                break;
            }
            summary.pages += 1;
        }

        info!(emitted = summary.emitted, pages = summary.pages, "Listing exhausted");
        Ok(summary)
    }

    async fn await_structure(&self, selector: &str) -> Result<B::Element> {
        let element = self
            .session
            .wait_until_present(selector, self.settings.wait_timeout)
            .await?;
        Ok(element)
    }

    async fn read_row(&self, row: &B::Element) -> Result<ListingEntry> {
        let anchor = self.session.find_element_in(row, ROW_LINK).await?;
        let href = self
            .session
            .attribute(&anchor, "href")
            .await?
            .ok_or_else(|| Error::Extraction {
                link: self.settings.listing_url.to_string(),
                reason: "listing row link has no href".to_string(),
            })?;
        let link = self.settings.listing_url.join(&href)?;

        let label_el = self.session.find_element_in(row, ROW_SOURCE_LABEL).await?;
        let label = self.session.text(&label_el).await?;
        let published = label.split(LABEL_SEPARATOR).nth(1).and_then(parse_date_label);
        let published = published.ok_or(Error::DateLabel { label })?;

        Ok(ListingEntry { link, published })
    }

    /// Open the article in a secondary context and always return to the listing.
    async fn visit_article(&mut self, entry: ListingEntry) -> Result<Visit> {
        let context = self.session.open_context().await?;
        debug!(context, link = %entry.link, "Opened article context");

        let outcome = self.process_article(entry).await;
        let restored = self.return_to_listing().await;

        match (outcome, restored) {
            (Ok(visit), Ok(())) => Ok(visit),
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(cleanup)) => {
                error!(error = %cleanup, "Failed to close article context after error");
                Err(e)
            }
        }
    }

    async fn return_to_listing(&mut self) -> Result<()> {
        self.session.close_current().await?;
        self.session.switch_to(PRIMARY_CONTEXT).await?;
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(link = %entry.link))]
    async fn process_article(&mut self, entry: ListingEntry) -> Result<Visit> {
        self.session.navigate(entry.link.as_str()).await?;
        self.await_structure(ARTICLE_CONTAINER).await?;
        debug!(url = %entry.link, "Entered article");

        let title_el = self.session.find_element(ARTICLE_TITLE).await?;
        let title = self.session.text(&title_el).await?;
        if title.is_empty() {
            return Err(Error::Extraction {
                link: entry.link.to_string(),
                reason: "article title is empty".to_string(),
            });
        }

        let body_el = self.session.find_element(ARTICLE_BODY).await?;
        let text = self.session.text(&body_el).await?;
        let other = self.extract_metadata().await?;
        debug!(
            title = %truncate_for_log(&title, 80),
            bytes = text.len(),
            fields = other.len(),
            "Extracted article"
        );

        let document = Document {
            id: None,
            title,
            abstract_text: None,
            text,
            link: entry.link.to_string(),
            storage: None,
            other,
            published: entry.published,
            loaded: Local::now().naive_local(),
        };

        match self.restrictions.check(&document) {
            Ok(()) => {}
            Err(violation) if violation.kind == RestrictionKind::FromDate => {
                debug!(%violation, "Document is out of date range");
                return Ok(Visit::DateBoundReached(document));
            }
            Err(violation) => return Err(violation.into()),
        }

        self.sink.submit(document).await?;
        Ok(Visit::Emitted)
    }

    /// Read the labelled metadata cells. A field that cannot be read is
    /// logged and left out; only an unusable selector fails the article.
    async fn extract_metadata(&self) -> Result<BTreeMap<MetadataField, String>> {
        let mut other = BTreeMap::new();

        for cell in self.session.find_elements(METADATA_LABELS).await? {
            let label = match self.session.text(&cell).await {
                Ok(label) => label,
                Err(e) => {
                    error!(error = %e, "Failed to read metadata label");
                    continue;
                }
            };
            let Some(field) = MetadataField::from_label(&label) else {
                continue;
            };

            match self.metadata_value(&cell).await {
                Ok(value) => {
                    other.insert(field, value);
                }
                Err(BrowserError::NoSuchElement(_)) => {
                    warn!(field = field.key(), "Metadata label has no value cell; omitting");
                }
                Err(e) => {
                    error!(field = field.key(), error = %e, "Failed to read metadata value; omitting");
                }
            }
        }

        Ok(other)
    }

    async fn metadata_value(&self, label: &B::Element) -> std::result::Result<String, BrowserError> {
        let value = self
            .session
            .following_sibling(label, METADATA_VALUE_TAG)
            .await?;
        self.session.text(&value).await
    }

    /// Move to the next listing page. `false` when there is none.
    async fn next_page(&mut self) -> Result<bool> {
        let next = match self.session.find_element(NEXT_PAGE).await {
            Ok(next) => next,
            Err(BrowserError::NoSuchElement(_)) => {
                debug!("No NEXT button");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        self.session.activate(&next).await?;
        sleep(self.settings.page_pause).await;
        self.await_structure(LISTING_CONTAINER).await?;
        Ok(true)
    }
}
