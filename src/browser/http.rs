//! Static browser session backed by `reqwest` and `scraper`.
//!
//! Pages are fetched once per navigation and parsed into a [`Html`] tree;
//! nothing executes scripts. That is enough for listing sites whose markup is
//! server-rendered and whose pagination control is a plain anchor.
//!
//! Each browsing context holds at most one loaded page. Every navigation gets
//! a fresh page id, and element handles remember the page they came from, so
//! a handle outliving its page reports [`BrowserError::StaleElement`] instead
//! of silently pointing into the new document.

use std::collections::HashMap;
use std::time::Duration;

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::{BrowserSession, DEFAULT_POLL_INTERVAL};
use crate::error::BrowserError;

static ANY_ELEMENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("universal selector parses"));

/// Elements that start a new line in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Source of raw page markup.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, BrowserError>;
}

/// Fetches pages over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher around a fresh `reqwest` client.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value sent in the `User-Agent` header
    /// * `timeout` - Bound on each request, connect through body
    ///
    /// # Returns
    ///
    /// The fetcher, or [`Error::Http`](crate::Error::Http) when the client cannot be built (for
    /// example a user agent that is not a valid header value).
    pub fn new(user_agent: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for ReqwestFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, BrowserError> {
        let navigation = |e: reqwest::Error| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(navigation)?;
        let body = response.text().await.map_err(navigation)?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Serves pages from memory, keyed by absolute URL.
///
/// Useful for replaying saved pages without touching the network.
#[derive(Debug, Clone, Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StaticPages::insert`].
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    /// Serve `html` for `url`, replacing any page already stored there.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL in its parsed form (as [`Url::as_str`] prints it)
    /// * `html` - Markup returned on fetch
    pub fn insert(&mut self, url: &str, html: impl Into<String>) {
        self.pages.insert(url.to_string(), html.into());
    }
}

impl PageFetcher for StaticPages {
    async fn fetch(&self, url: &Url) -> Result<String, BrowserError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: "page not found".to_string(),
            })
    }
}

/// Handle to an element of a page loaded in an [`HttpSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    page: u64,
    /// Position among all elements of the page, in document order.
    ordinal: usize,
}

struct Page {
    id: u64,
    url: Url,
    html: Html,
}

#[derive(Default)]
struct Context {
    page: Option<Page>,
}

/// A [`BrowserSession`] that renders pages statically.
pub struct HttpSession<F> {
    fetcher: F,
    contexts: Vec<Context>,
    active: Option<usize>,
    next_page_id: u64,
    poll_interval: Duration,
}

impl<F: PageFetcher> HttpSession<F> {
    /// A session with one blank, active context.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Where page markup comes from on every navigation
    ///
    /// # Returns
    ///
    /// A session whose context [`PRIMARY_CONTEXT`](super::PRIMARY_CONTEXT) is active and empty. Lookups
    /// fail with [`BrowserError::NoSuchElement`] until something is loaded.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            contexts: vec![Context::default()],
            active: Some(0),
            next_page_id: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the delay between presence checks in
    /// [`BrowserSession::wait_until_present`].
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Open browsing contexts, the primary one included.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Index of the active context. `None` right after [`BrowserSession::close_current`].
    pub fn active_context(&self) -> Option<usize> {
        self.active
    }

    /// URL of the page loaded in the active context.
    pub fn current_url(&self) -> Option<&Url> {
        self.active
            .and_then(|i| self.contexts.get(i))
            .and_then(|c| c.page.as_ref())
            .map(|p| &p.url)
    }

    fn active_index(&self) -> Result<usize, BrowserError> {
        self.active.ok_or(BrowserError::NoActiveContext)
    }

    fn active_page(&self, selector: &str) -> Result<&Page, BrowserError> {
        let index = self.active_index()?;
        self.contexts[index]
            .page
            .as_ref()
            .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))
    }

    fn page_of(&self, handle: &NodeHandle) -> Result<&Page, BrowserError> {
        self.contexts
            .iter()
            .filter_map(|c| c.page.as_ref())
            .find(|p| p.id == handle.page)
            .ok_or(BrowserError::StaleElement)
    }

    fn resolve<'a>(&'a self, handle: &NodeHandle) -> Result<(&'a Page, ElementRef<'a>), BrowserError> {
        let page = self.page_of(handle)?;
        let element = page
            .html
            .select(&ANY_ELEMENT)
            .nth(handle.ordinal)
            .ok_or(BrowserError::StaleElement)?;
        Ok((page, element))
    }

    /// Matches in document order, optionally restricted to descendants of `scope`.
    fn matching(
        page: &Page,
        selector: &str,
        scope: Option<ElementRef<'_>>,
    ) -> Result<Vec<NodeHandle>, BrowserError> {
        let selector = parse_selector(selector)?;
        Ok(page
            .html
            .select(&ANY_ELEMENT)
            .enumerate()
            .filter(|(_, el)| selector.matches(el))
            .filter(|(_, el)| match scope {
                Some(parent) => el.ancestors().any(|a| a.id() == parent.id()),
                None => true,
            })
            .map(|(ordinal, _)| NodeHandle {
                page: page.id,
                ordinal,
            })
            .collect())
    }
}

impl<F: PageFetcher> BrowserSession for HttpSession<F> {
    type Element = NodeHandle;

    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let index = self.active_index()?;
        let parsed = Url::parse(url).map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let body = self.fetcher.fetch(&parsed).await?;
        let id = self.next_page_id;
        self.next_page_id += 1;
        self.contexts[index].page = Some(Page {
            id,
            url: parsed,
            html: Html::parse_document(&body),
        });
        debug!(context = index, page = id, "Loaded page");
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<NodeHandle, BrowserError> {
        let page = self.active_page(selector)?;
        Self::matching(page, selector, None)?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<NodeHandle>, BrowserError> {
        match self.active_page(selector) {
            Ok(page) => Self::matching(page, selector, None),
            Err(BrowserError::NoSuchElement(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn find_element_in(
        &self,
        parent: &NodeHandle,
        selector: &str,
    ) -> Result<NodeHandle, BrowserError> {
        let (page, scope) = self.resolve(parent)?;
        Self::matching(page, selector, Some(scope))?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))
    }

    async fn following_sibling(
        &self,
        element: &NodeHandle,
        tag: &str,
    ) -> Result<NodeHandle, BrowserError> {
        let (page, el) = self.resolve(element)?;
        let sibling = el
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|s| s.value().name().eq_ignore_ascii_case(tag))
            .ok_or_else(|| BrowserError::NoSuchElement(format!("following-sibling::{tag}")))?;

        let ordinal = page
            .html
            .select(&ANY_ELEMENT)
            .position(|candidate| candidate.id() == sibling.id())
            .ok_or(BrowserError::StaleElement)?;
        Ok(NodeHandle {
            page: page.id,
            ordinal,
        })
    }

    async fn attribute(
        &self,
        element: &NodeHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let (_, el) = self.resolve(element)?;
        Ok(el.value().attr(name).map(str::to_string))
    }

    async fn text(&self, element: &NodeHandle) -> Result<String, BrowserError> {
        let (_, el) = self.resolve(element)?;
        Ok(render_text(el))
    }

    async fn activate(&mut self, element: &NodeHandle) -> Result<(), BrowserError> {
        let active = self.active_index()?;
        let target = {
            let (page, el) = self.resolve(element)?;
            let in_active = self.contexts[active]
                .page
                .as_ref()
                .is_some_and(|p| p.id == page.id);
            if !in_active {
                return Err(BrowserError::StaleElement);
            }
            let href = el
                .value()
                .attr("href")
                .filter(|_| el.value().name() == "a")
                .ok_or_else(|| {
                    BrowserError::Unsupported(format!(
                        "click on <{}> without an href",
                        el.value().name()
                    ))
                })?;
            page.url.join(href).map_err(|e| BrowserError::Navigation {
                url: href.to_string(),
                reason: e.to_string(),
            })?
        };

        debug!(%target, "Following activated link");
        self.navigate(target.as_str()).await
    }

    async fn open_context(&mut self) -> Result<usize, BrowserError> {
        self.contexts.push(Context::default());
        let index = self.contexts.len() - 1;
        self.active = Some(index);
        debug!(context = index, "Opened browsing context");
        Ok(index)
    }

    async fn switch_to(&mut self, index: usize) -> Result<(), BrowserError> {
        if index >= self.contexts.len() {
            return Err(BrowserError::NoSuchContext(index));
        }
        self.active = Some(index);
        Ok(())
    }

    async fn close_current(&mut self) -> Result<(), BrowserError> {
        let index = self.active.take().ok_or(BrowserError::NoActiveContext)?;
        self.contexts.remove(index);
        debug!(context = index, remaining = self.contexts.len(), "Closed browsing context");
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Approximate a browser's rendered text: block elements break lines,
/// runs of whitespace collapse, blank lines and script bodies are dropped.
fn render_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|p| p.value().as_element())
                    .is_some_and(|p| matches!(p.name(), "script" | "style" | "noscript"));
                if !hidden {
                    raw.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => raw.push('\n'),
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().join(" "))
        .filter(|line| !line.is_empty())
        .join("\n")
}
