//! Browser capability consumed by the walker.
//!
//! [`BrowserSession`] is the whole surface the walker needs: navigation,
//! element lookup, bounded waits and a small set of browsing-context
//! operations. Implementations own all session state; the walker only holds
//! opaque element handles.
//!
//! # Implementations
//!
//! | Type | Module | Notes |
//! |------|--------|-------|
//! | [`HttpSession`] | [`http`] | Static rendering with `reqwest` + `scraper` |

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::BrowserError;

pub mod http;

pub use http::{HttpSession, PageFetcher, ReqwestFetcher, StaticPages};

/// Delay between presence checks while waiting for an element.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Index of the first browsing context a session opens with.
pub const PRIMARY_CONTEXT: usize = 0;

/// A browser driven one operation at a time.
///
/// Selectors are CSS selectors. Lookups act on the active browsing context
/// unless they are scoped to an element.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Opaque handle to an element of a loaded page.
    type Element: Clone + fmt::Debug;

    /// Load `url` into the active context.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// First element matching `selector` in the active context.
    async fn find_element(&self, selector: &str) -> Result<Self::Element, BrowserError>;

    /// Every element matching `selector`, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;

    /// First descendant of `parent` matching `selector`.
    async fn find_element_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Self::Element, BrowserError>;

    /// First following sibling of `element` with the given tag name.
    async fn following_sibling(
        &self,
        element: &Self::Element,
        tag: &str,
    ) -> Result<Self::Element, BrowserError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Rendered text of `element`.
    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    /// Script-click `element` (`arguments[0].click()`).
    async fn activate(&mut self, element: &Self::Element) -> Result<(), BrowserError>;

    /// Open a blank browsing context, make it active and return its index.
    async fn open_context(&mut self) -> Result<usize, BrowserError>;

    async fn switch_to(&mut self, index: usize) -> Result<(), BrowserError>;

    /// Close the active context. No context is active afterwards.
    async fn close_current(&mut self) -> Result<(), BrowserError>;

    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Poll until `selector` matches or `timeout` elapses.
    ///
    /// Only [`BrowserError::NoSuchElement`] keeps the wait going; any other
    /// error is returned at once.
    async fn wait_until_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(BrowserError::NoSuchElement(_)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(BrowserError::Timeout {
                            selector: selector.to_string(),
                            timeout,
                        });
                    }
                    trace!(selector, "Element not present yet");
                    sleep(self.poll_interval().min(deadline - now)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
