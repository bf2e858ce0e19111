//! Polling Matchers
//!
//! has-selector / has-no-selector / has-content predicates over a
//! [`FieldDriver`], each a poll loop with a deadline. Predicates return
//! `bool`; the `assert_*` variants turn a miss into `AssertionFailed`.
//!
//! A zero timeout checks exactly once.

use crate::driver::{ElementSnapshot, FieldDriver, Scope};
use crate::result::{FieldError, FieldResult};
use std::time::{Duration, Instant};

/// How a text filter is compared against element text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Normalized text contains the needle
    Contains,
    /// Normalized text equals the needle
    Exact,
}

impl TextMatch {
    fn matches(self, haystack: &str, needle: &str) -> bool {
        let haystack = normalize_whitespace(haystack);
        let needle = normalize_whitespace(needle);
        match self {
            Self::Contains => haystack.contains(&needle),
            Self::Exact => haystack == needle,
        }
    }
}

/// Optional text filter applied to selector matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFilter<'a> {
    /// Text to look for
    pub text: &'a str,
    /// Comparison mode
    pub mode: TextMatch,
}

impl<'a> TextFilter<'a> {
    /// Substring filter
    #[must_use]
    pub const fn contains(text: &'a str) -> Self {
        Self {
            text,
            mode: TextMatch::Contains,
        }
    }

    /// Exact filter
    #[must_use]
    pub const fn exact(text: &'a str) -> Self {
        Self {
            text,
            mode: TextMatch::Exact,
        }
    }

    fn accepts(&self, element: &ElementSnapshot) -> bool {
        self.mode.matches(&element.text, self.text)
    }
}

/// Collapse runs of whitespace and trim
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Poll-based matcher
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    poll_interval: Duration,
}

impl Matcher {
    /// Create a matcher polling at `poll_interval`
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Get the polling interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `check` until it yields true or `timeout` elapses
    pub fn poll<F>(&self, timeout: Duration, mut check: F) -> FieldResult<bool>
    where
        F: FnMut() -> FieldResult<bool>,
    {
        let start = Instant::now();
        loop {
            if check()? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn count_matches<D: FieldDriver + ?Sized>(
        driver: &D,
        scope: &Scope,
        selector: &str,
        text: Option<TextFilter<'_>>,
    ) -> FieldResult<usize> {
        let matches = driver.query(scope, selector)?;
        Ok(match text {
            Some(filter) => matches.iter().filter(|e| filter.accepts(e)).count(),
            None => matches.len(),
        })
    }

    /// Whether `selector` (optionally filtered by text) appears within `timeout`
    pub fn has_selector<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        selector: &str,
        text: Option<TextFilter<'_>>,
        timeout: Duration,
    ) -> FieldResult<bool> {
        self.poll(timeout, || {
            Ok(Self::count_matches(driver, scope, selector, text)? > 0)
        })
    }

    /// Whether `selector` (optionally filtered by text) is gone within `timeout`
    pub fn has_no_selector<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        selector: &str,
        text: Option<TextFilter<'_>>,
        timeout: Duration,
    ) -> FieldResult<bool> {
        self.poll(timeout, || {
            Ok(Self::count_matches(driver, scope, selector, text)? == 0)
        })
    }

    /// Whether the scope's own element contains `text` within `timeout`
    ///
    /// The document root has no own text; use a narrowed scope.
    pub fn has_content<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        text: &str,
        timeout: Duration,
    ) -> FieldResult<bool> {
        let (parent, own) = split_scope(scope)?;
        self.has_selector(
            driver,
            &parent,
            &own,
            Some(TextFilter::contains(text)),
            timeout,
        )
    }

    /// Fail with `message` unless `selector` appears within `timeout`
    pub fn assert_selector<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        selector: &str,
        text: Option<TextFilter<'_>>,
        timeout: Duration,
        message: Option<String>,
    ) -> FieldResult<()> {
        if self.has_selector(driver, scope, selector, text, timeout)? {
            return Ok(());
        }
        Err(FieldError::assertion(message.unwrap_or_else(|| {
            let mut msg = format!(
                "expected to find {} within {}ms",
                scope.describe(selector),
                timeout.as_millis()
            );
            if let Some(filter) = text {
                msg.push_str(&format!(" with text {:?}", filter.text));
            }
            msg
        })))
    }

    /// Fail with `message` unless `selector` is absent within `timeout`
    pub fn assert_no_selector<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        selector: &str,
        timeout: Duration,
        message: Option<String>,
    ) -> FieldResult<()> {
        if self.has_no_selector(driver, scope, selector, None, timeout)? {
            return Ok(());
        }
        Err(FieldError::assertion(message.unwrap_or_else(|| {
            format!(
                "expected not to find {} within {}ms",
                scope.describe(selector),
                timeout.as_millis()
            )
        })))
    }

    /// Fail unless the scope's element contains `text` within `timeout`
    pub fn assert_content<D: FieldDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &Scope,
        text: &str,
        timeout: Duration,
    ) -> FieldResult<()> {
        if self.has_content(driver, scope, text, timeout)? {
            return Ok(());
        }
        let actual = split_scope(scope)
            .and_then(|(parent, own)| driver.find(&parent, &own))
            .map(|e| e.text)
            .unwrap_or_default();
        Err(FieldError::assertion(format!(
            "expected {scope} to contain {text:?}, got {actual:?}"
        )))
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS))
    }
}

fn split_scope(scope: &Scope) -> FieldResult<(Scope, String)> {
    match scope.chain().split_last() {
        Some((own, parents)) => {
            let parent = parents
                .iter()
                .fold(Scope::root(), |acc, segment| acc.within(segment.as_str()));
            Ok((parent, own.clone()))
        }
        None => Err(FieldError::assertion(
            "content assertions need an element scope, not the document root",
        )),
    }
}
