//! FieldDriver - Blocking Browser Collaborator
//!
//! The page object never talks to a browser directly. It goes through
//! `FieldDriver`, which allows swapping a real Chromium page (`CdpDriver`,
//! feature `browser`) for the in-memory `MockPage` in unit tests.
//!
//! Lookups are expressed as a [`Scope`] plus a CSS selector. A scope is a
//! chain of selectors: each segment resolves to the first match inside the
//! previous one, starting at the document.

use crate::result::{FieldError, FieldResult};
use serde::{Deserialize, Serialize};

/// A region of the page, as a chain of CSS selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    chain: Vec<String>,
}

impl Scope {
    /// The whole document
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A scope rooted at the first match of `selector` in the document
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::root().within(selector)
    }

    /// Narrow to the first match of `selector` inside this scope
    #[must_use]
    pub fn within(&self, selector: impl Into<String>) -> Self {
        let mut chain = self.chain.clone();
        chain.push(selector.into());
        Self { chain }
    }

    /// Selector segments, outermost first
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Whether this is the document root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.chain.is_empty()
    }

    /// Human-readable path of `selector` within this scope
    #[must_use]
    pub fn describe(&self, selector: &str) -> String {
        if self.chain.is_empty() {
            selector.to_string()
        } else {
            format!("{} >> {selector}", self.chain.join(" >> "))
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.chain.is_empty() {
            write!(f, ":root")
        } else {
            write!(f, "{}", self.chain.join(" >> "))
        }
    }
}

/// Point-in-time view of a matched element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Lowercase tag name
    pub tag_name: String,
    /// Rendered text, whitespace-normalized
    pub text: String,
    /// Form value for inputs and selects
    pub value: Option<String>,
}

impl ElementSnapshot {
    /// Create a new snapshot
    #[must_use]
    pub fn new(tag_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            text: text.into(),
            value: None,
        }
    }

    /// Attach a form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Whether the element is a selection control
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("select")
    }
}

/// Key signals sent to a focused input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Confirm the edit
    Enter,
    /// Discard the edit
    Escape,
}

impl Key {
    /// DOM `KeyboardEvent.key` value
    #[must_use]
    pub const fn dom_key(&self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Escape => "Escape",
        }
    }
}

/// Blocking browser automation used by page objects
///
/// Queries return every match of `selector` and never fail when it matches
/// nothing; a missing scope segment is `ElementNotFound`. Actions operate on
/// the first match and return `ElementNotFound` when there is none.
pub trait FieldDriver {
    /// All matches of `selector` within `scope`
    fn query(&self, scope: &Scope, selector: &str) -> FieldResult<Vec<ElementSnapshot>>;

    /// Click the first match
    fn click(&mut self, scope: &Scope, selector: &str) -> FieldResult<()>;

    /// Replace the value of the first matching input
    fn fill(&mut self, scope: &Scope, selector: &str, value: &str) -> FieldResult<()>;

    /// Choose the option whose visible text equals `option_text`
    fn select_option(&mut self, scope: &Scope, selector: &str, option_text: &str)
        -> FieldResult<()>;

    /// Send a key signal to the first match
    fn send_key(&mut self, scope: &Scope, selector: &str, key: Key) -> FieldResult<()>;

    /// First match, or `ElementNotFound`
    fn find(&self, scope: &Scope, selector: &str) -> FieldResult<ElementSnapshot> {
        self.query(scope, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| FieldError::not_found(scope.describe(selector)))
    }
}
