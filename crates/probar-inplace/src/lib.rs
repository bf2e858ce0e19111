//! Probar Inplace: page objects for inline-editable fields
//!
//! Browser-driven end-to-end tests of the work package views interact with
//! one widget over and over: the inline-edit field that toggles between a
//! read-only value and an editor in place. [`InplaceField`] wraps that widget
//! behind a typed API that opens the editor, sets values, submits or cancels,
//! and asserts on the widget's state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Test       │    │ Inplace    │    │ FieldDriver        │    │
//! │   │ (Rust)     │───►│ Field      │───►│  CdpDriver (CDP)   │    │
//! │   │            │    │ + Matcher  │    │  MockPage (memory) │    │
//! │   └────────────┘    └────────────┘    └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Opening an editor is asynchronous in the browser, so activation and
//! update run under a bounded retry ([`attempt`]) that only re-tries
//! activation races and surfaces everything else immediately.

#![warn(missing_docs)]

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod cdp;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod config;
mod driver;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod field;
mod markup;
#[allow(clippy::missing_errors_doc)]
mod matcher;
mod result;
mod retry;

/// Mock page for testing page objects without a browser
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;

#[cfg(feature = "browser")]
pub use cdp::{CdpDriver, LaunchOptions, CHROMIUM_PATH_ENV};
pub use config::{
    FieldConfig, RenderMode, RetryPolicy, DEFAULT_ACTIVATION_WAIT_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SAVE_CONTROL_TIMEOUT_MS, DEFAULT_STATE_TIMEOUT_MS,
    RENDER_MODE_ENV,
};
pub use driver::{ElementSnapshot, FieldDriver, Key, Scope};
pub use field::{InplaceField, UpdateOptions};
pub use markup::{
    default_locator, page_ready_selector, FieldKind, SubmitStrategy, EDITABLE_MARKER,
    ERRORS_SELECTOR, ERRORS_TEXT_SELECTOR, ERROR_MARKER, INPUT_SELECTOR, PAGE_READY_MARKERS,
    SAVE_CONTROL_SELECTOR, SELECT_PROPERTIES, SUBMIT_OVERRIDES, TRIGGER_SELECTOR, WIDGET_CLASS,
};
pub use matcher::{normalize_whitespace, Matcher, TextFilter, TextMatch};
pub use mock::{MockField, MockPage, Validator};
pub use result::{FieldError, FieldResult};
pub use retry::{attempt, Attempted};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        FieldConfig, FieldDriver, FieldError, FieldKind, FieldResult, InplaceField, Key,
        MockField, MockPage, RenderMode, RetryPolicy, Scope, UpdateOptions,
    };
}
