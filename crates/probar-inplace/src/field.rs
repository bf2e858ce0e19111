//! Inline Field Page Object
//!
//! [`InplaceField`] wraps one inline-editable widget of the work package
//! views: it opens the editor, sets a value, submits or cancels, and asserts
//! on the widget's state.
//!
//! ```text
//!            activate()                 submit() / cancel()
//!   Closed ─────────────► Open ─────────────────────────► Closed
//!                          │
//!                          │ invalid submit
//!                          ▼
//!                      Open + Error
//! ```
//!
//! Transitions are driven by the application under test; the page object
//! only observes and asserts.
//!
//! # Example
//!
//! ```
//! use probar_inplace::{FieldConfig, InplaceField, MockField, MockPage, Scope};
//!
//! let mut page = MockPage::new().with_field(MockField::new("subject", "Old title"));
//! let mut field = InplaceField::new(&mut page, Scope::root(), "subject", FieldConfig::default())?;
//! field.update("New title")?;
//! field.assert_state_text("New title")?;
//! # Ok::<(), probar_inplace::FieldError>(())
//! ```

use crate::config::FieldConfig;
use crate::driver::{ElementSnapshot, FieldDriver, Key, Scope};
use crate::markup::{self, FieldKind, SubmitStrategy};
use crate::matcher::{Matcher, TextFilter};
use crate::result::{FieldError, FieldResult};
use crate::retry::attempt;
use std::cell::OnceCell;
use std::time::Duration;

/// Options for [`InplaceField::update_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Submit the value after setting it
    pub save: bool,
    /// Expect the editor to stay open (validation failure)
    pub expect_failure: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            save: true,
            expect_failure: false,
        }
    }
}

impl UpdateOptions {
    /// Default options: save, expect success
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to submit
    #[must_use]
    pub const fn save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Expect the submission to be rejected
    #[must_use]
    pub const fn expect_failure(mut self, expect_failure: bool) -> Self {
        self.expect_failure = expect_failure;
        self
    }
}

/// Page object for one inline-editable field
///
/// Borrows the browser session for its lifetime; it owns no browser
/// resources and is meant to be created per test step.
#[derive(Debug)]
pub struct InplaceField<'d, D: FieldDriver> {
    driver: &'d mut D,
    context: Scope,
    property_name: String,
    locator: String,
    kind: OnceCell<FieldKind>,
    config: FieldConfig,
    matcher: Matcher,
}

impl<'d, D: FieldDriver> InplaceField<'d, D> {
    /// Create a handle for `property_name` using the default locator.
    ///
    /// Blocks until the page has booted when rendering with JavaScript.
    pub fn new(
        driver: &'d mut D,
        context: Scope,
        property_name: impl Into<String>,
        config: FieldConfig,
    ) -> FieldResult<Self> {
        let property_name = property_name.into();
        let locator = markup::default_locator(&property_name);
        Self::with_locator(driver, context, property_name, locator, config)
    }

    /// Create a handle with an explicit root locator
    pub fn with_locator(
        driver: &'d mut D,
        context: Scope,
        property_name: impl Into<String>,
        locator: impl Into<String>,
        config: FieldConfig,
    ) -> FieldResult<Self> {
        config.validate()?;
        let field = Self {
            driver,
            context,
            property_name: property_name.into(),
            locator: locator.into(),
            kind: OnceCell::new(),
            matcher: Matcher::new(config.poll_interval()),
            config,
        };
        field.ensure_page_loaded()?;
        Ok(field)
    }

    /// Logical property name
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Root selector within the context
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Lookup context
    #[must_use]
    pub const fn context(&self) -> &Scope {
        &self.context
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Underlying driver
    pub fn driver(&mut self) -> &mut D {
        &mut *self.driver
    }

    /// Editor kind, classified on first use
    pub fn kind(&self) -> FieldKind {
        *self
            .kind
            .get_or_init(|| FieldKind::classify(&self.property_name))
    }

    /// How this field commits its value
    #[must_use]
    pub fn submit_strategy(&self) -> SubmitStrategy {
        SubmitStrategy::for_property(&self.property_name)
    }

    fn root(&self) -> Scope {
        self.context.within(self.locator.as_str())
    }

    fn describe(&self) -> String {
        format!(
            "WP field input type '{}' for attribute '{}'",
            self.kind(),
            self.property_name
        )
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The widget's root element
    pub fn locate(&self) -> FieldResult<ElementSnapshot> {
        self.driver.find(&self.context, &self.locator)
    }

    /// The read-only element whose click opens the editor
    pub fn trigger(&self) -> FieldResult<ElementSnapshot> {
        self.driver.find(&self.root(), markup::TRIGGER_SELECTOR)
    }

    /// The editor's input element
    pub fn input(&self) -> FieldResult<ElementSnapshot> {
        self.driver.find(&self.root(), markup::INPUT_SELECTOR)
    }

    /// Text of the widget's error message
    pub fn error_text(&self) -> FieldResult<String> {
        Ok(self
            .driver
            .find(&self.root(), markup::ERRORS_TEXT_SELECTOR)?
            .text)
    }

    /// The widget's error container
    pub fn error_element(&self) -> FieldResult<ElementSnapshot> {
        self.driver.find(&self.root(), markup::ERRORS_SELECTOR)
    }

    // =========================================================================
    // Observations
    // =========================================================================

    /// Whether the editor is currently open
    pub fn is_active(&self) -> FieldResult<bool> {
        Ok(!self
            .driver
            .query(&self.root(), self.kind().selector())?
            .is_empty())
    }

    /// Whether the widget carries the editable marker; absence is `false`
    pub fn is_editable(&self) -> FieldResult<bool> {
        let selector = format!("{}{}", self.locator, markup::EDITABLE_MARKER);
        match self.driver.find(&self.context, &selector) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether the input element can be located; absence is `false`
    pub fn is_editing(&self) -> FieldResult<bool> {
        match self.input() {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Assert the editor opens within the configured state timeout
    pub fn assert_active(&self) -> FieldResult<()> {
        self.assert_active_within(self.config.state_timeout())
    }

    /// Assert the editor opens within `timeout`
    pub fn assert_active_within(&self, timeout: Duration) -> FieldResult<()> {
        self.matcher.assert_selector(
            &*self.driver,
            &self.root(),
            self.kind().selector(),
            None,
            timeout,
            Some(format!("Expected {}.", self.describe())),
        )
    }

    /// Assert the editor closes within the configured state timeout
    pub fn assert_inactive(&self) -> FieldResult<()> {
        self.assert_inactive_within(self.config.state_timeout())
    }

    /// Assert the editor closes within `timeout`
    pub fn assert_inactive_within(&self, timeout: Duration) -> FieldResult<()> {
        self.matcher.assert_no_selector(
            &*self.driver,
            &self.root(),
            self.kind().selector(),
            timeout,
            Some(format!("Expected no {}.", self.describe())),
        )
    }

    /// Assert open (`true`) or closed (`false`)
    pub fn assert_state(&self, open: bool) -> FieldResult<()> {
        if open {
            self.assert_active()
        } else {
            self.assert_inactive()
        }
    }

    /// Assert the trigger displays exactly `text`
    pub fn assert_state_text(&self, text: &str) -> FieldResult<()> {
        self.matcher.assert_selector(
            &*self.driver,
            &self.root(),
            markup::TRIGGER_SELECTOR,
            Some(TextFilter::exact(text)),
            self.config.state_timeout(),
            None,
        )
    }

    /// Assert the widget's text contains `text`
    pub fn assert_text(&self, text: &str) -> FieldResult<()> {
        self.matcher.assert_content(
            &*self.driver,
            &self.root(),
            text,
            self.config.state_timeout(),
        )
    }

    /// Assert the input's current value equals `value`
    pub fn assert_value(&self, value: &str) -> FieldResult<()> {
        let actual = self.input()?.value.unwrap_or_default();
        if actual == value {
            Ok(())
        } else {
            Err(FieldError::assertion(format!(
                "expected {} value {value:?}, got {actual:?}",
                self.property_name
            )))
        }
    }

    /// Assert the input fails client-side validation
    pub fn assert_invalid(&self) -> FieldResult<()> {
        let selector = format!("{}:invalid", markup::INPUT_SELECTOR);
        self.matcher.assert_selector(
            &*self.driver,
            &self.root(),
            &selector,
            None,
            self.config.state_timeout(),
            None,
        )
    }

    /// Assert the page shows this widget in its error state
    pub fn assert_error(&self) -> FieldResult<()> {
        let selector = format!("{}{}", self.locator, markup::ERROR_MARKER);
        self.matcher.assert_selector(
            &*self.driver,
            &Scope::root(),
            &selector,
            None,
            self.config.state_timeout(),
            None,
        )
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Click the trigger once, without checking the editor opened
    pub fn activate_edition(&mut self) -> FieldResult<()> {
        let root = self.root();
        tracing::debug!(property = %self.property_name, "click trigger");
        self.driver.click(&root, markup::TRIGGER_SELECTOR)
    }

    fn open_editor(&mut self) -> FieldResult<()> {
        self.activate_edition()?;
        let opened = self.matcher.has_selector(
            &*self.driver,
            &self.root(),
            self.kind().selector(),
            None,
            self.config.activation_wait(),
        )?;
        if opened {
            Ok(())
        } else {
            Err(FieldError::activation(format!("Expected {}.", self.describe())))
        }
    }

    /// Open the editor, retrying when the click does not take
    pub fn activate(&mut self) -> FieldResult<()> {
        let policy = self.config.retry;
        attempt(&policy, "activate", |_| self.open_editor())?;
        Ok(())
    }

    /// Select the option labelled `content`, or type `content` into the input
    pub fn set_value(&mut self, content: &str) -> FieldResult<()> {
        let root = self.root();
        tracing::debug!(property = %self.property_name, value = content, "set value");
        if self.input()?.is_select() {
            self.driver
                .select_option(&root, markup::INPUT_SELECTOR, content)
        } else {
            self.driver.fill(&root, markup::INPUT_SELECTOR, content)
        }
    }

    /// Set `value` and save it, expecting the editor to close
    pub fn update(&mut self, value: &str) -> FieldResult<()> {
        self.update_with(value, UpdateOptions::default())
    }

    /// Open, set, optionally submit, and check the final state.
    ///
    /// The whole cycle is retried: a save reloads the view, which can leave
    /// the next editor failing to open.
    pub fn update_with(&mut self, value: &str, options: UpdateOptions) -> FieldResult<()> {
        let policy = self.config.retry;
        attempt(&policy, "update", |_| {
            self.open_editor()?;
            self.set_value(value)?;
            if options.save && !self.kind().commits_on_change() {
                self.submit()?;
            }
            self.assert_state(options.expect_failure)
                .map_err(|err| match err {
                    FieldError::AssertionFailed { message } => {
                        FieldError::ActivationFailed { message }
                    }
                    other => other,
                })
        })?;
        Ok(())
    }

    /// Commit the current edit
    pub fn submit(&mut self) -> FieldResult<()> {
        match self.submit_strategy() {
            SubmitStrategy::SaveControl => self.submit_by_save_control(),
            SubmitStrategy::ConfirmKey => self.submit_by_enter(),
        }
    }

    /// Click the widget's save control once it appears
    pub fn submit_by_save_control(&mut self) -> FieldResult<()> {
        let root = self.root();
        self.matcher.assert_selector(
            &*self.driver,
            &root,
            markup::SAVE_CONTROL_SELECTOR,
            None,
            self.config.save_control_timeout(),
            Some(format!(
                "Expected save control for attribute '{}'.",
                self.property_name
            )),
        )?;
        tracing::debug!(property = %self.property_name, "click save control");
        self.driver.click(&root, markup::SAVE_CONTROL_SELECTOR)
    }

    /// Send the confirm key to the input
    pub fn submit_by_enter(&mut self) -> FieldResult<()> {
        let root = self.root();
        tracing::debug!(property = %self.property_name, "submit by enter");
        self.driver.send_key(&root, markup::INPUT_SELECTOR, Key::Enter)
    }

    /// Former click-to-submit control; the widget no longer renders one
    #[deprecated(note = "use `submit_by_enter`")]
    pub fn submit_by_click(&mut self) -> FieldResult<()> {
        tracing::warn!("submit_by_click is no longer available, submitting by enter");
        self.submit_by_enter()
    }

    /// Discard the current edit
    pub fn cancel(&mut self) -> FieldResult<()> {
        let root = self.root();
        tracing::debug!(property = %self.property_name, "cancel by escape");
        self.driver
            .send_key(&root, markup::INPUT_SELECTOR, Key::Escape)
    }

    /// Former click-to-cancel control; the widget no longer renders one
    #[deprecated(note = "use `cancel`")]
    pub fn cancel_by_click(&mut self) -> FieldResult<()> {
        tracing::warn!("cancel_by_click is no longer available, cancelling by escape");
        self.cancel()
    }

    /// Wait for client-side initialization when rendering with JavaScript
    pub fn ensure_page_loaded(&self) -> FieldResult<()> {
        if !self.config.render_mode.needs_page_ready() {
            return Ok(());
        }
        let timeout = self.config.state_timeout();
        let ready = self.matcher.has_selector(
            &*self.driver,
            &Scope::root(),
            &markup::page_ready_selector(),
            None,
            timeout,
        )?;
        if ready {
            Ok(())
        } else {
            Err(FieldError::Timeout {
                ms: timeout.as_millis() as u64,
            })
        }
    }
}
