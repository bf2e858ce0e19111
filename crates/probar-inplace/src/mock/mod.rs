//! Mock page for testing inline field page objects without a browser.
//!
//! `MockPage` simulates the application's inline-edit widgets: it keeps the
//! state of each field (closed/open, draft, validation error), renders that
//! state into the same markup the real application produces, and answers
//! [`FieldDriver`] calls through a small CSS engine. Page objects therefore
//! run their real selectors against it.
//!
//! Flakiness can be injected: a field can swallow its first N trigger clicks
//! and the page can take N queries to boot.

mod dom;

use crate::driver::{ElementSnapshot, FieldDriver, Key, Scope};
use crate::markup::{self, FieldKind, SubmitStrategy};
use crate::result::{FieldError, FieldResult};
use dom::{Document, Node, NodeRole};
use std::cell::Cell;
use std::fmt;

/// Validation hook: `Err(message)` rejects the submitted draft
pub type Validator = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// One simulated inline-edit widget
pub struct MockField {
    property: String,
    kind: FieldKind,
    value: String,
    options: Vec<String>,
    editable: bool,
    validator: Option<Validator>,
    dropped_clicks: u32,
    open: bool,
    draft: String,
    error: Option<String>,
}

impl fmt::Debug for MockField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockField")
            .field("property", &self.property)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("open", &self.open)
            .field("draft", &self.draft)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl MockField {
    /// Create an editable, closed field showing `value`
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            kind: FieldKind::classify(&property),
            property,
            value: value.into(),
            options: Vec::new(),
            editable: true,
            validator: None,
            dropped_clicks: 0,
            open: false,
            draft: String::new(),
            error: None,
        }
    }

    /// Options offered by a select editor
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Reject submissions for which `validator` returns an error
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Render without the editable marker; trigger clicks do nothing
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Ignore the next `count` trigger clicks
    #[must_use]
    pub const fn dropping_clicks(mut self, count: u32) -> Self {
        self.dropped_clicks = count;
        self
    }

    /// Committed value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the editor is open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Current validation error
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn open_editor(&mut self) {
        self.open = true;
        self.draft = self.value.clone();
        self.error = None;
    }

    fn close_editor(&mut self) {
        self.open = false;
        self.draft.clear();
        self.error = None;
    }

    fn commit(&mut self) {
        let verdict = self
            .validator
            .as_ref()
            .map_or(Ok(()), |validate| validate(&self.draft));
        match verdict {
            Ok(()) => {
                self.value = std::mem::take(&mut self.draft);
                self.close_editor();
            }
            Err(message) => self.error = Some(message),
        }
    }

    fn render(&self, index: usize, doc: &mut Document, parent: usize) {
        let mut classes = format!("{}.{}", markup::WIDGET_CLASS, self.property);
        if self.editable {
            classes.push_str(markup::EDITABLE_MARKER);
        }
        if self.error.is_some() {
            classes.push_str(markup::ERROR_MARKER);
        }
        let root = doc.append(parent, Node::new("div").class(&classes));

        if self.open {
            let input_class = class_of(markup::INPUT_SELECTOR);
            match self.kind {
                FieldKind::Select => {
                    let select = doc.append(
                        root,
                        Node::new("select")
                            .class(input_class)
                            .value(&self.draft)
                            .role(NodeRole::Input(index)),
                    );
                    for option in &self.options {
                        doc.append(select, Node::new("option").text(option).value(option));
                    }
                }
                FieldKind::Input => {
                    doc.append(
                        root,
                        Node::new("input")
                            .class(input_class)
                            .value(&self.draft)
                            .invalid(self.error.is_some())
                            .role(NodeRole::Input(index)),
                    );
                }
            }
            if SubmitStrategy::for_property(&self.property) == SubmitStrategy::SaveControl {
                let controls = doc.append(root, Node::new("div").class("inplace-edit--control--save"));
                doc.append(
                    controls,
                    Node::new("a").text("Save").role(NodeRole::SaveControl(index)),
                );
            }
        } else {
            doc.append(
                root,
                Node::new("span")
                    .class(class_of(markup::TRIGGER_SELECTOR))
                    .text(&self.value)
                    .role(NodeRole::Trigger(index)),
            );
        }

        if let Some(ref message) = self.error {
            let errors = doc.append(root, Node::new("div").class(class_of(markup::ERRORS_SELECTOR)));
            doc.append(
                errors,
                Node::new("span")
                    .class(class_of(markup::ERRORS_TEXT_SELECTOR))
                    .text(message),
            );
        }
    }
}

fn class_of(selector: &str) -> &str {
    selector.trim_start_matches('.')
}

/// In-memory page hosting inline-edit widgets
#[derive(Debug)]
pub struct MockPage {
    fields: Vec<MockField>,
    boot_queries: Cell<u32>,
    call_history: Vec<String>,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    /// Create an empty, fully booted page
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            boot_queries: Cell::new(0),
            call_history: Vec::new(),
        }
    }

    /// Add a widget
    #[must_use]
    pub fn with_field(mut self, field: MockField) -> Self {
        self.fields.push(field);
        self
    }

    /// Hide the page-ready marker for the next `queries` queries
    #[must_use]
    pub fn booting_for(self, queries: u32) -> Self {
        self.boot_queries.set(queries);
        self
    }

    /// Look up a widget by property name
    #[must_use]
    pub fn field(&self, property: &str) -> Option<&MockField> {
        self.fields.iter().find(|f| f.property == property)
    }

    /// Actions performed so far, e.g. `click:.inplace-edit--read-value`
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if an action was performed
    #[must_use]
    pub fn was_called(&self, action: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(action))
    }

    fn booted(&self) -> bool {
        self.boot_queries.get() == 0
    }

    fn render(&self) -> Document {
        let mut doc = Document::new();
        let page = doc.append(Document::ROOT, Node::new("div").id("content"));
        if self.booted() {
            doc.append(
                page,
                Node::new("h2").class("work-packages--details--title"),
            );
        }
        for (index, field) in self.fields.iter().enumerate() {
            field.render(index, &mut doc, page);
        }
        doc
    }

    fn target(&self, scope: &Scope, selector: &str) -> FieldResult<Option<NodeRole>> {
        let doc = self.render();
        let index = doc.first(scope, selector)?;
        Ok(doc.node(index).role)
    }

    fn record(&mut self, action: &str, scope: &Scope, selector: &str) {
        self.call_history
            .push(format!("{action}:{}", scope.describe(selector)));
    }
}

impl FieldDriver for MockPage {
    fn query(&self, scope: &Scope, selector: &str) -> FieldResult<Vec<ElementSnapshot>> {
        let doc = self.render();
        let remaining = self.boot_queries.get();
        if remaining > 0 {
            self.boot_queries.set(remaining - 1);
        }
        let within = doc.resolve(scope)?;
        Ok(doc
            .select_all(within, selector)?
            .into_iter()
            .map(|i| doc.snapshot(i))
            .collect())
    }

    fn click(&mut self, scope: &Scope, selector: &str) -> FieldResult<()> {
        let role = self.target(scope, selector)?;
        self.record("click", scope, selector);
        match role {
            Some(NodeRole::Trigger(i)) => {
                let field = &mut self.fields[i];
                if !field.editable {
                    return Ok(());
                }
                if field.dropped_clicks > 0 {
                    field.dropped_clicks -= 1;
                    tracing::debug!(property = %field.property, "mock dropped trigger click");
                } else {
                    field.open_editor();
                }
            }
            Some(NodeRole::SaveControl(i)) => self.fields[i].commit(),
            Some(NodeRole::Input(_)) | None => {}
        }
        Ok(())
    }

    fn fill(&mut self, scope: &Scope, selector: &str, value: &str) -> FieldResult<()> {
        let role = self.target(scope, selector)?;
        self.record("fill", scope, selector);
        match role {
            Some(NodeRole::Input(i)) if self.fields[i].kind == FieldKind::Input => {
                self.fields[i].draft = value.to_string();
                Ok(())
            }
            _ => Err(FieldError::driver(format!(
                "{} is not a text input",
                scope.describe(selector)
            ))),
        }
    }

    fn select_option(
        &mut self,
        scope: &Scope,
        selector: &str,
        option_text: &str,
    ) -> FieldResult<()> {
        let role = self.target(scope, selector)?;
        self.record("select", scope, selector);
        let Some(NodeRole::Input(i)) = role else {
            return Err(FieldError::driver(format!(
                "{} is not a select",
                scope.describe(selector)
            )));
        };
        let field = &mut self.fields[i];
        if field.kind != FieldKind::Select {
            return Err(FieldError::driver(format!(
                "{} is not a select",
                scope.describe(selector)
            )));
        }
        if !field.options.iter().any(|o| o == option_text) {
            return Err(FieldError::not_found(format!(
                "{} option {option_text:?}",
                scope.describe(selector)
            )));
        }
        field.draft = option_text.to_string();
        field.commit();
        Ok(())
    }

    fn send_key(&mut self, scope: &Scope, selector: &str, key: Key) -> FieldResult<()> {
        let role = self.target(scope, selector)?;
        self.record(&format!("key:{}", key.dom_key()), scope, selector);
        if let Some(NodeRole::Input(i)) = role {
            let field = &mut self.fields[i];
            match key {
                Key::Enter
                    if SubmitStrategy::for_property(&field.property)
                        == SubmitStrategy::ConfirmKey =>
                {
                    field.commit();
                }
                Key::Enter => {}
                Key::Escape => field.close_editor(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn subject_scope() -> Scope {
        Scope::css(".inplace-edit.subject")
    }

    #[test]
    fn test_closed_field_renders_trigger() {
        let page = MockPage::new().with_field(MockField::new("subject", "Old title"));
        let trigger = page
            .find(&subject_scope(), markup::TRIGGER_SELECTOR)
            .unwrap();
        assert_eq!(trigger.text, "Old title");
        assert!(page
            .query(&subject_scope(), markup::INPUT_SELECTOR)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_click_opens_and_enter_commits() {
        let mut page = MockPage::new().with_field(MockField::new("subject", "Old"));
        page.click(&subject_scope(), markup::TRIGGER_SELECTOR).unwrap();
        assert!(page.field("subject").unwrap().is_open());
        page.fill(&subject_scope(), markup::INPUT_SELECTOR, "New").unwrap();
        page.send_key(&subject_scope(), markup::INPUT_SELECTOR, Key::Enter)
            .unwrap();
        let field = page.field("subject").unwrap();
        assert!(!field.is_open());
        assert_eq!(field.value(), "New");
        assert!(page.was_called("key:Enter"));
    }

    #[test]
    fn test_dropped_clicks() {
        let mut page =
            MockPage::new().with_field(MockField::new("subject", "Old").dropping_clicks(1));
        page.click(&subject_scope(), markup::TRIGGER_SELECTOR).unwrap();
        assert!(!page.field("subject").unwrap().is_open());
        page.click(&subject_scope(), markup::TRIGGER_SELECTOR).unwrap();
        assert!(page.field("subject").unwrap().is_open());
    }

    #[test]
    fn test_validation_error_keeps_editor_open() {
        let mut page = MockPage::new().with_field(
            MockField::new("subject", "Old").with_validator(|v| {
                if v.is_empty() {
                    Err("Subject can't be blank.".to_string())
                } else {
                    Ok(())
                }
            }),
        );
        page.click(&subject_scope(), markup::TRIGGER_SELECTOR).unwrap();
        page.fill(&subject_scope(), markup::INPUT_SELECTOR, "").unwrap();
        page.send_key(&subject_scope(), markup::INPUT_SELECTOR, Key::Enter)
            .unwrap();
        assert!(page.field("subject").unwrap().is_open());
        let text = page
            .find(&subject_scope(), markup::ERRORS_TEXT_SELECTOR)
            .unwrap();
        assert_eq!(text.text, "Subject can't be blank.");
        assert_eq!(
            page.query(&Scope::root(), ".inplace-edit.subject.-error")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_select_commits_on_change() {
        let mut page = MockPage::new()
            .with_field(MockField::new("status", "New").with_options(["New", "Closed"]));
        let scope = Scope::css(".inplace-edit.status");
        page.click(&scope, markup::TRIGGER_SELECTOR).unwrap();
        let input = page.find(&scope, markup::INPUT_SELECTOR).unwrap();
        assert!(input.is_select());
        page.select_option(&scope, markup::INPUT_SELECTOR, "Closed")
            .unwrap();
        assert_eq!(page.field("status").unwrap().value(), "Closed");
        assert!(!page.field("status").unwrap().is_open());
    }

    #[test]
    fn test_unknown_option_is_not_found() {
        let mut page = MockPage::new()
            .with_field(MockField::new("status", "New").with_options(["New"]));
        let scope = Scope::css(".inplace-edit.status");
        page.click(&scope, markup::TRIGGER_SELECTOR).unwrap();
        let err = page
            .select_option(&scope, markup::INPUT_SELECTOR, "Rejected")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_description_ignores_enter() {
        let mut page = MockPage::new().with_field(MockField::new("description", "Old"));
        let scope = Scope::css(".inplace-edit.description");
        page.click(&scope, markup::TRIGGER_SELECTOR).unwrap();
        page.fill(&scope, markup::INPUT_SELECTOR, "New").unwrap();
        page.send_key(&scope, markup::INPUT_SELECTOR, Key::Enter).unwrap();
        assert!(page.field("description").unwrap().is_open());
        page.click(&scope, markup::SAVE_CONTROL_SELECTOR).unwrap();
        assert_eq!(page.field("description").unwrap().value(), "New");
    }

    #[test]
    fn test_booting_hides_marker() {
        let page = MockPage::new().booting_for(2);
        let ready = markup::page_ready_selector();
        assert!(page.query(&Scope::root(), &ready).unwrap().is_empty());
        assert!(page.query(&Scope::root(), &ready).unwrap().is_empty());
        assert_eq!(page.query(&Scope::root(), &ready).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_scope_is_not_found() {
        let page = MockPage::new();
        let err = page
            .query(&subject_scope(), markup::INPUT_SELECTOR)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
