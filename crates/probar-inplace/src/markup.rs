//! Markup conventions of the inline-edit widget.
//!
//! The class names below are rendered by the application under test. They
//! are the contract between the page object and the live markup, so any
//! change here must follow a change in the application.

use serde::{Deserialize, Serialize};

/// Class shared by every inline-edit widget root
pub const WIDGET_CLASS: &str = "inplace-edit";

/// Read-only element whose click opens the editor
pub const TRIGGER_SELECTOR: &str = ".inplace-edit--read-value";

/// The editor's input element
pub const INPUT_SELECTOR: &str = ".wp-inline-edit--field";

/// Save control rendered by fields that submit through a button
pub const SAVE_CONTROL_SELECTOR: &str = ".inplace-edit--control--save > a";

/// Error container
pub const ERRORS_SELECTOR: &str = ".inplace-edit--errors";

/// Error message text
pub const ERRORS_TEXT_SELECTOR: &str = ".inplace-edit--errors--text";

/// Modifier class on a widget root the current user may edit
pub const EDITABLE_MARKER: &str = ".-editable";

/// Modifier class on a widget root showing a validation error
pub const ERROR_MARKER: &str = ".-error";

/// Any of these appearing means the client-side application finished booting
pub const PAGE_READY_MARKERS: &[&str] = &[
    "#work-packages-list-view-button.-active",
    ".work-packages--details--title",
    ".work-package-details-activities-activity-contents",
    "#work-packages--edit-actions-save",
];

/// Properties edited through a selection control
pub const SELECT_PROPERTIES: &[&str] = &[
    "assignee",
    "responsible",
    "priority",
    "project",
    "status",
    "type",
    "version",
    "category",
];

/// Properties that do not submit through the confirm key
pub const SUBMIT_OVERRIDES: &[(&str, SubmitStrategy)] =
    &[("description", SubmitStrategy::SaveControl)];

/// Default root selector for a property
#[must_use]
pub fn default_locator(property_name: &str) -> String {
    format!(".{WIDGET_CLASS}.{property_name}")
}

/// Page-ready markers joined into one selector list
#[must_use]
pub fn page_ready_selector() -> String {
    PAGE_READY_MARKERS.join(", ")
}

/// Kind of editor a field opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A choice list; commits on change
    Select,
    /// Free text
    Input,
}

impl FieldKind {
    /// Classify a property name
    #[must_use]
    pub fn classify(property_name: &str) -> Self {
        if SELECT_PROPERTIES.contains(&property_name) {
            Self::Select
        } else {
            Self::Input
        }
    }

    /// Element selector present inside the widget while the editor is open
    #[must_use]
    pub const fn selector(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Input => "input",
        }
    }

    /// Whether choosing a value commits it without an explicit submit
    #[must_use]
    pub const fn commits_on_change(&self) -> bool {
        matches!(self, Self::Select)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.selector())
    }
}

/// How an open editor commits its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStrategy {
    /// Send the confirm key to the input
    ConfirmKey,
    /// Click the widget's save control
    SaveControl,
}

impl SubmitStrategy {
    /// Look up the strategy for a property
    #[must_use]
    pub fn for_property(property_name: &str) -> Self {
        SUBMIT_OVERRIDES
            .iter()
            .find(|(name, _)| *name == property_name)
            .map_or(Self::ConfirmKey, |(_, strategy)| *strategy)
    }
}
