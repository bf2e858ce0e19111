//! Chromium driver against a static inline-edit page.
//!
//! Needs a Chromium binary (`CHROMIUM_PATH` or on `PATH`); run with
//! `cargo test --features browser -- --ignored`.

#![cfg(feature = "browser")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use probar_inplace::{
    CdpDriver, FieldDriver, FieldError, Key, LaunchOptions, Matcher, Scope, TextFilter,
    INPUT_SELECTOR, TRIGGER_SELECTOR,
};
use std::time::Duration;
use tempfile::TempDir;

const FIXTURE: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="content">
  <div class="inplace-edit subject -editable">
    <span class="inplace-edit--read-value">Old title</span>
    <form class="subject-form">
      <input class="wp-inline-edit--field" value="Old title">
    </form>
  </div>
  <div class="inplace-edit status -editable">
    <select class="wp-inline-edit--field">
      <option value="1">New</option>
      <option value="2">Closed</option>
    </select>
  </div>
  <p id="log"></p>
</div>
<script>
  const log = (line) => { document.getElementById("log").textContent = line; };
  const form = document.querySelector(".subject-form");
  const input = form.querySelector("input");
  document.querySelector(".subject .inplace-edit--read-value")
    .addEventListener("click", (e) => log("clicked:" + e.isTrusted));
  input.addEventListener("keydown", (e) => {
    if (e.key === "Escape") log("escape:" + e.isTrusted);
  });
  form.addEventListener("submit", (e) => {
    e.preventDefault();
    log("submitted:" + input.value);
  });
  document.querySelector(".status select")
    .addEventListener("change", (e) => log("status:" + e.target.selectedOptions[0].text));
</script>
</body>
</html>
"#;

fn open_fixture() -> (CdpDriver, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inplace.html");
    std::fs::write(&path, FIXTURE).unwrap();
    let mut driver = CdpDriver::launch(LaunchOptions::default().no_sandbox()).unwrap();
    driver.goto(&format!("file://{}", path.display())).unwrap();
    (driver, dir)
}

fn subject() -> Scope {
    Scope::css("#content").within(".inplace-edit.subject")
}

fn status() -> Scope {
    Scope::css("#content").within(".inplace-edit.status")
}

fn assert_log(driver: &CdpDriver, expected: &str) {
    Matcher::new(Duration::from_millis(20))
        .assert_selector(
            driver,
            &Scope::css("#content"),
            "#log",
            Some(TextFilter::exact(expected)),
            Duration::from_secs(5),
            None,
        )
        .unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn query_reports_tag_text_and_value() {
    let (driver, _dir) = open_fixture();

    let trigger = driver.find(&subject(), TRIGGER_SELECTOR).unwrap();
    assert_eq!(trigger.tag_name, "span");
    assert_eq!(trigger.text, "Old title");

    let input = driver.find(&subject(), INPUT_SELECTOR).unwrap();
    assert_eq!(input.tag_name, "input");
    assert_eq!(input.value.as_deref(), Some("Old title"));

    assert!(driver.find(&status(), INPUT_SELECTOR).unwrap().is_select());
    assert!(driver.query(&subject(), ".absent").unwrap().is_empty());

    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn click_is_a_trusted_event() {
    let (mut driver, _dir) = open_fixture();

    driver.click(&subject(), TRIGGER_SELECTOR).unwrap();

    assert_log(&driver, "clicked:true");
    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn fill_then_enter_submits_the_form() {
    let (mut driver, _dir) = open_fixture();

    driver.fill(&subject(), INPUT_SELECTOR, "New title").unwrap();
    assert_eq!(
        driver.find(&subject(), INPUT_SELECTOR).unwrap().value.as_deref(),
        Some("New title")
    );
    driver.send_key(&subject(), INPUT_SELECTOR, Key::Enter).unwrap();

    assert_log(&driver, "submitted:New title");
    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn fill_with_empty_value_clears_the_input() {
    let (mut driver, _dir) = open_fixture();

    driver.fill(&subject(), INPUT_SELECTOR, "").unwrap();

    assert_eq!(
        driver.find(&subject(), INPUT_SELECTOR).unwrap().value.as_deref(),
        Some("")
    );
    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn escape_reaches_the_input() {
    let (mut driver, _dir) = open_fixture();

    driver.send_key(&subject(), INPUT_SELECTOR, Key::Escape).unwrap();

    assert_log(&driver, "escape:true");
    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn select_option_fires_change() {
    let (mut driver, _dir) = open_fixture();

    driver.select_option(&status(), INPUT_SELECTOR, "Closed").unwrap();
    assert_log(&driver, "status:Closed");

    let err = driver
        .select_option(&status(), INPUT_SELECTOR, "Rejected")
        .unwrap_err();
    assert!(err.is_not_found());
    driver.close().unwrap();
}

#[test]
#[ignore = "needs a Chromium binary"]
fn missing_scope_segment_is_not_found() {
    let (mut driver, _dir) = open_fixture();
    let version = Scope::css("#content").within(".inplace-edit.version");

    let err = driver.query(&version, INPUT_SELECTOR).unwrap_err();
    assert!(matches!(
        err,
        FieldError::ElementNotFound { ref selector } if selector == "#content >> .inplace-edit.version"
    ));
    assert!(driver.click(&version, TRIGGER_SELECTOR).unwrap_err().is_not_found());
    assert!(driver
        .send_key(&version, INPUT_SELECTOR, Key::Enter)
        .unwrap_err()
        .is_not_found());
    driver.close().unwrap();
}
