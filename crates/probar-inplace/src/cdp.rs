//! Chromium driver over the DevTools protocol.
//!
//! `CdpDriver` implements the blocking [`FieldDriver`] on top of
//! chromiumoxide. It owns a Tokio runtime and blocks on every call, so page
//! objects stay synchronous.
//!
//! Queries and option selection are one script evaluated in the page: resolve
//! the scope chain, run the body, and report back a tagged JSON outcome.
//! Clicks and keyboard input go through CDP input events on the
//! resolved element, so the page receives trusted events and runs its
//! default actions (implicit form submission on Enter).

use crate::driver::{ElementSnapshot, FieldDriver, Key, Scope};
use crate::result::{FieldError, FieldResult};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Environment variable pointing at a Chromium executable
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Options for launching Chromium
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Executable override
    pub chromium_path: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: std::env::var(CHROMIUM_PATH_ENV).ok(),
        }
    }
}

impl LaunchOptions {
    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable the sandbox (containers, CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the executable path
    #[must_use]
    pub fn chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }
}

/// Outcome reported by the in-page script
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ScriptOutcome<T> {
    Ok { data: T },
    Missing { selector: String },
    Error { message: String },
}

/// Blocking Chromium page
#[derive(Debug)]
pub struct CdpDriver {
    runtime: tokio::runtime::Runtime,
    browser: CdpBrowser,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

impl CdpDriver {
    /// Launch Chromium and open a blank page
    pub fn launch(options: LaunchOptions) -> FieldResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let mut builder = CdpConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(FieldError::driver)?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| FieldError::driver(format!("failed to launch browser: {e}")))?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| FieldError::driver(e.to_string()))?;
            Ok::<_, FieldError>((browser, page, handler))
        })?;

        tracing::debug!(headless = options.headless, "chromium launched");
        Ok(Self {
            runtime,
            browser,
            page,
            handler,
        })
    }

    /// Navigate to `url`
    pub fn goto(&mut self, url: &str) -> FieldResult<()> {
        tracing::debug!(url, "navigate");
        self.runtime.block_on(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| FieldError::driver(format!("navigation to {url} failed: {e}")))
        })?;
        Ok(())
    }

    /// Close the browser
    pub fn close(mut self) -> FieldResult<()> {
        self.runtime.block_on(async {
            self.browser
                .close()
                .await
                .map_err(|e| FieldError::driver(e.to_string()))
        })?;
        self.handler.abort();
        Ok(())
    }

    fn run<T: DeserializeOwned>(&self, scope: &Scope, selector: &str, body: &str) -> FieldResult<T> {
        let script = build_script(scope, selector, body)?;
        let value: serde_json::Value = self.runtime.block_on(async {
            self.page
                .evaluate(script.as_str())
                .await
                .map_err(|e| FieldError::driver(e.to_string()))?
                .into_value()
                .map_err(|e| FieldError::driver(e.to_string()))
        })?;
        match serde_json::from_value::<ScriptOutcome<T>>(value)? {
            ScriptOutcome::Ok { data } => Ok(data),
            ScriptOutcome::Missing { selector } => Err(FieldError::not_found(selector)),
            ScriptOutcome::Error { message } => Err(FieldError::driver(message)),
        }
    }

    /// Fail with `ElementNotFound` unless `selector` has a match in `scope`
    fn ensure_present(&self, scope: &Scope, selector: &str) -> FieldResult<()> {
        self.run::<Option<()>>(scope, selector, PRESENT_BODY)?;
        Ok(())
    }
}

/// First match of `selector` within the scope chain, as a CDP element
async fn locate(page: &CdpPage, scope: &Scope, selector: &str) -> Result<Element, CdpError> {
    let mut chain = scope.chain().iter();
    let Some(first) = chain.next() else {
        return page.find_element(selector).await;
    };
    let mut element = page.find_element(first.as_str()).await?;
    for segment in chain {
        element = element.find_element(segment.as_str()).await?;
    }
    element.find_element(selector).await
}

/// Wrap `body` in a script that resolves `scope`, binds the matches of
/// `selector` to `els` and `first`, and reports missing segments.
fn build_script(scope: &Scope, selector: &str, body: &str) -> FieldResult<String> {
    let chain = serde_json::to_string(scope.chain())?;
    let described = serde_json::to_string(&scope.describe(selector))?;
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        r#"(() => {{
  try {{
    let root = document;
    const walked = [];
    for (const segment of {chain}) {{
      walked.push(segment);
      root = root.querySelector(segment);
      if (!root) return {{ status: "missing", selector: walked.join(" >> ") }};
    }}
    const els = Array.from(root.querySelectorAll({selector}));
    const first = els[0];
    const missing = {{ status: "missing", selector: {described} }};
    {body}
  }} catch (e) {{
    return {{ status: "error", message: String(e) }};
  }}
}})()"#
    ))
}

const QUERY_BODY: &str = r#"return { status: "ok", data: els.map(el => ({
      tag_name: el.tagName.toLowerCase(),
      text: (el.innerText ?? el.textContent ?? "").replace(/\s+/g, " ").trim(),
      value: typeof el.value === "string" ? el.value : null,
    })) };"#;

const PRESENT_BODY: &str = r#"if (!first) return missing;
    return { status: "ok", data: null };"#;

const CLEAR_INPUT: &str = "function() { this.focus(); this.select(); }";

impl FieldDriver for CdpDriver {
    fn query(&self, scope: &Scope, selector: &str) -> FieldResult<Vec<ElementSnapshot>> {
        self.run(scope, selector, QUERY_BODY)
    }

    fn click(&mut self, scope: &Scope, selector: &str) -> FieldResult<()> {
        self.ensure_present(scope, selector)?;
        self.runtime
            .block_on(async {
                locate(&self.page, scope, selector).await?.click().await?;
                Ok::<_, CdpError>(())
            })
            .map_err(|e| {
                FieldError::driver(format!("click on {} failed: {e}", scope.describe(selector)))
            })
    }

    fn fill(&mut self, scope: &Scope, selector: &str, value: &str) -> FieldResult<()> {
        self.ensure_present(scope, selector)?;
        self.runtime
            .block_on(async {
                let element = locate(&self.page, scope, selector).await?;
                element.call_js_fn(CLEAR_INPUT, false).await?;
                element.press_key("Backspace").await?;
                element.type_str(value).await?;
                Ok::<_, CdpError>(())
            })
            .map_err(|e| {
                FieldError::driver(format!("typing into {} failed: {e}", scope.describe(selector)))
            })
    }

    fn select_option(
        &mut self,
        scope: &Scope,
        selector: &str,
        option_text: &str,
    ) -> FieldResult<()> {
        let text = serde_json::to_string(option_text)?;
        let body = format!(
            r#"if (!first) return missing;
    const option = Array.from(first.options || [])
      .find(o => o.text.replace(/\s+/g, " ").trim() === {text});
    if (!option) return {{ status: "missing", selector: {described_option} }};
    option.selected = true;
    first.value = option.value;
    first.dispatchEvent(new Event("change", {{ bubbles: true }}));
    return {{ status: "ok", data: null }};"#,
            described_option = serde_json::to_string(&format!(
                "{} option {option_text:?}",
                scope.describe(selector)
            ))?,
        );
        self.run::<Option<()>>(scope, selector, &body)?;
        Ok(())
    }

    fn send_key(&mut self, scope: &Scope, selector: &str, key: Key) -> FieldResult<()> {
        self.ensure_present(scope, selector)?;
        self.runtime
            .block_on(async {
                locate(&self.page, scope, selector)
                    .await?
                    .focus()
                    .await?
                    .press_key(key.dom_key())
                    .await?;
                Ok::<_, CdpError>(())
            })
            .map_err(|e| {
                FieldError::driver(format!(
                    "pressing {} on {} failed: {e}",
                    key.dom_key(),
                    scope.describe(selector)
                ))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_script_embeds_chain_and_selector() {
        let scope = Scope::css("#content").within(".inplace-edit.subject");
        let script = build_script(&scope, ".wp-inline-edit--field", PRESENT_BODY).unwrap();
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
        assert!(script.contains(r##"["#content",".inplace-edit.subject"]"##));
        assert!(script.contains(r#"querySelectorAll(".wp-inline-edit--field")"#));
        assert!(script.contains("#content >> .inplace-edit.subject >> .wp-inline-edit--field"));
    }

    #[test]
    fn test_script_escapes_quotes() {
        let script = build_script(&Scope::root(), r#"a[title="x"]"#, QUERY_BODY).unwrap();
        assert!(script.contains(r#""a[title=\"x\"]""#));
    }

    #[test]
    fn test_outcome_decoding() {
        let ok: ScriptOutcome<Vec<ElementSnapshot>> = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "data": [{ "tag_name": "select", "text": "New Closed", "value": "New" }]
        }))
        .unwrap();
        assert!(matches!(ok, ScriptOutcome::Ok { ref data } if data[0].is_select()));

        let missing: ScriptOutcome<Option<()>> = serde_json::from_value(serde_json::json!({
            "status": "missing", "selector": ".inplace-edit.subject"
        }))
        .unwrap();
        assert!(matches!(missing, ScriptOutcome::Missing { .. }));
    }

    #[test]
    fn test_launch_options_builder() {
        let options = LaunchOptions::default()
            .headless(false)
            .no_sandbox()
            .chromium_path("/usr/bin/chromium");
        assert!(!options.headless);
        assert!(!options.sandbox);
        assert_eq!(options.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }
}
