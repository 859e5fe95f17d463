//! Custom pixel code generator.
//!
//! Produces the JavaScript a merchant pastes into Shopify's Customer Events
//! settings as a custom pixel. Output is a pure function of the inputs.
//!
//! The tracking ID is written as an escaped JavaScript string literal (see
//! [`js_string_literal`]), never spliced in raw.

use crate::types::{EventSelection, TrackedEvent, TrackingId};

/// Shown in place of the loader until a tracking ID is saved.
pub const PLACEHOLDER_COMMENT: &str = "// ... more code will appear here after setting Clarity ID";

/// Standard event the default snippet subscribes to.
pub const DEFAULT_EVENT: &str = "checkout_completed";

/// Base URL of the Clarity tag script.
pub const CLARITY_TAG_URL: &str = "https://www.clarity.ms/tag/";

/// Generate the single-event pixel snippet.
///
/// Subscribes to `checkout_completed`. The handler builds a `<script>`
/// element, fills it with the Clarity loader (or [`PLACEHOLDER_COMMENT`]
/// when no tracking ID is set), and appends it to `document.head`.
///
/// ```
/// use clarity_pixel_core::{TrackingId, snippet};
///
/// let id = TrackingId::parse("abc123").unwrap();
/// let code = snippet::generate(Some(&id));
/// assert!(code.contains(r#""script", "abc123")"#));
/// assert!(snippet::generate(None).contains(snippet::PLACEHOLDER_COMMENT));
/// ```
#[must_use]
pub fn generate(tracking_id: Option<&TrackingId>) -> String {
    let inline = tracking_id.map_or_else(
        || PLACEHOLDER_COMMENT.to_string(),
        |id| {
            format!(
                "clarityScript.innerHTML = `\n{}  `;",
                template_literal_text(&clarity_loader(id, "    "))
            )
        },
    );

    format!(
        "analytics.subscribe({event}, async (event) => {{\n  \
         const clarityScript = document.createElement(\"script\");\n  \
         clarityScript.async = true;\n  \
         clarityScript.type = \"text/javascript\";\n  \
         {inline}\n  \
         document.head.appendChild(clarityScript);\n\
         }});",
        event = js_string_literal(DEFAULT_EVENT),
    )
}

/// Generate a snippet with one subscription per selected event.
///
/// The loader is wrapped in an idempotent `loadClarity` helper and each
/// handler tags the session with the event's key via `clarity("event", ..)`.
#[must_use]
pub fn generate_for_events(tracking_id: Option<&TrackingId>, events: &EventSelection) -> String {
    let loader = tracking_id.map_or_else(
        || format!("  {PLACEHOLDER_COMMENT}\n"),
        |id| clarity_loader(id, "  "),
    );

    let mut out = format!(
        "const loadClarity = () => {{\n  if (window.clarity) {{\n    return;\n  }}\n{loader}}};\n"
    );

    let mut any = false;
    for event in events.tracked() {
        any = true;
        out.push('\n');
        out.push_str(&event_subscription(event));
    }

    if !any {
        out.push_str("\n// No events selected.\n");
    }

    out
}

fn event_subscription(event: TrackedEvent) -> String {
    format!(
        "analytics.subscribe({shopify_event}, async (event) => {{\n  \
         loadClarity();\n  \
         if (window.clarity) {{\n    \
         window.clarity(\"event\", {key});\n  \
         }}\n\
         }});\n",
        shopify_event = js_string_literal(event.shopify_event()),
        key = js_string_literal(event.key()),
    )
}

/// The standard Clarity bootstrap, indented by `indent`.
fn clarity_loader(tracking_id: &TrackingId, indent: &str) -> String {
    let lines = [
        "(function(c,l,a,r,i,t,y){".to_string(),
        "    c[a]=c[a]||function(){(c[a].q=c[a].q||[]).push(arguments)};".to_string(),
        format!("    t=l.createElement(r);t.async=1;t.src={}+i;", js_string_literal(CLARITY_TAG_URL)),
        "    y=l.getElementsByTagName(r)[0];y.parentNode.insertBefore(t,y);".to_string(),
        format!(
            "}})(window, document, \"clarity\", \"script\", {});",
            js_string_literal(tracking_id.as_str())
        ),
    ];

    lines
        .iter()
        .map(|line| format!("{indent}{line}\n"))
        .collect()
}

/// Escape `value` for the body of a template literal.
fn template_literal_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Encode `value` as a double-quoted JavaScript string literal.
///
/// JSON string encoding plus escapes for characters that are significant to
/// HTML parsers and template literals, so the result is safe inside a
/// `<script>` element, a template literal, or plain code.
#[must_use]
pub fn js_string_literal(value: &str) -> String {
    let json = serde_json::Value::String(value.to_owned()).to_string();

    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\'' => out.push_str("\\u0027"),
            '`' => out.push_str("\\u0060"),
            '$' => out.push_str("\\u0024"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tracking_id(s: &str) -> TrackingId {
        TrackingId::parse(s).unwrap()
    }

    #[test]
    fn test_generate_with_tracking_id() {
        let code = generate(Some(&tracking_id("abc123")));

        assert!(code.starts_with("analytics.subscribe(\"checkout_completed\", async (event) => {\n"));
        assert!(code.ends_with("});"));
        assert_eq!(code.matches(r#""script", "abc123");"#).count(), 1);
        assert_eq!(code.matches("abc123").count(), 1);
        assert!(code.contains(r#"t.src="https://www.clarity.ms/tag/"+i;"#));
        assert!(!code.contains(PLACEHOLDER_COMMENT));
    }

    #[test]
    fn test_generate_exact_output() {
        let expected = r#"analytics.subscribe("checkout_completed", async (event) => {
  const clarityScript = document.createElement("script");
  clarityScript.async = true;
  clarityScript.type = "text/javascript";
  clarityScript.innerHTML = `
    (function(c,l,a,r,i,t,y){
        c[a]=c[a]||function(){(c[a].q=c[a].q||[]).push(arguments)};
        t=l.createElement(r);t.async=1;t.src="https://www.clarity.ms/tag/"+i;
        y=l.getElementsByTagName(r)[0];y.parentNode.insertBefore(t,y);
    })(window, document, "clarity", "script", "k2x9");
  `;
  document.head.appendChild(clarityScript);
});"#;

        assert_eq!(generate(Some(&tracking_id("k2x9"))), expected);
    }

    #[test]
    fn test_generate_without_tracking_id() {
        let code = generate(None);

        assert_eq!(
            code,
            format!(
                r#"analytics.subscribe("checkout_completed", async (event) => {{
  const clarityScript = document.createElement("script");
  clarityScript.async = true;
  clarityScript.type = "text/javascript";
  {PLACEHOLDER_COMMENT}
  document.head.appendChild(clarityScript);
}});"#
            )
        );
        assert!(!code.contains("clarity.ms"));
        assert!(!code.contains("function(c,l,a,r,i,t,y)"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let id = tracking_id("abc123");
        assert_eq!(generate(Some(&id)), generate(Some(&id)));
        assert_eq!(generate(None), generate(None));
    }

    #[test]
    fn test_generate_for_events_subscribes_selected_only() {
        let mut events = EventSelection::none();
        events.set(TrackedEvent::ViewItem, true);
        events.set(TrackedEvent::Purchase, true);

        let code = generate_for_events(Some(&tracking_id("abc123")), &events);

        assert_eq!(code.matches("analytics.subscribe(").count(), 2);
        assert!(code.contains("analytics.subscribe(\"product_viewed\""));
        assert!(code.contains("analytics.subscribe(\"checkout_completed\""));
        assert!(code.contains("window.clarity(\"event\", \"viewItem\");"));
        assert!(!code.contains("search_submitted"));
        assert_eq!(code.matches("abc123").count(), 1);
    }

    #[test]
    fn test_generate_for_events_without_tracking_id() {
        let code = generate_for_events(None, &EventSelection::all());

        assert!(code.contains(PLACEHOLDER_COMMENT));
        assert!(!code.contains("clarity.ms"));
        assert_eq!(code.matches("analytics.subscribe(").count(), 6);
    }

    #[test]
    fn test_generate_for_events_with_nothing_selected() {
        let code = generate_for_events(Some(&tracking_id("abc")), &EventSelection::none());
        assert!(!code.contains("analytics.subscribe("));
        assert!(code.contains("// No events selected."));
    }

    #[test]
    fn test_template_literal_text_escapes() {
        assert_eq!(template_literal_text("plain"), "plain");
        assert_eq!(template_literal_text("a`b"), r"a\`b");
        assert_eq!(template_literal_text("${x}"), r"\${x}");
        assert_eq!(template_literal_text(r#""a\"b""#), r#""a\\"b""#);
    }

    #[test]
    fn test_js_string_literal_escapes() {
        assert_eq!(js_string_literal("abc"), "\"abc\"");
        assert_eq!(js_string_literal("a\"b"), r#""a\"b""#);
        assert_eq!(js_string_literal("</script>"), r#""\u003c/script\u003e""#);
        assert_eq!(js_string_literal("`${x}`"), r#""\u0060\u0024{x}\u0060""#);
        assert_eq!(js_string_literal("it's"), r#""it\u0027s""#);
        assert_eq!(js_string_literal("a&b"), r#""a\u0026b""#);
        assert_eq!(js_string_literal("a\u{2028}b"), r#""a\u2028b""#);
        assert_eq!(js_string_literal("line\nbreak"), r#""line\nbreak""#);
    }
}
