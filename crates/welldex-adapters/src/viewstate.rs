//! ASP.NET WebForms scraping helpers (spec.md §4.2): extract the hidden
//! postback fields from a landing page so they can be replayed as a form
//! POST, and carry the session cookie across requests.

use std::sync::LazyLock;

use regex::Regex;

static VIEWSTATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id="__VIEWSTATE"[^>]*value="([^"]*)""#).expect("valid regex")
});
static VIEWSTATE_GENERATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id="__VIEWSTATEGENERATOR"[^>]*value="([^"]*)""#).expect("valid regex")
});
static EVENT_VALIDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id="__EVENTVALIDATION"[^>]*value="([^"]*)""#).expect("valid regex")
});

/// The hidden postback fields every ASP.NET WebForms page carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStateFields {
    pub viewstate: String,
    pub viewstate_generator: String,
    pub event_validation: String,
}

/// Extract `__VIEWSTATE`, `__VIEWSTATEGENERATOR`, and `__EVENTVALIDATION`
/// from a WebForms landing page. Missing fields are left empty — some
/// pages omit `__EVENTVALIDATION` when validation is disabled.
pub fn extract_viewstate(html: &str) -> ViewStateFields {
    ViewStateFields {
        viewstate: capture(&VIEWSTATE_RE, html),
        viewstate_generator: capture(&VIEWSTATE_GENERATOR_RE, html),
        event_validation: capture(&EVENT_VALIDATION_RE, html),
    }
}

fn capture(re: &Regex, html: &str) -> String {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Build the form body for the postback, merging the scraped hidden fields
/// with the caller's query parameters.
pub fn build_postback_form<'a>(
    fields: &'a ViewStateFields,
    query_params: &'a [(&'a str, &'a str)],
) -> Vec<(&'a str, &'a str)> {
    let mut form = vec![
        ("__VIEWSTATE", fields.viewstate.as_str()),
        ("__VIEWSTATEGENERATOR", fields.viewstate_generator.as_str()),
        ("__EVENTVALIDATION", fields.event_validation.as_str()),
    ];
    form.extend_from_slice(query_params);
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="abc123" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="DEF456" />
        <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="ghi789" />
    "#;

    #[test]
    fn extracts_all_three_fields() {
        let fields = extract_viewstate(SAMPLE);
        assert_eq!(fields.viewstate, "abc123");
        assert_eq!(fields.viewstate_generator, "DEF456");
        assert_eq!(fields.event_validation, "ghi789");
    }

    #[test]
    fn missing_fields_are_empty_not_panicking() {
        let fields = extract_viewstate("<html><body>no postback fields here</body></html>");
        assert_eq!(fields, ViewStateFields::default());
    }

    #[test]
    fn postback_form_merges_query_params() {
        let fields = extract_viewstate(SAMPLE);
        let form = build_postback_form(&fields, &[("County", "Andrews")]);
        assert!(form.contains(&("__VIEWSTATE", "abc123")));
        assert!(form.contains(&("County", "Andrews")));
    }
}
