use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[A-Za-z_]*\}").expect("placeholder pattern should parse"));

/// Position of the first header exactly equal to `name`.
///
/// Headers are lowercased when the table is parsed, so `name` is expected to
/// be lowercase already. `None` means the column is absent; callers treat that
/// as a zero contribution.
pub fn resolve_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Fill every `{...}` placeholder in `template` with `label`.
///
/// `"births ({year})"` with `"2023"` becomes `"births (2023)"`.
pub fn expand_template(template: &str, label: &str) -> String {
    PLACEHOLDER
        .replace_all(template, regex::NoExpand(label))
        .into_owned()
}

/// Resolve the column produced by `template` for `label`.
pub fn resolve_template(headers: &[String], template: &str, label: &str) -> Option<usize> {
    resolve_column(headers, &expand_template(template, label))
}
