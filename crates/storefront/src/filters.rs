//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an item count, e.g. `1 item`, `3 items`.
///
/// Usage in templates: `{{ cart.item_count|item_count }}`
#[askama::filter_fn]
pub fn item_count(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_item_count(&count.to_string()))
}

fn format_item_count(count: &str) -> String {
    if count == "1" {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}
