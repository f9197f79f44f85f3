//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Uppercase the first character and turn dashes into spaces.
///
/// Usage in templates: `{{ group.name|capitalize }}`
#[askama::filter_fn]
pub fn capitalize(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(ucfirst(&value.to_string().replace('-', " ")))
}

/// Format a money amount with a currency sign.
///
/// Usage in templates: `{{ product.sale_price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("${value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ucfirst() {
        assert_eq!(ucfirst("managers"), "Managers");
        assert_eq!(ucfirst(""), "");
        assert_eq!(ucfirst("Über"), "Über");
    }

    #[test]
    fn test_ucfirst_after_dash_replacement() {
        assert_eq!(ucfirst(&"no-image".replace('-', " ")), "No image");
    }
}
