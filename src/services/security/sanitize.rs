/// Best-effort cleanup of a free-text value.
///
/// Removes SQL comment delimiters, collapses doubled quotes and trims.
/// NOT a substitute for parameterized queries; values still go through `bind`.
pub fn sanitize(input: &str) -> String {
    let mut out = input.to_string();
    for token in ["--", "/*", "*/", "#"] {
        out = out.replace(token, "");
    }
    out = out.replace("''", "'").replace("\"\"", "\"");
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn strips_comment_delimiters() {
        assert_eq!(sanitize(" admin'-- "), "admin'");
        assert_eq!(sanitize("a/*x*/b#"), "axb");
    }

    #[test]
    fn collapses_doubled_quotes() {
        assert_eq!(sanitize("it''s \"\"ok\"\""), "it's \"ok\"");
    }

    #[test]
    fn plain_values_unchanged() {
        assert_eq!(sanitize("alice"), "alice");
    }
}
