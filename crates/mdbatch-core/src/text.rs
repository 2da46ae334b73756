//! Small string helpers

/// Loose equality: case, punctuation and whitespace are ignored
pub fn compare_strings(a: &str, b: &str) -> bool {
    loose_key(a) == loose_key(b)
}

fn loose_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Non-empty and made only of ASCII digits
pub fn value_is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Substitute `$parent_title` and `$weight` verbatim
pub fn page_title_from_template(
    template: &str,
    parent_title: &str,
    weight: impl ToString,
) -> String {
    template
        .replace("$parent_title", parent_title)
        .replace("$weight", &weight.to_string())
}
