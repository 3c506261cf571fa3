//! HTML entity escaping for stored confession text, and the inverse used for display.

/// Escapes `& < > " ' / ( )` into HTML entities.
///
/// Walking the input once is equivalent to replacing `&` first and the rest
/// afterwards, so nothing is ever double-escaped.
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            '/' => output.push_str("&#x2F;"),
            '(' => output.push_str("&#40;"),
            ')' => output.push_str("&#41;"),
            _ => output.push(c),
        }
    }
    output
}

/// Reverses [`sanitize`]. `&amp;` is undone last so `&amp;lt;` decodes to `&lt;`.
pub fn decode(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&#40;", "(")
        .replace("&#41;", ")")
        .replace("&amp;", "&")
}
