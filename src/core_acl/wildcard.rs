use regex::{Regex, RegexBuilder};

/// Compiles a `*`/`?` wildcard pattern into an anchored regex.
pub fn compile_wildcard(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() * 2 + 2);
    expr.push('^');
    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            _ => expr.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .ok()
}

/// Whether `text` matches the wildcard `pattern` as a whole.
pub fn wildcard_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    compile_wildcard(pattern, case_insensitive)
        .map(|regex| regex.is_match(text))
        .unwrap_or(false)
}
