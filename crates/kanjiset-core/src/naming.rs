/// Characters that may not appear in a dataset or file basename.
pub const INVALID_FILENAME_CHARS: &str = "`~!@#$%^&*,<>?'\":;|\\/";

fn is_replaced(c: char) -> bool {
    INVALID_FILENAME_CHARS.contains(c) || "(){}[]".contains(c) || c.is_whitespace()
}

/// Collapse every run of invalid filename characters, brackets and
/// whitespace into one `_`, then trim leading/trailing underscores.
pub fn normalize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if is_replaced(c) {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// First character of `name` that is not allowed in a basename.
pub fn first_invalid_char(name: &str) -> Option<char> {
    name.chars().find(|c| INVALID_FILENAME_CHARS.contains(*c))
}
