/// Normalize a raw column header into a record key.
///
/// Trims, lowercases, drops every whitespace character and strips `(` / `)`.
/// Total and idempotent: `normalize_header(normalize_header(x)) == normalize_header(x)`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .collect()
}
