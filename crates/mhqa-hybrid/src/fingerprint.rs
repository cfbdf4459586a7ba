/// Lowercase, collapse runs of whitespace and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// BLAKE3 hex digest of the normalized document text.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(normalize_text(text).as_bytes()).to_hex().to_string()
}
