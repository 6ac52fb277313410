//! Text helpers for outgoing messages.

/// Splits a reply into fixed-size sequential chunks.
///
/// Chunks are measured in characters and split on char boundaries, so
/// multi-byte text never panics. Order is preserved; an empty input yields
/// no chunks.
///
/// # Examples
///
/// ```
/// use batuto_bot::utils::chunk_reply;
/// let parts = chunk_reply(&"x".repeat(9500), 4000);
/// assert_eq!(parts.len(), 3);
/// assert_eq!(parts[2].len(), 1500);
/// ```
#[must_use]
pub fn chunk_reply(text: &str, chunk_size: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == chunk_size {
            parts.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// # Examples
///
/// ```
/// use batuto_bot::utils::truncate_str;
/// assert_eq!(truncate_str("Órale, carnal", 5), "Órale");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_reply_exact_sizes() {
        let text = "a".repeat(9500);
        let parts = chunk_reply(&text, 4000);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4000);
        assert_eq!(parts[1].len(), 4000);
        assert_eq!(parts[2].len(), 1500);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_chunk_reply_short_message_single_part() {
        let parts = chunk_reply("hola", 4000);
        assert_eq!(parts, vec!["hola".to_string()]);
    }

    #[test]
    fn test_chunk_reply_boundary() {
        let text = "b".repeat(4000);
        let parts = chunk_reply(&text, 4000);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_chunk_reply_empty() {
        assert!(chunk_reply("", 4000).is_empty());
    }

    #[test]
    fn test_chunk_reply_multibyte_counts_chars() {
        let text = "ñ".repeat(4500);
        let parts = chunk_reply(&text, 4000);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].chars().count(), 4000);
        assert_eq!(parts[1].chars().count(), 500);
    }

    #[test]
    fn test_truncate_str_unicode() {
        assert_eq!(truncate_str("Órale, carnal", 5), "Órale");
        assert_eq!(truncate_str("corto", 50), "corto");
    }
}
