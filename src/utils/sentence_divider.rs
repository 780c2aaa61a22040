/// Longest chunk the speech endpoint accepts, in characters.
pub const MAX_CHUNK_CHARS: usize = 100;

const BREAK_CHARS: &[char] = &[
    '.', '!', '?', ',', ';', ':', '…', '\n', '。', '！', '？', '，', '、', '；', '：', '।',
];

/// Split text into speakable chunks of at most `max_chars` characters.
///
/// Text is first cut after punctuation; pieces that are still too long are cut
/// at the last whitespace before the limit, or hard at the limit when there is none.
/// Pieces without any letter or digit are dropped.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for piece in split_after_punctuation(text) {
        if !piece.chars().any(char::is_alphanumeric) {
            continue;
        }
        minimize(piece.trim(), max_chars, &mut chunks);
    }

    chunks
}

fn split_after_punctuation(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        if BREAK_CHARS.contains(&ch) {
            let end = i + ch.len_utf8();
            parts.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }

    parts
}

fn minimize(text: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = rest[..limit]
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        let (head, tail) = rest.split_at(cut);
        out.push(head.trim_end().to_string());
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        out.push(rest.to_string());
    }
}
