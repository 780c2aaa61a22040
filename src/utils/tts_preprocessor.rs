/// Clean model output before speech synthesis.
///
/// Markdown emphasis markers are dropped and runs of whitespace (including
/// newlines) collapse to a single space.
pub fn tts_filter(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
