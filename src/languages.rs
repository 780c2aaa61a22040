/// Languages offered in the UI, with their speech-synthesis codes, in display order.
pub const LANGUAGES: [(&str, &str); 6] = [
    ("Hindi", "hi"),
    ("French", "fr"),
    ("Spanish", "es"),
    ("German", "de"),
    ("Italian", "it"),
    ("Chinese", "zh"),
];

pub const FALLBACK_SPEECH_CODE: &str = "en";

pub fn labels() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(label, _)| *label)
}

/// Speech-synthesis code for a language label; anything unknown speaks English.
pub fn speech_code(label: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, code)| *code)
        .unwrap_or(FALLBACK_SPEECH_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_languages_map_to_their_codes() {
        assert_eq!(speech_code("Hindi"), "hi");
        assert_eq!(speech_code("French"), "fr");
        assert_eq!(speech_code("Spanish"), "es");
        assert_eq!(speech_code("German"), "de");
        assert_eq!(speech_code("Italian"), "it");
        assert_eq!(speech_code("Chinese"), "zh");
    }

    #[test]
    fn unknown_labels_fall_back_to_english() {
        assert_eq!(speech_code("Japanese"), "en");
        assert_eq!(speech_code("french"), "en");
        assert_eq!(speech_code(""), "en");
    }

    #[test]
    fn labels_keep_display_order() {
        let labels: Vec<&str> = labels().collect();
        assert_eq!(labels, vec!["Hindi", "French", "Spanish", "German", "Italian", "Chinese"]);
    }
}
