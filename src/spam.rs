/// Substrings that mark a message as spam, checked against lowercased text.
///
/// Deliberately coarse. "join" alone flags plenty of honest messages, and
/// the group runs with that tradeoff on purpose, so don't get clever here.
const SPAM_TRIGGERS: &[&str] = &[
    "https://",
    "http://",
    "t.me",
    ".com",
    ".net",
    ".org",
    "join",
    "free",
    "gift",
    "click",
    "subscribe",
    "add me",
    "pm me",
    "check this",
    "look at this",
    "follow me",
    "my channel",
];

/// True if any trigger occurs anywhere in the text, case-insensitively.
/// Any substring counts; there are no word boundaries and no scoring.
#[must_use]
pub fn is_spam(text: &str) -> bool {
    let text = text.to_lowercase();
    SPAM_TRIGGERS.iter().any(|trigger| text.contains(trigger))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_spam("JOIN now"));
        assert!(is_spam("join now"));
        assert!(is_spam("FREE GIFT, CLICK HERE"));
    }

    #[test]
    fn links_are_flagged() {
        assert!(is_spam("Check this out: http://example.com"));
        assert!(is_spam("https://totally-legit.biz"));
        assert!(is_spam("t.me/some_channel"));
        assert!(is_spam("visit shady.org today"));
    }

    #[test]
    fn substrings_inside_words_count_too() {
        // A known false positive, kept on purpose.
        assert!(is_spam("I joined room 4 to study"));
        assert!(is_spam("this is freedom"));
    }

    #[test]
    fn clean_text_passes() {
        assert!(!is_spam("Good morning! What was the homework for today?"));
        assert!(!is_spam("4"));
        assert!(!is_spam(""));
    }
}
