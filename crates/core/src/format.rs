//! Display text helpers.

/// Line limit for project titles.
pub const TITLE_LINE_LIMIT: usize = 40;

/// Line limit for project descriptions.
pub const DESCRIPTION_LINE_LIMIT: usize = 60;

/// Greedy word wrap.
///
/// Text that fits within `limit` characters is returned unchanged. Longer
/// text is re-flowed into newline-separated lines of at most `limit`
/// characters; a single word longer than `limit` gets a line of its own and
/// is not split.
pub fn wrap_words(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len == 0 {
            line.push_str(word);
            line_len = word_len;
        } else if line_len + 1 + word_len <= limit {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_len = word_len;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

/// Wrap a project title for card display.
pub fn format_project_title(title: &str) -> String {
    wrap_words(title, TITLE_LINE_LIMIT)
}

/// Wrap a project description for card display.
pub fn format_project_description(description: &str) -> String {
    wrap_words(description, DESCRIPTION_LINE_LIMIT)
}

/// Mask a name for public bid listings: `"John Smith"` becomes `"J*** S***"`.
pub fn mask_name(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|first| format!("{first}***"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        let title = "Meta-analysis of  sleep studies";
        assert_eq!(format_project_title(title), title);

        let exactly = "a".repeat(DESCRIPTION_LINE_LIMIT);
        assert_eq!(format_project_description(&exactly), exactly);
    }

    #[test]
    fn test_long_title_wraps() {
        let title = "Systematic review of machine learning methods for protein folding";
        let wrapped = format_project_title(title);

        assert_eq!(
            wrapped,
            "Systematic review of machine learning\nmethods for protein folding"
        );
    }

    #[test]
    fn test_wrap_properties() {
        let vocabulary = [
            "data", "a", "statistical", "analysis", "of", "longitudinal", "cohort",
            "for", "x", "research", "questionnaire", "pipeline", "in", "the",
        ];
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for round in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let count = 1 + (seed % 30) as usize;
            let words: Vec<&str> = (0..count)
                .map(|i| vocabulary[((seed >> (i % 48)) as usize + i) % vocabulary.len()])
                .collect();
            let text = words.join(" ");

            for limit in [TITLE_LINE_LIMIT, DESCRIPTION_LINE_LIMIT] {
                let wrapped = wrap_words(&text, limit);
                if text.chars().count() <= limit {
                    assert_eq!(wrapped, text);
                    continue;
                }
                for line in wrapped.lines() {
                    assert!(line.chars().count() <= limit, "round {round}: {line:?}");
                }
                let rejoined = wrapped.lines().collect::<Vec<_>>().join(" ");
                assert_eq!(rejoined, words.join(" "));
            }
        }
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let word = "x".repeat(50);
        let text = format!("short {word} tail");
        assert_eq!(wrap_words(&text, 40), format!("short\n{word}\ntail"));
    }

    #[test]
    fn test_mask_name() {
        assert_eq!(mask_name("John Smith"), "J*** S***");
        assert_eq!(mask_name("  Ada   Lovelace King "), "A*** L*** K***");
        assert_eq!(mask_name("Émile"), "É***");
        assert_eq!(mask_name(""), "");
    }
}
