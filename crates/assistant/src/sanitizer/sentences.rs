//! Sentence splitting and budget fitting.

/// Split text into sentences ending in `.`, `!` or `?` followed by
/// whitespace. A trailing unterminated fragment counts as a sentence.
/// Decimal points such as `4.50` do not split.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !is_terminator(c) {
            continue;
        }

        while let Some(&next) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            current.push(next);
            chars.next();
        }

        if chars.peek().map_or(true, |n| n.is_whitespace()) {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

/// Keep whole sentences, at most `max_sentences` of them and `max_chars`
/// characters in total. When even the first sentence is too long it is cut
/// at a word boundary and closed with a full stop.
pub(crate) fn fit(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let sentences = split_sentences(text);
    let mut out = String::new();

    for sentence in sentences.iter().take(max_sentences) {
        let needed = out.chars().count() + usize::from(!out.is_empty()) + sentence.chars().count();
        if needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sentence);
    }

    if out.is_empty() && max_sentences > 0 {
        if let Some(first) = sentences.first() {
            out = clip(first, max_chars);
        }
    }

    out
}

fn clip(sentence: &str, max_chars: usize) -> String {
    let taken: String = sentence.chars().take(max_chars.saturating_sub(1)).collect();
    let cut = match taken.rfind(char::is_whitespace) {
        Some(i) if i > 0 => &taken[..i],
        _ => taken.as_str(),
    };
    let cut = cut.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '•' | '.' | '!' | '?')
    });

    if cut.is_empty() {
        String::new()
    } else {
        format!("{}.", cut)
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn push_trimmed(sentences: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
