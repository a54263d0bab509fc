//! Fuzzy equality for typed free-text answers.
//!
//! Natural-language translations cannot be graded by exact string equality
//! (synonyms, articles, word order), so English-side matching is deliberately
//! permissive: a false accept is preferred over penalizing a correct answer
//! phrased differently. Japanese-side matching stays strict.

use crate::types::{Card, Direction};

/// Words ignored when tokenizing English candidates and answers.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "to", "of", "and", "or", "in", "on", "for", "with", "at", "from", "by",
];

/// Outcome of checking a typed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub ok: bool,
    /// The answer the card expected, for display.
    pub expected: String,
}

/// Check a typed answer against a card for the given direction.
pub fn check_answer(card: &Card, direction: Direction, typed: &str) -> MatchOutcome {
    match direction {
        Direction::JpToEn => check_english(card, typed),
        Direction::EnToJp => check_japanese(card, typed),
    }
}

/// Normalize free text for comparison: lowercase, fold curly quotes, keep
/// only ASCII alphanumerics, Hiragana, Katakana, and CJK ideographs, and
/// collapse whitespace. Apostrophes vanish ("don't" -> "dont"); other
/// punctuation separates words.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        let c = fold_quote(c);
        if c == '\'' {
            continue;
        }
        if is_kept(c) {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        _ => c,
    }
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || ('\u{3040}'..='\u{309F}').contains(&c) // Hiragana
        || ('\u{30A0}'..='\u{30FF}').contains(&c) // Katakana
        || ('\u{4E00}'..='\u{9FFF}').contains(&c) // CJK ideographs
        || matches!(c, '\u{3005}' | '\u{3006}' | '\u{30F6}') // 々 〆 ヶ
}

fn content_tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .collect()
}

/// Strip parenthetical asides: "to run (intransitive)" -> "to run".
fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '（' => depth += 1,
            ')' | '）' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Split a translation field into answer candidates: `/`, `,`, `;`
/// separators plus standalone "or"/"and".
fn split_candidates(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for part in strip_parentheticals(text).split(['/', ',', ';']) {
        let mut current: Vec<&str> = Vec::new();
        for word in part.split_whitespace() {
            if word.eq_ignore_ascii_case("or") || word.eq_ignore_ascii_case("and") {
                if !current.is_empty() {
                    out.push(current.join(" "));
                    current.clear();
                }
            } else {
                current.push(word);
            }
        }
        if !current.is_empty() {
            out.push(current.join(" "));
        }
    }
    out
}

fn check_english(card: &Card, typed: &str) -> MatchOutcome {
    let typed_norm = normalize(typed);
    let expected = card.english.clone();
    if typed_norm.is_empty() {
        return MatchOutcome { ok: false, expected };
    }
    let typed_tokens = content_tokens(&typed_norm);

    for candidate in split_candidates(&card.english) {
        let cand_norm = normalize(&candidate);
        if cand_norm.is_empty() {
            continue;
        }
        if typed_norm == cand_norm {
            return MatchOutcome { ok: true, expected };
        }
        let cand_tokens = content_tokens(&cand_norm);
        if !cand_tokens.is_empty() && same_token_set(&cand_tokens, &typed_tokens) {
            return MatchOutcome { ok: true, expected };
        }
        let matched = match cand_tokens.len() {
            0 => false,
            1 => contains_either_way(&typed_norm, cand_tokens[0]),
            _ => {
                let significant: Vec<&str> =
                    cand_tokens.iter().copied().filter(|t| t.len() >= 3).collect();
                !significant.is_empty()
                    && significant.iter().all(|t| typed_tokens.contains(t))
            }
        };
        if matched {
            return MatchOutcome { ok: true, expected };
        }
    }

    MatchOutcome { ok: false, expected }
}

/// Equality up to word order, after stopword removal.
fn same_token_set(a: &[&str], b: &[&str]) -> bool {
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort_unstable();
    a_sorted.dedup();
    b_sorted.sort_unstable();
    b_sorted.dedup();
    a_sorted == b_sorted
}

/// Single-token candidates accept a containment match when either side is
/// at least four chars long.
fn contains_either_way(typed_norm: &str, candidate: &str) -> bool {
    (candidate.len() >= 4 && typed_norm.contains(candidate))
        || (typed_norm.len() >= 4 && candidate.contains(typed_norm))
}

fn check_japanese(card: &Card, typed: &str) -> MatchOutcome {
    let expected = if card.hiragana.is_empty() {
        card.japanese.clone()
    } else {
        format!("{} ({})", card.japanese, card.hiragana)
    };
    let raw = typed.trim();
    if raw.is_empty() {
        return MatchOutcome { ok: false, expected };
    }

    let exact = (!card.japanese.is_empty() && raw == card.japanese.trim())
        || (!card.hiragana.is_empty() && raw == card.hiragana.trim());
    if exact {
        return MatchOutcome { ok: true, expected };
    }

    let typed_norm = normalize(typed);
    let ok = !typed_norm.is_empty()
        && (typed_norm == normalize(&card.japanese) || typed_norm == normalize(&card.hiragana));
    MatchOutcome { ok, expected }
}
