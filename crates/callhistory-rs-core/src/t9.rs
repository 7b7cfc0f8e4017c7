//! T9 keypad matching of typed digits against names and numbers.
//!
//! Every function here is pure and total: digit strings that cannot match
//! (empty, or containing anything but `0-9`) simply produce no match.

use std::ops::Range;

/// Letters printed on each keypad digit. `0`, `1`, `*`, `#` and `+` carry none.
fn letter_group(digit: char) -> Option<&'static str> {
    match digit {
        '2' => Some("abc"),
        '3' => Some("def"),
        '4' => Some("ghi"),
        '5' => Some("jkl"),
        '6' => Some("mno"),
        '7' => Some("pqrs"),
        '8' => Some("tuv"),
        '9' => Some("wxyz"),
        _ => None,
    }
}

fn key_matches(digit: char, letter: char) -> bool {
    letter_group(digit).is_some_and(|group| group.contains(letter))
}

/// True when `digits` is non-empty and made only of ASCII digits.
fn is_digit_query(digits: &str) -> bool {
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Strip a phone number down to its ASCII digits.
pub fn digits_only(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Lower-case a name and keep only `a-z`, collapsing spaces and punctuation.
fn letters_only(candidate: &str) -> Vec<char> {
    candidate
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}

fn matches_slice(letters: &[char], digits: &str, start: usize) -> bool {
    let mut letters = letters.iter().skip(start);
    digits
        .chars()
        .all(|digit| letters.next().is_some_and(|letter| key_matches(digit, *letter)))
}

/// Whether the characters of `candidate_lower` starting at `start` spell `digits`
/// on the keypad. Running past the end of the candidate is a non-match.
pub fn matches_at(candidate_lower: &str, digits: &str, start: usize) -> bool {
    if digits.is_empty() {
        return false;
    }
    let letters: Vec<char> = candidate_lower.chars().collect();
    matches_slice(&letters, digits, start)
}

/// Lowest index in the letters-only form of `candidate` where `digits` matches.
pub fn find_match(candidate: &str, digits: &str) -> Option<usize> {
    if !is_digit_query(digits) {
        return None;
    }
    let letters = letters_only(candidate);
    let width = digits.chars().count();
    if letters.len() < width {
        return None;
    }
    (0..=letters.len() - width).find(|start| matches_slice(&letters, digits, *start))
}

/// Range of the letters-only name covered by the first T9 match.
pub fn match_range(candidate: &str, digits: &str) -> Option<Range<usize>> {
    find_match(candidate, digits).map(|start| start..start + digits.chars().count())
}

/// Byte range inside the formatted `number` that covers `digits`.
///
/// A verbatim occurrence wins; otherwise the match is located in the
/// digits-only projection and mapped back across the formatting characters.
pub fn number_match_range(number: &str, digits: &str) -> Option<Range<usize>> {
    if digits.is_empty() {
        return None;
    }
    if let Some(start) = number.find(digits) {
        return Some(start..start + digits.len());
    }
    if !is_digit_query(digits) {
        return None;
    }
    let first_digit = digits_only(number).find(digits)?;
    let last_digit = first_digit + digits.len() - 1;
    let mut seen = 0;
    let mut start = None;
    for (index, ch) in number.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        if seen == first_digit {
            start = Some(index);
        }
        if seen == last_digit {
            return start.map(|start| start..index + ch.len_utf8());
        }
        seen += 1;
    }
    None
}
