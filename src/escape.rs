use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};

use crate::DeclarationError;

/// Inserted before every escapable character.
pub const MARKER: char = '\\';

const SENTINEL_LEN: usize = 3;

const PRINTABLE: &str = concat!(
    "!\"#$%&'()*+,-./:;<=>?@[]^_`|~",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
);

const DIGITS: &str = "0123456789";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]+\}").unwrap());

/// Escapes a configured set of characters in template text and in values.
///
/// With an empty set every operation is a pass-through.
#[derive(Clone, Debug, Default)]
pub struct Escaper {
    symbols: BTreeSet<char>,
    pattern: Option<Regex>,
    alphabet: Vec<char>,
    /// Characters spelling a sentinel's index, never in the escape set and
    /// never in the prefix alphabet.
    digits: Vec<char>,
}

impl Escaper {
    pub fn new(symbols: &str) -> Result<Self, DeclarationError> {
        let symbols: BTreeSet<char> = symbols.chars().collect();
        if symbols.is_empty() {
            return Ok(Self::default());
        }

        let alternation = symbols
            .iter()
            .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
            .collect::<Vec<_>>()
            .join("|");

        // An already-marked character is matched as a whole so it is left
        // alone, unless the marker itself is escapable.
        let source = if symbols.contains(&MARKER) {
            format!("(?:{alternation})")
        } else {
            format!(r"\\(?:{alternation})|(?:{alternation})")
        };
        let pattern = Regex::new(&source).map_err(|err| DeclarationError::InvalidEscape {
            symbols: symbols.iter().collect(),
            err,
        })?;

        let mut alphabet: Vec<char> = PRINTABLE
            .chars()
            .filter(|c| !symbols.contains(c))
            .collect();
        if alphabet.is_empty() {
            alphabet = ('\u{E000}'..='\u{E0FF}')
                .filter(|c| !symbols.contains(c))
                .collect();
        }

        let digits: Vec<char> = DIGITS
            .chars()
            .chain('\u{E100}'..='\u{E1FF}')
            .filter(|c| !symbols.contains(c))
            .take(DIGITS.len())
            .collect();

        Ok(Self {
            symbols,
            pattern: Some(pattern),
            alphabet,
            digits,
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.symbols.iter().copied()
    }

    pub fn is_noop(&self) -> bool {
        self.pattern.is_none()
    }

    /// Escape a single rendered value.
    ///
    /// A character that already follows a `\` is left as is, so user
    /// supplied sequences such as `\.` pass through unchanged unless the
    /// marker itself is escapable.
    pub fn escape(&self, s: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return s.to_owned();
        };

        pattern
            .replace_all(s, |caps: &Captures<'_>| {
                let found = &caps[0];
                if found.len() > 1 && found.starts_with(MARKER) {
                    found.to_owned()
                } else {
                    format!("{MARKER}{found}")
                }
            })
            .into_owned()
    }

    /// Escape the literal text of a template, leaving every `{...}`
    /// placeholder untouched.
    pub fn escape_template(&self, template: &str) -> String {
        if self.is_noop() {
            return template.to_owned();
        }

        let prefix = self.sentinel_prefix(template);
        let (protected, placeholders) = protect(template, &prefix, &self.digits);
        restore(&self.escape(&protected), &prefix, &self.digits, &placeholders)
    }

    /// A random prefix drawn from characters outside the escape set that does
    /// not occur anywhere in `template`.
    fn sentinel_prefix(&self, template: &str) -> String {
        let mut rng = rand::thread_rng();
        let mut len = SENTINEL_LEN;
        loop {
            let prefix: String = (0..len)
                .filter_map(|_| self.alphabet.choose(&mut rng))
                .collect();
            if !template.contains(&prefix) {
                return prefix;
            }
            len += 1;
        }
    }
}

/// Replace each placeholder with a sentinel, `prefix` + index + `prefix`,
/// returning the distinct placeholders in order of first occurrence.
///
/// The index is written in base `digits.len()` using `digits`.
fn protect<'t>(template: &'t str, prefix: &str, digits: &[char]) -> (String, Vec<&'t str>) {
    let mut placeholders: Vec<&'t str> = Vec::new();
    for found in PLACEHOLDER.find_iter(template) {
        if !placeholders.contains(&found.as_str()) {
            placeholders.push(found.as_str());
        }
    }

    let protected = PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let index = placeholders
                .iter()
                .position(|p| *p == &caps[0])
                .unwrap_or_default();
            format!("{prefix}{}{prefix}", encode_index(index, digits))
        })
        .into_owned();

    (protected, placeholders)
}

fn encode_index(mut index: usize, digits: &[char]) -> String {
    let base = digits.len();
    let mut out = Vec::new();
    loop {
        out.push(digits[index % base]);
        index /= base;
        if index == 0 {
            break;
        }
    }
    out.iter().rev().collect()
}

fn decode_index(encoded: &str, digits: &[char]) -> Option<usize> {
    if encoded.is_empty() {
        return None;
    }
    encoded.chars().try_fold(0_usize, |acc, c| {
        let digit = digits.iter().position(|d| *d == c)?;
        acc.checked_mul(digits.len())?.checked_add(digit)
    })
}

fn restore(escaped: &str, prefix: &str, digits: &[char], placeholders: &[&str]) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;

    while let Some(at) = rest.find(prefix) {
        out.push_str(&rest[..at]);
        let after = &rest[at + prefix.len()..];
        let len = after
            .chars()
            .take_while(|c| digits.contains(c))
            .map(char::len_utf8)
            .sum::<usize>();

        let placeholder = decode_index(&after[..len], digits)
            .and_then(|i| placeholders.get(i))
            .filter(|_| after[len..].starts_with(prefix));

        match placeholder {
            Some(placeholder) => {
                out.push_str(placeholder);
                rest = &after[len + prefix.len()..];
            }
            None => {
                // Not a sentinel; step past one character so an overlapping
                // occurrence starting inside this one is still found.
                let step = rest[at..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&rest[at..at + step]);
                rest = &rest[at + step..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// The escape function handed to a transform.
///
/// It is a no-op once a previous transform in the chain has already escaped
/// the value.
#[derive(Clone, Copy, Debug)]
pub struct Escape<'a>(Option<&'a Escaper>);

impl<'a> Escape<'a> {
    pub fn new(escaper: &'a Escaper) -> Self {
        Self(Some(escaper))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn is_noop(&self) -> bool {
        self.0.map_or(true, Escaper::is_noop)
    }

    pub fn apply(&self, s: &str) -> String {
        match self.0 {
            Some(escaper) => escaper.escape(s),
            None => s.to_owned(),
        }
    }
}
