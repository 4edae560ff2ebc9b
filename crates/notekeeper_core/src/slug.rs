//! Slug derivation and validation.
//!
//! # Responsibility
//! - Turn a free-form (often Cyrillic) title into a URL-safe slug.
//! - Validate slugs supplied by users.
//!
//! # Invariants
//! - [`derive_slug`] never returns an empty string.
//! - Every returned or accepted slug is 1..=100 chars of `[A-Za-z0-9_-]`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum slug length in characters.
pub const SLUG_MAX_CHARS: usize = 100;

const FALLBACK_PREFIX: &str = "note";

static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid disallowed-char regex"));
static SEPARATOR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Reasons a supplied slug is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    Empty,
    TooLong { max: usize, actual: usize },
    InvalidChar(char),
}

impl Display for SlugError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "slug must not be empty"),
            Self::TooLong { max, actual } => {
                write!(f, "slug must be at most {max} characters (got {actual})")
            }
            Self::InvalidChar(ch) => write!(
                f,
                "slug may contain only latin letters, digits, `-` and `_` (found `{ch}`)"
            ),
        }
    }
}

impl Error for SlugError {}

/// Checks a caller-supplied slug without rewriting it.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if let Some(bad) = slug
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        return Err(SlugError::InvalidChar(bad));
    }
    let actual = slug.chars().count();
    if actual > SLUG_MAX_CHARS {
        return Err(SlugError::TooLong {
            max: SLUG_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

/// Transliterates and normalizes `title` into a slug. May return `""` when
/// the title holds nothing transliterable.
pub fn slugify(title: &str) -> String {
    let mut latin = String::with_capacity(title.len());
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii() {
            latin.push(ch);
        } else if let Some(replacement) = transliterate(ch) {
            latin.push_str(replacement);
        } else if ch.is_whitespace() {
            latin.push(' ');
        }
    }

    let stripped = DISALLOWED_RE.replace_all(&latin, "");
    let joined = SEPARATOR_RUN_RE.replace_all(stripped.trim(), "-");
    let trimmed = joined.trim_matches(|ch| ch == '-' || ch == '_');

    let truncated: String = trimmed.chars().take(SLUG_MAX_CHARS).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Slug used when a note is created or edited without one.
pub fn derive_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{FALLBACK_PREFIX}-{}", &suffix[..8])
    } else {
        slug
    }
}

fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' | 'ґ' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "yo",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' | 'і' => "i",
        'ї' => "yi",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::{derive_slug, slugify, validate_slug, SlugError, SLUG_MAX_CHARS};

    #[test]
    fn transliterates_cyrillic_titles() {
        assert_eq!(slugify("Первая заметка"), "pervaya-zametka");
        assert_eq!(slugify("Щука и Ёж"), "schuka-i-yozh");
        assert_eq!(slugify("Объявление"), "obyavlenie");
    }

    #[test]
    fn strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("C++ -- tips"), "c-tips");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn drops_unknown_non_ascii() {
        assert_eq!(slugify("café 日本"), "caf");
    }

    #[test]
    fn truncates_without_trailing_dash() {
        let title = format!("{} tail", "a".repeat(SLUG_MAX_CHARS - 1));
        let slug = slugify(&title);
        assert_eq!(slug.len(), SLUG_MAX_CHARS - 1);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn derive_slug_never_returns_empty() {
        let slug = derive_slug("!!!");
        assert!(slug.starts_with("note-"));
        assert_eq!(slug.len(), "note-".len() + 8);
        assert!(validate_slug(&slug).is_ok());
    }

    #[test]
    fn validate_slug_rejects_bad_input() {
        assert_eq!(validate_slug(""), Err(SlugError::Empty));
        assert_eq!(validate_slug("a/b"), Err(SlugError::InvalidChar('/')));
        assert_eq!(validate_slug("заметка"), Err(SlugError::InvalidChar('з')));
        assert!(matches!(
            validate_slug(&"x".repeat(SLUG_MAX_CHARS + 1)),
            Err(SlugError::TooLong { .. })
        ));
        assert!(validate_slug("User-Note_1").is_ok());
    }
}
