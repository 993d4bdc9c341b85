/// Script canonicalizer: raw script line in, ordered canonical segments out.
///
/// Pure and deterministic. The same raw line always yields the same
/// segments, and page indices are assigned sequentially across every
/// segment emitted for the line (branch siblings each get their own index).
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::sanitize::{sanitize_actor, sanitize_display};
use crate::schema::line::{Gender, Segment};

/// Starts a new dialogue page.
pub const PAGE_BREAK: &str = "#$e#";
/// Breaks a line inside the same page.
pub const LINE_BREAK: &str = "#$b#";
/// Separates weekly rotation variants; only the first is canonical.
pub const ROTATION_SEPARATOR: &str = "||";

static RE_RANDOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*\$c\s+[\d.]+\s*#(.*?)#(.*)$").unwrap());
static RE_CONDITIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*\$(?:d|p|query)\s+[^#]*#(.*?)\|(.*)$").unwrap());
static RE_BRACED_GENDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\{([^{}]*\^[^{}]*)\}\$?").unwrap());

/// Options for a canonicalization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOptions {
    /// When false, page breaks become newlines and the line is one page.
    pub split_pages: bool,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        Self { split_pages: true }
    }
}

/// One text variant produced by branch expansion, before sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Branch {
    text: String,
    gender: Gender,
}

impl Branch {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            gender: Gender::None,
        }
    }
}

/// Canonicalize a raw line with default options.
pub fn canonicalize(raw: &str) -> Vec<Segment> {
    canonicalize_with(raw, CanonicalOptions::default())
}

/// Canonicalize a raw line.
///
/// Steps run in a fixed order: rotation truncation, page split, branch
/// expansion per page, page-index assignment, then sanitization of every
/// branch into actor and display text.
pub fn canonicalize_with(raw: &str, options: CanonicalOptions) -> Vec<Segment> {
    let text = truncate_rotation(raw);
    let mut segments = Vec::new();
    let mut next_page = 0u32;

    for page in split_pages(text, options.split_pages) {
        for branch in expand_branches(&page) {
            segments.push(Segment {
                page: next_page,
                actor_text: sanitize_actor(&branch.text),
                display_text: sanitize_display(&branch.text),
                gender: branch.gender,
            });
            next_page += 1;
        }
    }

    segments
}

fn truncate_rotation(raw: &str) -> &str {
    match raw.find(ROTATION_SEPARATOR) {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

/// Split into pages. Line breaks always become literal newlines; blank
/// pages (a trailing page break, say) are dropped.
fn split_pages(text: &str, split: bool) -> Vec<String> {
    let chunks: Vec<&str> = if split {
        text.split(PAGE_BREAK).collect()
    } else {
        vec![text]
    };

    chunks
        .into_iter()
        .map(|chunk| {
            let chunk = chunk.replace(LINE_BREAK, "\n");
            if split {
                chunk
            } else {
                chunk.replace(PAGE_BREAK, "\n")
            }
        })
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

/// First matching construct wins: random choice, conditional, bare caret
/// gender, braced gender. Anything else is a single plain branch.
fn expand_branches(page: &str) -> Vec<Branch> {
    if let Some(caps) = RE_RANDOM.captures(page) {
        return vec![Branch::plain(&caps[1]), Branch::plain(&caps[2])];
    }

    if let Some(caps) = RE_CONDITIONAL.captures(page) {
        return vec![Branch::plain(&caps[1]), Branch::plain(&caps[2])];
    }

    let has_braced = RE_BRACED_GENDER.is_match(page);
    if !has_braced {
        if let Some(pair) = split_bare_caret(page) {
            return pair;
        }
    }

    if has_braced {
        return expand_braced(page);
    }

    vec![Branch::plain(page)]
}

/// `male^female` with text on both sides. Only the line holding the caret
/// is split; text on other lines is shared by both genders.
fn split_bare_caret(page: &str) -> Option<Vec<Branch>> {
    if page.matches('^').count() != 1 {
        return None;
    }
    let caret = page.find('^')?;
    let (left, right) = (&page[..caret], &page[caret + 1..]);

    let head_end = left.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let (head, male) = left.split_at(head_end);
    let tail_start = right.find('\n').unwrap_or(right.len());
    let (female, tail) = right.split_at(tail_start);

    if male.trim().is_empty() || female.trim().is_empty() {
        return None;
    }

    Some(vec![
        Branch {
            text: format!("{head}{male}{tail}"),
            gender: Gender::Male,
        },
        Branch {
            text: format!("{head}{female}{tail}"),
            gender: Gender::Female,
        },
    ])
}

/// One branch per alternative of `{male^female(^nonbinary)}`. Every braced
/// token on the page takes the same alternative; a token with fewer
/// alternatives falls back to its first.
fn expand_braced(page: &str) -> Vec<Branch> {
    let width = RE_BRACED_GENDER
        .captures_iter(page)
        .map(|caps| caps[1].split('^').count())
        .max()
        .unwrap_or(0)
        .min(3);

    if width < 2 {
        return vec![Branch::plain(page)];
    }

    (0..width)
        .map(|choice| {
            let text = RE_BRACED_GENDER.replace_all(page, |caps: &regex::Captures| {
                let alternatives: Vec<&str> = caps[1].split('^').collect();
                alternatives
                    .get(choice)
                    .or_else(|| alternatives.first())
                    .copied()
                    .unwrap_or_default()
                    .to_string()
            });
            Branch {
                text: text.into_owned(),
                gender: Gender::from_alternative(choice),
            }
        })
        .collect()
}
