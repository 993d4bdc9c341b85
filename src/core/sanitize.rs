/// Sanitization rewrite chain: turns one expanded page into actor text and
/// display text.
///
/// The chain runs in a fixed order. Several rewrites only see the right
/// input because an earlier one already removed the markup around it.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::core::lexicon::{describe_token, Portrait};

/// Literal tag that replaces the player-name sigil.
pub const PLAYER_TAG: &str = "[PlayerName]";

static RE_GATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+|[A-Za-z_][A-Za-z0-9_]*)#").unwrap());
static RE_ONCE_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$1\s+[^\s#]+#").unwrap());
static RE_LEADING_WEIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d*\.\d+\s*#").unwrap());
static RE_NARRATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)%+([A-Za-z0-9]*)").unwrap());
static RE_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$q\s+[^#]*#(.*)$").unwrap());
static RE_RESPONSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#?\$r\s+[^#]*#[^#]*").unwrap());
static RE_CHANCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$c\b\s*[\d.]*#?").unwrap());
static RE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*#+[ \t]*").unwrap());
static RE_QUICK_RESPONSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$y\s+'([^']*)'").unwrap());
static RE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)\$action\b.*$|\$[tv]\s+\S+(?:\s+\d+)?|\$(?:query|[kdpqrycbe])\b|\[\d+(?:\s+\d+)*\]",
    )
    .unwrap()
});
static RE_DANGLING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$+(\s|$)").unwrap());
static RE_LEXICON: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([A-Za-z0-9]+)").unwrap());
static RE_PORTRAIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(neutral|[hsula]|\d+)\b").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
static RE_NEWLINE_PAD: Lazy<Regex> = Lazy::new(|| Regex::new(r" *\n[ \n]*").unwrap());

/// Rewrites shared by actor and display text, in application order.
const CHAIN: &[fn(&str) -> String] = &[
    strip_gate,
    strip_once_flags,
    strip_leading_weight,
    strip_narrator,
    extract_question,
    strip_chance,
    collapse_separators,
    flatten_quick_response,
    strip_commands,
    strip_dangling_sigil,
    substitute_player,
    substitute_lexicon,
    collapse_whitespace,
];

/// Production reference text: portraits become bracketed mood tags.
pub fn sanitize_actor(text: &str) -> String {
    let shared = run_chain(text);
    let tagged = RE_PORTRAIT.replace_all(&shared, |caps: &Captures| {
        format!(" {} ", Portrait::from_sigil(&caps[1]).tag())
    });
    collapse_whitespace(&tagged)
}

/// Canonical lookup key: portraits removed without a trace.
///
/// Applying this to its own output is a no-op.
pub fn sanitize_display(text: &str) -> String {
    settle(text, |t| {
        let shared = run_chain(t);
        let stripped = RE_PORTRAIT.replace_all(&shared, " ");
        collapse_whitespace(&stripped)
    })
}

fn run_chain(text: &str) -> String {
    CHAIN
        .iter()
        .fold(text.to_string(), |acc, rewrite| rewrite(&acc))
}

/// Upper bound on display passes; real lines settle in one or two.
const MAX_PASSES: usize = 8;

/// Repeat `pass` until the text stops changing. A strip can expose a new
/// leading sigil (`$h %foo` once the portrait goes) that only the next pass sees.
fn settle(text: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = pass(text);
    for _ in 1..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn strip_gate(text: &str) -> String {
    RE_GATE.replace(text, "").into_owned()
}

fn strip_once_flags(text: &str) -> String {
    RE_ONCE_FLAG.replace_all(text, "").into_owned()
}

fn strip_leading_weight(text: &str) -> String {
    RE_LEADING_WEIGHT.replace(text, "").into_owned()
}

/// A leading run of `%` marks narration, unless it starts a lexicon token.
fn strip_narrator(text: &str) -> String {
    RE_NARRATOR
        .replace(text, |caps: &Captures| {
            let word = &caps[2];
            if !word.is_empty() && describe_token(word).is_some() {
                format!("{}%{}", &caps[1], word)
            } else {
                format!("{}{}", &caps[1], word)
            }
        })
        .into_owned()
}

/// Keep only the question of a `$q` construct and drop every `$r` answer block.
fn extract_question(text: &str) -> String {
    let question = match RE_QUESTION.captures(text) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            format!("{}{}", &text[..start], &caps[1])
        }
        None => text.to_string(),
    };
    RE_RESPONSE.replace_all(&question, "").into_owned()
}

fn strip_chance(text: &str) -> String {
    RE_CHANCE.replace_all(text, "").into_owned()
}

fn collapse_separators(text: &str) -> String {
    RE_SEPARATOR.replace_all(text, " ").into_owned()
}

/// `$y 'A_B_A2_B2'` becomes `A: B | A2: B2`.
fn flatten_quick_response(text: &str) -> String {
    RE_QUICK_RESPONSE
        .replace_all(text, |caps: &Captures| {
            let parts: Vec<&str> = caps[1].split('_').map(str::trim).collect();
            parts
                .chunks(2)
                .map(|pair| match pair {
                    [prompt, reply] => format!("{prompt}: {reply}"),
                    [single] => single.to_string(),
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .into_owned()
}

fn strip_commands(text: &str) -> String {
    RE_COMMAND.replace_all(text, "").into_owned()
}

fn strip_dangling_sigil(text: &str) -> String {
    RE_DANGLING.replace_all(text, "${1}").into_owned()
}

fn substitute_player(text: &str) -> String {
    text.replace('@', PLAYER_TAG)
}

/// Known `%token`s become bracketed descriptions; unknown ones pass through.
fn substitute_lexicon(text: &str) -> String {
    RE_LEXICON
        .replace_all(text, |caps: &Captures| match describe_token(&caps[1]) {
            Some(desc) => desc.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    let flat = RE_HORIZONTAL_WS.replace_all(text, " ");
    let lines = RE_NEWLINE_PAD.replace_all(&flat, "\n");
    lines.trim().to_string()
}
