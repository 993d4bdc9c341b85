/// Canonicalizer integration tests: properties over a sample of script lines.

use voiceline_engine::core::canonical::canonicalize;
use voiceline_engine::core::sanitize::sanitize_display;
use voiceline_engine::schema::line::Gender;

const PLAIN_LINES: &[&str] = &[
    "Nice weather today.$h",
    "Hey @, how's %farm?$s",
    "12#Flag gated line.$u",
    "$1 letter12#Did you get my letter?",
    "Take this. [388 10]$k",
    "%The door is locked.",
    "Later! $t talk_topic 4",
    "Well, $ okay.$neutral",
];

const BRACED_LINES: &[(&str, &str, &[&str])] = &[
    ("${Sir^Ma'am}, welcome!", "{}, welcome!", &["Sir", "Ma'am"]),
    ("Thanks, ${lad^lass^friend}$!", "Thanks, {}!", &["lad", "lass", "friend"]),
    ("Is that ${him^her} again?$a", "Is that {} again?", &["him", "her"]),
];

#[test]
fn plain_lines_yield_one_clean_segment() {
    for raw in PLAIN_LINES {
        let segs = canonicalize(raw);
        assert_eq!(segs.len(), 1, "{raw:?}");
        let display = &segs[0].display_text;
        assert!(!display.contains('$'), "residual sigil in {display:?}");
        assert!(!display.trim().is_empty(), "{raw:?}");
        assert_eq!(segs[0].gender, Gender::None);
    }
}

#[test]
fn braced_gender_differs_only_in_substituted_span() {
    for (raw, template, alternatives) in BRACED_LINES {
        let segs = canonicalize(raw);
        assert!(segs.len() >= 2, "{raw:?}");
        assert_eq!(segs.len(), alternatives.len());
        for (seg, alt) in segs.iter().zip(alternatives.iter()) {
            assert_eq!(seg.display_text, template.replace("{}", alt));
        }
        assert_eq!(segs[0].gender, Gender::Male);
        assert_eq!(segs[1].gender, Gender::Female);
    }
}

#[test]
fn page_indices_strictly_increase() {
    let samples = [
        "Hello#$b#friend.#$e#${Sir^Ma'am}, welcome!",
        "$c 0.5#Rain.#Sun.#$e#$d joja#Joja!|Community!#$e#Bye.",
        "One.#$e#Two.#$e#Three.#$e#",
        "Hmm.^Hmm?#$e#${He^She} left.",
    ];
    for raw in samples {
        let pages: Vec<u32> = canonicalize(raw).iter().map(|s| s.page).collect();
        assert!(!pages.is_empty());
        assert!(pages.windows(2).all(|w| w[0] < w[1]), "{raw:?}: {pages:?}");
    }
}

#[test]
fn display_text_is_sanitizer_fixed_point() {
    let samples = PLAIN_LINES
        .iter()
        .copied()
        .chain(BRACED_LINES.iter().map(|(raw, _, _)| *raw))
        .chain(["$q 101 f#Fish?#$r 101 10 y#Yes!", "$y 'Hint?_Yes_Sure!_No_Ok.'"]);
    for raw in samples {
        for seg in canonicalize(raw) {
            assert_eq!(sanitize_display(&seg.display_text), seg.display_text, "{raw:?}");
        }
    }
}

#[test]
fn greeting_scenario() {
    let segs = canonicalize("Hello#$b#friend.#$e#${Sir^Ma'am}, welcome!");

    let first_page: Vec<_> = segs.iter().filter(|s| s.page == 0).collect();
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].display_text, "Hello\nfriend.");

    let rest: Vec<_> = segs.iter().filter(|s| s.page > 0).collect();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].display_text, "Sir, welcome!");
    assert_eq!(rest[0].gender, Gender::Male);
    assert_eq!(rest[1].display_text, "Ma'am, welcome!");
    assert_eq!(rest[1].gender, Gender::Female);
}
