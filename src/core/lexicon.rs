/// Fixed lookup tables for variable lexicon tokens and portrait sigils.

/// Human-readable stand-ins for `%token` substitutions.
const LEXICON: &[(&str, &str)] = &[
    ("adj", "[Adjective]"),
    ("noun", "[Noun]"),
    ("place", "[Place]"),
    ("spouse", "[Spouse]"),
    ("farm", "[FarmName]"),
    ("pet", "[PetName]"),
    ("kid1", "[FirstChild]"),
    ("kid2", "[SecondChild]"),
    ("favorite", "[FavoriteThing]"),
    ("name", "[RandomName]"),
    ("firstnameletter", "[FirstNameLetter]"),
    ("time", "[Time]"),
    ("band", "[BandName]"),
    ("book", "[BookTitle]"),
    ("rival", "[Rival]"),
    ("year", "[Year]"),
    ("season", "[Season]"),
    ("endearment", "[Endearment]"),
    ("endearmentlower", "[Endearment]"),
];

/// Description for a lexicon token name (without the leading `%`).
pub fn describe_token(token: &str) -> Option<&'static str> {
    LEXICON
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, desc)| *desc)
}

/// Whether a description is one this table produces.
pub fn is_description(text: &str) -> bool {
    LEXICON.iter().any(|(_, desc)| *desc == text)
}

/// Portrait/mood shown alongside a dialogue page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portrait {
    Neutral,
    Happy,
    Sad,
    Unique,
    Love,
    Angry,
    Custom(u32),
    Unknown,
}

impl Portrait {
    /// Parse the text following `$` in a portrait sigil.
    pub fn from_sigil(code: &str) -> Self {
        match code {
            "neutral" => Self::Neutral,
            "h" => Self::Happy,
            "s" => Self::Sad,
            "u" => Self::Unique,
            "l" => Self::Love,
            "a" => Self::Angry,
            digits => match digits.parse::<u32>() {
                Ok(n) => Self::from_code(n),
                Err(_) => Self::Unknown,
            },
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Neutral,
            1 => Self::Happy,
            2 => Self::Sad,
            3 => Self::Unique,
            4 => Self::Love,
            5 => Self::Angry,
            n => Self::Custom(n),
        }
    }

    /// Bracketed tag written into actor text.
    pub fn tag(&self) -> String {
        match self {
            Self::Neutral => "[Neutral]".to_string(),
            Self::Happy => "[Happy]".to_string(),
            Self::Sad => "[Sad]".to_string(),
            Self::Unique => "[Unique]".to_string(),
            Self::Love => "[Love]".to_string(),
            Self::Angry => "[Angry]".to_string(),
            Self::Custom(n) => format!("[Custom:{n}]"),
            Self::Unknown => "[Unknown]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_tokens() {
        assert_eq!(describe_token("adj"), Some("[Adjective]"));
        assert_eq!(describe_token("Farm"), Some("[FarmName]"));
        assert_eq!(describe_token("fork"), None);
        assert!(is_description("[Noun]"));
        assert!(!is_description("[PlayerName]"));
    }

    #[test]
    fn portrait_codes() {
        assert_eq!(Portrait::from_sigil("h"), Portrait::Happy);
        assert_eq!(Portrait::from_sigil("0"), Portrait::Neutral);
        assert_eq!(Portrait::from_sigil("5"), Portrait::Angry);
        assert_eq!(Portrait::from_sigil("12").tag(), "[Custom:12]");
        assert_eq!(Portrait::from_sigil("x"), Portrait::Unknown);
    }
}
