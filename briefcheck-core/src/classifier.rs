use crate::types::BriefType;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// Fuzzy fragments tolerate OCR and ligature confusion (l/1/i/|, fl residue)
const BRIEF: &str = r"br[il1!|f]ef";
const AMICUS: &str = r"am[il1!|].?c[ue][sz]";
const FRIEND: &str = r"friend.{0,5}(of\s+)?(the\s+)?court";
const REPLY: &str = r"rep[il1!|][yi1!|]";
const CROSS: &str = r"cross[- ]?app?e[il1!|]{1,2}[ae]";
const APPELLANT: &str = r"a ?p{1,2}e(?:[il1!|f]{1,2})[ae]nts?";
const APPELLEE: &str = r"app?e(?:[il1!|f]{1,2})ees?";
const PETITIONER: &str = r"pet[il1!|]t[il1!|]on[ea]rs?";
const RESPONDENT: &str = r"resp[oa]n[dt]ents?";

fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).unwrap()
}

/// Phrase patterns tying a party word to "brief", in priority order
static AMICUS_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(format!(r"(?s){AMICUS}.{{0,20}}{BRIEF}")),
        compile(format!(r"(?s){BRIEF}.{{0,20}}{AMICUS}")),
        compile(format!(r"(?s){FRIEND}.{{0,15}}{BRIEF}")),
        compile(format!(r"(?s){BRIEF}.{{0,15}}{FRIEND}")),
    ]
});

static REPLY_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(format!(r"(?s){REPLY}.{{0,10}}{BRIEF}")),
        compile(format!(r"(?s){BRIEF}.{{0,10}}(in\s+)?{REPLY}")),
    ]
});

static CROSS_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(format!(r"(?s){CROSS}.{{0,15}}{BRIEF}")),
        compile(format!(r"(?s){BRIEF}.{{0,15}}{CROSS}")),
    ]
});

/// "brief of (the) X" up to a comma, line break or end of text
static BRIEF_OF: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"{BRIEF}\s+of\s+(?:the\s+)?([^,\n]{{1,40}})")));

/// "X brief", where X may be a hyphenated compound (defendant-appellant)
static X_BRIEF: LazyLock<Regex> = LazyLock::new(|| compile(format!(r"(\S+(?:-\S+)*)\s+{BRIEF}")));

static AMICUS_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(AMICUS.to_string()));
static FRIEND_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(FRIEND.to_string()));
static CROSS_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(CROSS.to_string()));
static APPELLEE_SIDE: LazyLock<Regex> = LazyLock::new(|| compile(format!("{APPELLEE}|{RESPONDENT}")));
static APPELLANT_SIDE: LazyLock<Regex> = LazyLock::new(|| compile(format!("{APPELLANT}|{PETITIONER}")));

static REHEARING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)re-?hearing|reconsideration").unwrap());

static QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("['\u{2018}\u{2019}\u{201a}\u{201b}`\u{00b4}\u{2032}\u{2035}\"\u{201c}\u{201d}\u{201e}\u{201f}\u{00ab}\u{00bb}\u{2033}\u{2036}]").unwrap()
});

static DASHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}\u{2015}\u{2212}\u{fe58}\u{fe63}\u{ff0d}]").unwrap()
});

static ZERO_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{200b}\u{200c}\u{200d}\u{feff}\u{00ad}]").unwrap());

static WORD_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}|\t").unwrap());

static LETTER_SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[a-z] )+[a-z]\b").unwrap());

/// Ligature residue inside "brief" after decomposition
static LIGATURE_RESIDUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)brifif?").unwrap());

static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Infers the brief type from cover text.
///
/// Pass 1 looks for party words tied to "brief" (most specific first:
/// amicus, reply, cross-appeal, then "brief of X" / "X brief"). Pass 2
/// falls back to standalone labels that are distinctive on their own.
/// Appellant/appellee are never guessed from bare labels since covers
/// name both parties.
#[derive(Debug, Default, Clone, Copy)]
pub struct BriefTypeClassifier;

impl BriefTypeClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, cover_text: &str) -> BriefType {
        let text = normalize(cover_text);
        let brief_type = match_brief_phrase(&text).unwrap_or_else(|| match_standalone(&text));
        tracing::info!(brief_type = %brief_type, "classified brief type");
        brief_type
    }

    /// Petition-for-rehearing briefs switch amicus limits to word counts
    pub fn detect_rehearing(&self, cover_text: &str) -> bool {
        REHEARING.is_match(&normalize(cover_text))
    }
}

/// Lowercase, ASCII-ish form of cover text: ligatures decomposed, accents,
/// quotes and zero-width characters dropped, dashes unified, letter-spaced
/// words collapsed. Line breaks survive as "\n".
pub fn normalize(text: &str) -> String {
    let decomposed: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let text = ZERO_WIDTH.replace_all(&decomposed, "");
    let text = LIGATURE_RESIDUE.replace_all(&text, "brief");
    let text = QUOTES.replace_all(&text, "");
    let text = DASHES.replace_all(&text, "-");
    let text = text.to_lowercase();

    // Wide gaps are word boundaries; single spaces between single letters are letter-spacing
    let text = WORD_BREAK.replace_all(text.trim(), "\u{0}");
    let text = LETTER_SPACED.replace_all(&text, |caps: &regex::Captures| caps[0].replace(' ', ""));
    let text = text.replace('\u{0}', " ");

    text.lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

fn match_brief_phrase(text: &str) -> Option<BriefType> {
    if any_match(&AMICUS_PHRASES, text) {
        return Some(BriefType::Amicus);
    }
    if any_match(&REPLY_PHRASES, text) {
        return Some(BriefType::Reply);
    }
    if any_match(&CROSS_PHRASES, text) {
        return Some(BriefType::CrossAppeal);
    }

    if let Some(party) = BRIEF_OF.captures(text).and_then(|c| c.get(1)) {
        let party = party.as_str();
        if CROSS_LABEL.is_match(party) {
            return Some(BriefType::CrossAppeal);
        }
        if APPELLEE_SIDE.is_match(party) {
            return Some(BriefType::Appellee);
        }
        if APPELLANT_SIDE.is_match(party) {
            return Some(BriefType::Appellant);
        }
    }

    if let Some(party) = X_BRIEF.captures(text).and_then(|c| c.get(1)) {
        let party = party.as_str();
        if APPELLEE_SIDE.is_match(party) {
            return Some(BriefType::Appellee);
        }
        if APPELLANT_SIDE.is_match(party) {
            return Some(BriefType::Appellant);
        }
    }

    None
}

fn match_standalone(text: &str) -> BriefType {
    if AMICUS_LABEL.is_match(text) || FRIEND_LABEL.is_match(text) {
        BriefType::Amicus
    } else if CROSS_LABEL.is_match(text) {
        BriefType::CrossAppeal
    } else {
        BriefType::Unknown
    }
}
