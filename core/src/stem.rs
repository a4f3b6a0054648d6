//! Morphological reducers that `rust-stemmers` does not ship: the Paice/Husk
//! (Lancaster) stemmer and a suffix-detachment noun lemmatizer.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Paice/Husk rules. Each rule reads: reversed ending, optional `*` (word must
/// be intact), number of chars to remove, string to append, then `>` to keep
/// stemming or `.` to stop.
const LANCASTER_RULES: &[&str] = &[
    "ai*2.", "a*1.",
    "bb1.",
    "city3s.", "ci2>", "cn1t>",
    "dd1.", "dei3y>", "deec2ss.", "dee1.", "de2>", "dooh4>",
    "e1>",
    "feil1v.", "fi2>",
    "gni3>", "gai3y.", "ga2>", "gg1.",
    "ht*2.", "hsiug5ct.", "hsi3>",
    "i*1.", "i1y>",
    "ji1d.", "juf1s.", "ju1d.", "jo1d.", "jeh1r.", "jrev1t.", "jsim2t.", "jn1d.", "j1s.",
    "lbaifi6.", "lbai4y.", "lba3>", "lbi3.", "lib2l>", "lc1.", "lufi4y.", "luf3>", "lu2.",
    "lai3>", "lau3>", "la2>", "ll1.",
    "mui3.", "mu*2.", "msi3>", "mm1.",
    "nois4j>", "noix4ct.", "noi3>", "nai3>", "na2>", "nee0.", "ne2>", "nn1.",
    "pihs4>", "pp1.",
    "re2>", "rae0.", "ra2.", "ro2>", "ru2>", "rr1.", "rt1>", "rei3y>",
    "sei3y>", "sis2.", "si2>", "ssen4>", "ss0.", "suo3>", "su*2.", "s*1>", "s0.",
    "tacilp4y.", "ta2>", "tnem4>", "tne3>", "tna3>", "tpir2b.", "tpro2b.", "tcud1.",
    "tpmus2.", "tpec2iv.", "tulo2v.", "tsis0.", "tsi3>", "tt1.",
    "uqi3.", "ugo1.",
    "vis3j>", "vie0.", "vi2>",
    "ylb1>", "yli3y>", "ylp0.", "yl2>", "ygo1.", "yhp1.", "ymo1.", "ypo1.", "yti3>",
    "yte3>", "ytl2.", "yrtsi5.", "yra3>", "yro3>", "yfi3.", "ycn2t>", "yca3>",
    "zi2>", "zy1s.",
];

#[derive(Debug)]
struct Rule {
    ending: String,
    intact_only: bool,
    remove: usize,
    append: &'static str,
    proceed: bool,
}

impl Rule {
    fn parse(rule: &'static str) -> Option<Self> {
        let digit_at = rule.find(|c: char| c.is_ascii_digit())?;
        let head = &rule[..digit_at];
        let (reversed, intact_only) = match head.strip_suffix('*') {
            Some(h) => (h, true),
            None => (head, false),
        };
        let remove = rule[digit_at..digit_at + 1].parse().ok()?;
        let tail = &rule[digit_at + 1..];
        let (append, proceed) = match tail.strip_suffix('>') {
            Some(a) => (a, true),
            None => (tail.strip_suffix('.')?, false),
        };
        Some(Self { ending: reversed.chars().rev().collect(), intact_only, remove, append, proceed })
    }
}

lazy_static! {
    static ref RULES_BY_LAST: HashMap<u8, Vec<Rule>> = {
        let mut map: HashMap<u8, Vec<Rule>> = HashMap::new();
        for rule in LANCASTER_RULES.iter().filter_map(|r| Rule::parse(r)) {
            if let Some(&last) = rule.ending.as_bytes().last() {
                map.entry(last).or_default().push(rule);
            }
        }
        map
    };
}

fn is_vowel(b: u8) -> bool { matches!(b, b'a' | b'e' | b'i' | b'o' | b'u' | b'y') }

/// A stem must keep two chars if it starts with a vowel, otherwise three
/// chars with a vowel among the second or third.
fn acceptable(word: &str, remove: usize) -> bool {
    let bytes = word.as_bytes();
    let kept = bytes.len().saturating_sub(remove);
    if bytes.first().copied().map_or(false, is_vowel) {
        kept >= 2
    } else {
        kept >= 3 && (is_vowel(bytes[1]) || is_vowel(bytes[2]))
    }
}

pub fn lancaster(token: &str) -> String {
    let mut word = token.to_lowercase();
    if !word.is_ascii() {
        return word;
    }
    let mut intact = true;
    'outer: loop {
        let Some(&last) = word.as_bytes().last() else { break };
        let Some(rules) = RULES_BY_LAST.get(&last) else { break };
        for rule in rules {
            if !word.ends_with(&rule.ending) { continue; }
            if rule.intact_only && !intact { continue; }
            if !acceptable(&word, rule.remove) { continue; }
            word.truncate(word.len() - rule.remove);
            word.push_str(rule.append);
            intact = false;
            if rule.proceed {
                continue 'outer;
            }
            break 'outer;
        }
        break;
    }
    word
}

/// Noun suffix detachments, longest first.
const DETACHMENTS: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("ies", "y"),
    ("xes", "x"),
    ("zes", "z"),
    ("men", "man"),
    ("s", ""),
];

pub fn lemmatize(token: &str) -> String {
    if token.chars().count() <= 3 || ["ss", "us", "is"].iter().any(|s| token.ends_with(s)) {
        return token.to_string();
    }
    for (suffix, replacement) in DETACHMENTS {
        if let Some(base) = token.strip_suffix(suffix) {
            return format!("{base}{replacement}");
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lancaster_stems_common_suffixes() {
        assert_eq!(lancaster("maximum"), "maxim");
        assert_eq!(lancaster("presumably"), "presum");
        assert_eq!(lancaster("happiness"), "happy");
    }

    #[test]
    fn lancaster_leaves_short_words() {
        assert_eq!(lancaster("is"), "is");
        assert_eq!(lancaster("a"), "a");
    }

    #[test]
    fn lemmatize_plural_nouns() {
        assert_eq!(lemmatize("cats"), "cat");
        assert_eq!(lemmatize("churches"), "church");
        assert_eq!(lemmatize("ponies"), "pony");
        assert_eq!(lemmatize("women"), "woman");
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("bus"), "bus");
    }
}
