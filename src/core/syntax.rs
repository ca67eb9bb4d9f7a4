//! Lightweight sentence segmentation and word-class heuristics.
//!
//! Good enough to tell a declarative statement ("The council approved the
//! budget in May.") from a fragment or an exclamation. Not a tagger: a
//! token is verb-like or noun-like by lexicon, suffix and position.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[A-Za-z][A-Za-z'\-]*|\d+(?:[.,]\d+)*%?").unwrap();

    /// Verbs in base form; inflections are derived below
    static ref BASE_VERBS: HashSet<&'static str> = [
        "accept", "achieve", "add", "affect", "agree", "allow", "announce", "appear", "approve",
        "arrive", "ask", "attack", "ban", "become", "begin", "believe", "build", "buy", "call",
        "cause", "change", "claim", "close", "collapse", "come", "confirm", "contain", "continue",
        "cost", "create", "cut", "decide", "decline", "declare", "deny", "destroy", "die", "discover",
        "drop", "earn", "elect", "employ", "end", "establish", "exceed", "expand", "explode", "fall",
        "find", "finish", "found", "gain", "get", "give", "go", "grow", "happen", "hire", "hit", "hold",
        "host", "include", "increase", "introduce", "invade", "invent", "join", "keep", "kill", "know",
        "launch", "lead", "leave", "lose", "make", "measure", "meet", "move", "occur", "offer", "open",
        "orbit", "own", "pass", "pay", "plan", "play", "produce", "provide", "publish", "raise", "reach",
        "receive", "record", "reduce", "release", "remain", "report", "require", "resign", "rise",
        "rule", "run", "say", "see", "sell", "serve", "set", "show", "sign", "spend", "start",
        "state", "stop", "suffer", "support", "take", "tell", "test", "think", "travel", "turn", "use",
        "vote", "want", "win", "work", "write",
    ]
    .into_iter()
    .collect();

    /// Irregular and auxiliary forms not derivable by suffix rules
    static ref VERB_FORMS: HashSet<&'static str> = [
        "am", "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does",
        "did", "done", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
        "became", "began", "begun", "bought", "built", "came", "cost", "cut", "died", "fell", "fallen",
        "found", "gave", "given", "got", "gone", "went", "grew", "grown", "held", "hit", "kept", "knew",
        "known", "led", "left", "lost", "made", "met", "paid", "ran", "rose", "risen", "said", "saw",
        "seen", "sold", "spent", "took", "taken", "told", "thought", "won", "wrote", "written",
    ]
    .into_iter()
    .collect();

    /// Closed-class words that are never nouns or verbs here
    static ref FUNCTION_WORDS: HashSet<&'static str> = [
        "a", "an", "the", "this", "that", "these", "those", "it", "its", "he", "she", "they", "we",
        "you", "i", "him", "her", "them", "us", "me", "my", "his", "our", "their", "your", "who",
        "whom", "whose", "which", "what", "when", "where", "why", "how", "and", "or", "but", "nor",
        "so", "yet", "if", "then", "than", "because", "although", "while", "of", "in", "on", "at",
        "to", "for", "from", "by", "with", "about", "into", "over", "under", "after", "before",
        "between", "through", "during", "without", "within", "against", "among", "per", "as", "not",
        "no", "yes", "all", "some", "any", "each", "every", "many", "much", "more", "most", "few",
        "very", "too", "also", "just", "only", "even", "still", "already", "there", "here", "now",
        "wow", "oh", "hey", "please", "thanks", "okay", "ok", "hello", "hi",
    ]
    .into_iter()
    .collect();

    static ref DETERMINERS: HashSet<&'static str> = [
        "a", "an", "the", "this", "that", "these", "those", "my", "his", "her", "its", "our",
        "their", "your", "some", "many", "every", "each", "all", "no", "several", "few",
    ]
    .into_iter()
    .collect();

    /// Words with verb-looking suffixes that are not verbs
    static ref SUFFIX_EXCEPTIONS: HashSet<&'static str> = [
        "indeed", "hundred", "red", "bed", "shed", "sacred", "naked", "wicked", "kindred", "seed",
        "speed", "thing", "things", "nothing", "something", "anything", "everything", "morning",
        "evening", "building", "buildings", "ceiling", "spring", "string", "king", "ring", "wing",
        "during", "bring", "sing", "sibling", "pudding", "wedding", "meeting", "funding",
    ]
    .into_iter()
    .collect();

    /// Plurals that often follow a noun modifier ("sea levels", "tax years")
    static ref PLURAL_NOUNS: HashSet<&'static str> = [
        "years", "days", "weeks", "months", "hours", "minutes", "times", "miles", "degrees",
        "dollars", "euros", "points", "levels", "members", "cases", "deaths", "rates", "prices",
        "sales", "games", "goods", "records", "results", "rights", "sites", "units", "areas",
    ]
    .into_iter()
    .collect();

    /// Abbreviations whose trailing period does not end a sentence
    static ref ABBREVIATIONS: HashSet<&'static str> = [
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd", "co", "corp",
        "no", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
        "e.g", "i.e", "u.s", "u.k", "u.n", "gen", "gov", "sen", "rep",
    ]
    .into_iter()
    .collect();
}

/// Stems that mark a `-s` token as a plural noun rather than a verb
const PLURAL_NOUN_STEMS: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ism", "ist", "ship", "er", "or", "ian",
];

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ism", "ist", "ance", "ence", "ship", "dom", "hood", "ure",
    "age", "er", "or",
];

/// Split text into trimmed, non-empty sentences.
///
/// A sentence ends at `.`, `!` or `?` (plus closing quotes/brackets)
/// followed by whitespace and an uppercase letter, digit or quote, or at
/// end of text. Line breaks separated by a blank line also end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        if c == '\n' && i + 1 < chars.len() && chars[i + 1].1 == '\n' {
            push_sentence(&mut sentences, &text[start..pos]);
            start = pos;
            i += 1;
            continue;
        }

        if matches!(c, '.' | '!' | '?') {
            // Swallow runs like "?!" or '."'
            let mut end = i;
            while end + 1 < chars.len() && matches!(chars[end + 1].1, '.' | '!' | '?' | '"' | '\'' | ')' | ']') {
                end += 1;
            }
            let boundary = chars[end].0 + chars[end].1.len_utf8();

            let at_end = end + 1 >= chars.len();
            let next_starts_sentence = !at_end
                && chars[end + 1].1.is_whitespace()
                && chars[end + 2..]
                    .iter()
                    .find(|(_, ch)| !ch.is_whitespace())
                    .map(|(_, ch)| ch.is_uppercase() || ch.is_ascii_digit() || matches!(ch, '"' | '\'' | '('))
                    .unwrap_or(true);

            if (at_end || next_starts_sentence) && !(c == '.' && ends_with_abbreviation(&text[start..pos])) {
                push_sentence(&mut sentences, &text[start..boundary]);
                start = boundary;
            }
            i = end + 1;
            continue;
        }

        i += 1;
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let last = before_period
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase();
    // Single capital initials ("J. Smith")
    (last.len() == 1 && last.chars().all(|c| c.is_alphabetic())) || ABBREVIATIONS.contains(last.as_str())
}

/// Word tokens of a sentence (numbers included)
pub fn tokens(sentence: &str) -> Vec<&str> {
    TOKEN.find_iter(sentence).map(|m| m.as_str()).collect()
}

fn is_number(token: &str) -> bool {
    token.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

fn is_base_verb_inflection(lower: &str) -> bool {
    if BASE_VERBS.contains(lower) {
        return true;
    }
    let stems = [
        lower.strip_suffix("es"),
        lower.strip_suffix('s'),
        lower.strip_suffix("ed"),
        lower.strip_suffix('d'),
        lower.strip_suffix("ing"),
    ];
    stems.iter().flatten().any(|stem| {
        BASE_VERBS.contains(*stem)
            || BASE_VERBS.contains(format!("{}e", stem).as_str())
            // Doubled final consonant: "planned", "stopped"
            || (stem.len() > 2 && {
                let mut chars = stem.chars().rev();
                let last = chars.next();
                last == chars.next() && BASE_VERBS.contains(&stem[..stem.len() - 1])
            })
    })
}

/// Whether `token` (at index `position` in `all`) reads as a verb
pub fn is_verb_like(all: &[&str], position: usize) -> bool {
    let token = all[position];
    if is_number(token) {
        return false;
    }
    let lower = token.to_ascii_lowercase();
    let lower = lower.as_str();

    if VERB_FORMS.contains(lower) || is_base_verb_inflection(lower) {
        return true;
    }
    if SUFFIX_EXCEPTIONS.contains(lower) || FUNCTION_WORDS.contains(lower) {
        return false;
    }
    if lower.len() > 4 && lower.ends_with("ed") {
        return true;
    }
    if lower.len() > 5 && lower.ends_with("ing") {
        return true;
    }
    if is_present_tense_after_subject(all, position) {
        return true;
    }
    // Infinitive or modal complement: "to expand", "will expand"
    if position > 0 {
        let prev = all[position - 1].to_ascii_lowercase();
        if matches!(
            prev.as_str(),
            "to" | "will" | "would" | "can" | "could" | "shall" | "should" | "may" | "might" | "must"
        ) && token.chars().all(|c| c.is_ascii_lowercase())
        {
            return true;
        }
    }
    false
}

/// Third-person present directly after its subject: "Water boils",
/// "The Amazon River flows"
fn is_present_tense_after_subject(all: &[&str], position: usize) -> bool {
    if position == 0 {
        return false;
    }
    let token = all[position];
    if token.len() < 4 || !token.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    let Some(stem) = token.strip_suffix('s') else {
        return false;
    };
    if stem.ends_with('s') || stem.ends_with('u') || stem.ends_with('i')
        || PLURAL_NOUNS.contains(token)
        || SUFFIX_EXCEPTIONS.contains(token)
        || FUNCTION_WORDS.contains(token)
        || PLURAL_NOUN_STEMS.iter().any(|s| stem.ends_with(s))
    {
        return false;
    }
    !is_number(all[position - 1]) && is_noun_like(all, position - 1)
}

/// Whether `token` (at index `position` in `all`) reads as a noun or proper noun
pub fn is_noun_like(all: &[&str], position: usize) -> bool {
    let token = all[position];
    if is_number(token) {
        return false;
    }
    let lower = token.to_ascii_lowercase();
    if FUNCTION_WORDS.contains(lower.as_str()) {
        return false;
    }

    let capitalized = token.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
    if capitalized {
        // Sentence-initial capitals are only nouns when not verb-like
        return position > 0 || !is_verb_like(all, position);
    }

    if is_verb_like(all, position) || lower.ends_with("ly") {
        return false;
    }

    let after_determiner = all[..position]
        .iter()
        .rev()
        .take(2)
        .any(|w| DETERMINERS.contains(w.to_ascii_lowercase().as_str()));

    after_determiner
        || NOUN_SUFFIXES.iter().any(|s| lower.len() > s.len() + 2 && lower.ends_with(s))
        || (position > 0 && is_number(all[position - 1]))
}

/// Declarative-statement filter: at least one verb-like and one noun-like token
pub fn has_subject_and_predicate(sentence: &str) -> bool {
    let words = tokens(sentence);
    let has_verb = (0..words.len()).any(|i| is_verb_like(&words, i));
    let has_noun = (0..words.len()).any(|i| is_noun_like(&words, i));
    has_verb && has_noun
}
