use crate::config::StopWords;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref ENGLISH: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Words excluded from the vocabulary.
#[derive(Debug, Clone, Default)]
pub struct StopWordSet {
    words: HashSet<String>,
}

impl StopWordSet {
    pub fn from_config(stop_words: &StopWords) -> Self {
        let words = match stop_words {
            StopWords::English => ENGLISH.iter().map(|w| w.to_string()).collect(),
            StopWords::None => HashSet::new(),
            StopWords::Custom(list) => list.iter().map(|w| w.to_lowercase()).collect(),
        };
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool { self.words.contains(token) }
}

/// Split text into lowercase NFKC word tokens, dropping stop words.
pub fn tokenize(text: &str, stop_words: &StopWordSet) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|t| !stop_words.contains(t))
        .map(str::to_string)
        .collect()
}

/// Tokens plus every run of 2..=`ngram_max` adjacent tokens joined by a space.
pub fn terms(text: &str, stop_words: &StopWordSet, ngram_max: usize) -> Vec<String> {
    let tokens = tokenize(text, stop_words);
    let mut out = tokens.clone();
    for n in 2..=ngram_max {
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}
