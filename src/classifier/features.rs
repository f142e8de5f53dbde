//! Character n-gram feature extraction
//!
//! Word-boundary-aware character n-grams: every whitespace-delimited token is
//! padded with one space on each side before windows are taken, so a feature
//! never spans two tokens but still records where a token starts and ends.
//! Case and punctuation are kept because they are the stylistic signal.

use rustc_hash::FxHashMap;

/// Per-document n-gram counts.
pub type NgramCounts = FxHashMap<String, u32>;

/// Extracts padded character n-grams of length `min_n..=max_n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharNgramExtractor {
    min_n: usize,
    max_n: usize,
}

impl CharNgramExtractor {
    /// Caller guarantees `1 <= min_n <= max_n` (see `Config::validate`).
    pub fn new(min_n: usize, max_n: usize) -> Self {
        Self { min_n, max_n }
    }

    pub fn range(&self) -> (usize, usize) {
        (self.min_n, self.max_n)
    }

    /// Count every n-gram in `text`.
    pub fn extract(&self, text: &str) -> NgramCounts {
        let mut counts = NgramCounts::default();
        self.for_each_ngram(text, |gram| {
            *counts.entry(gram.iter().collect()).or_insert(0) += 1;
        });
        counts
    }

    /// All n-grams in emission order, duplicates included.
    pub fn ngrams(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.for_each_ngram(text, |gram| out.push(gram.iter().collect()));
        out
    }

    fn for_each_ngram(&self, text: &str, mut emit: impl FnMut(&[char])) {
        let mut padded: Vec<char> = Vec::new();

        for word in text.split_whitespace() {
            padded.clear();
            padded.push(' ');
            padded.extend(word.chars());
            padded.push(' ');
            let len = padded.len();

            for n in self.min_n..=self.max_n {
                let mut offset = 0;
                emit(&padded[..n.min(len)]);
                while offset + n < len {
                    offset += 1;
                    emit(&padded[offset..offset + n]);
                }
                // A padded token no longer than n was emitted whole; longer orders add nothing
                if offset == 0 {
                    break;
                }
            }
        }
    }
}

/// Term -> column mapping, sorted lexicographically.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Vocabulary {
    /// Keep terms that occur in at least `min_df` documents.
    pub fn build(documents: &[NgramCounts], min_df: usize) -> Self {
        let mut document_frequency: FxHashMap<&str, usize> = FxHashMap::default();
        for doc in documents {
            for term in doc.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<String> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= min_df)
            .map(|(term, _)| term.to_string())
            .collect();
        terms.sort_unstable();

        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        Self { terms, index }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    /// Sparse `(column, count)` pairs for known terms, in column order.
    pub fn vectorize(&self, counts: &NgramCounts) -> Vec<(usize, f64)> {
        let mut row: Vec<(usize, f64)> = counts
            .iter()
            .filter_map(|(term, &count)| self.index_of(term).map(|i| (i, f64::from(count))))
            .collect();
        row.sort_unstable_by_key(|&(i, _)| i);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundary_padding() {
        let extractor = CharNgramExtractor::new(3, 3);
        assert_eq!(extractor.ngrams("abc"), vec![" ab", "abc", "bc "]);
    }

    #[test]
    fn test_ngrams_never_span_tokens() {
        let extractor = CharNgramExtractor::new(3, 5);
        let grams = extractor.ngrams("ab cd");
        assert!(grams.iter().all(|g| !g.contains("b c")));
        assert!(grams.contains(&" ab ".to_string()));
        assert!(grams.contains(&" cd ".to_string()));
    }

    #[test]
    fn test_short_token_counted_once() {
        // " a " has length 3: emitted at n=3, and no longer orders are tried
        let extractor = CharNgramExtractor::new(3, 5);
        assert_eq!(extractor.ngrams("a"), vec![" a "]);

        // " I'm " has length 5: n=3 gives 3 windows, n=4 gives 2, n=5 gives the whole token
        let grams = extractor.ngrams("I'm");
        assert_eq!(grams, vec![" I'", "I'm", "'m ", " I'm", "I'm ", " I'm "]);
    }

    #[test]
    fn test_token_shorter_than_min_n() {
        let extractor = CharNgramExtractor::new(4, 5);
        // " a " is shorter than 4 and is still emitted whole once
        assert_eq!(extractor.ngrams("a"), vec![" a "]);
    }

    #[test]
    fn test_case_sensitive_counts() {
        let extractor = CharNgramExtractor::new(3, 3);
        let counts = extractor.extract("LOL lol lol");
        assert_eq!(counts.get(" lo"), Some(&2));
        assert_eq!(counts.get(" LO"), Some(&1));
    }

    #[test]
    fn test_unicode_windows_are_by_char() {
        let extractor = CharNgramExtractor::new(3, 3);
        let grams = extractor.ngrams("🚜ok");
        assert_eq!(grams, vec![" 🚜o", "🚜ok", "ok "]);
    }

    #[test]
    fn test_whitespace_runs_are_ignored() {
        let extractor = CharNgramExtractor::new(3, 4);
        assert_eq!(extractor.ngrams("hi \n\t there"), extractor.ngrams("hi there"));
        assert!(extractor.ngrams("   ").is_empty());
    }

    #[test]
    fn test_vocabulary_min_df_and_order() {
        let extractor = CharNgramExtractor::new(3, 3);
        let docs = vec![
            extractor.extract("cat"),
            extractor.extract("cat hat"),
            extractor.extract("dog"),
        ];

        let vocab = Vocabulary::build(&docs, 2);
        // " ca", "at ", "cat" appear in two documents; "at " also in "hat"
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.term(0), Some(" ca"));
        assert_eq!(vocab.term(1), Some("at "));
        assert_eq!(vocab.term(2), Some("cat"));
        assert_eq!(vocab.index_of("dog"), None);

        let row = vocab.vectorize(&extractor.extract("cat cat dog"));
        assert_eq!(row, vec![(0, 2.0), (1, 2.0), (2, 2.0)]);
    }

    #[test]
    fn test_vocabulary_min_df_one_keeps_everything() {
        let extractor = CharNgramExtractor::new(3, 3);
        let docs = vec![extractor.extract("abc")];
        assert_eq!(Vocabulary::build(&docs, 1).len(), 3);
        assert!(Vocabulary::build(&docs, 2).is_empty());
    }
}
