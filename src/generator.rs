use crate::entropy::{ChaChaSource, EntropySource};
use crate::error::{Error, Result};
use crate::sample;
use crate::wordlist::{WordList, WordlistRegistry};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

pub const DEFAULT_WORD_COUNT: usize = 4;
pub const MIN_SAFE_WORD_COUNT: usize = 3;

/// `10^DIGITS_PER_DRAW` is the largest power of ten that fits in a `u64`.
/// Wider suffixes are built from several independent draws.
pub const DIGITS_PER_DRAW: u32 = 19;

/// How to build a [`Generator`]. Both fields fall back to the built-in
/// defaults when left unset.
#[derive(Clone, Default)]
pub struct GeneratorConfig {
    /// A registered provider name or a path to a word-per-line file.
    pub wordlist: Option<String>,
    pub entropy: Option<Arc<dyn EntropySource>>,
}

impl GeneratorConfig {
    pub fn with_wordlist(mut self, spec: impl Into<String>) -> Self {
        self.wordlist = Some(spec.into());
        self
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = Some(entropy);
        self
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("wordlist", &self.wordlist)
            .field("entropy", &self.entropy.as_ref().map(|_| ".."))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassphraseRequest {
    pub words: usize,
    /// Width of the numeric suffix; 0 means no suffix.
    pub digits: u32,
}

impl PassphraseRequest {
    pub fn new(words: usize) -> Self {
        Self { words, digits: 0 }
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }
}

impl Default for PassphraseRequest {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_COUNT)
    }
}

#[derive(Clone)]
pub struct Generator {
    words: WordList,
    entropy: Arc<dyn EntropySource>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        Self::with_registry(config, &WordlistRegistry::builtin())
    }

    pub fn with_registry(config: GeneratorConfig, registry: &WordlistRegistry) -> Result<Self> {
        let words = match config.wordlist.as_deref() {
            Some(spec) => registry.resolve(spec)?,
            None => WordList::builtin(),
        };

        let entropy: Arc<dyn EntropySource> = match config.entropy {
            Some(entropy) => entropy,
            None => Arc::new(ChaChaSource::from_os()?),
        };

        Ok(Self::from_parts(words, entropy))
    }

    pub fn from_parts(words: WordList, entropy: Arc<dyn EntropySource>) -> Self {
        Self { words, entropy }
    }

    pub fn wordlist(&self) -> &WordList {
        &self.words
    }

    /// Draws `request.words` distinct words in random order, capitalizes
    /// each and joins them without a separator. A zero-padded random number
    /// of `request.digits` digits is appended last when requested.
    pub fn produce(&self, request: &PassphraseRequest) -> Result<Zeroizing<String>> {
        if request.words == 0 {
            return Err(Error::InvalidArgument("word count must be at least 1".into()));
        }

        if request.words < MIN_SAFE_WORD_COUNT {
            log::warn!(
                "Generating a passphrase of {} {}; fewer than {} words is weak",
                request.words,
                if request.words == 1 { "word" } else { "words" },
                MIN_SAFE_WORD_COUNT
            );
        }

        let mut picks =
            sample::choose_distinct(self.entropy.as_ref(), self.words.len(), request.words)?;
        self.entropy.shuffle(&mut picks)?;

        // The zeroizing buffer must never reallocate.
        let capacity = picks
            .iter()
            .map(|&index| capitalized_len(&self.words[index]))
            .sum::<usize>()
            + request.digits as usize;
        let mut passphrase = Zeroizing::new(String::with_capacity(capacity));

        for &index in &picks {
            push_capitalized(&mut passphrase, &self.words[index]);
        }

        if request.digits > 0 {
            let suffix = self.draw_digits(request.digits)?;
            push_capitalized(&mut passphrase, &suffix);
        }

        Ok(passphrase)
    }

    /// A uniformly random number in `[0, 10^digits)`, zero-padded to
    /// `digits` characters. Each chunk of up to [`DIGITS_PER_DRAW`] digits
    /// is an independent draw, so the concatenation stays uniform.
    fn draw_digits(&self, digits: u32) -> Result<Zeroizing<String>> {
        let mut suffix = Zeroizing::new(String::with_capacity(digits as usize));
        let mut remaining = digits;

        while remaining > 0 {
            let width = remaining.min(DIGITS_PER_DRAW);
            let value = self.entropy.below(10u64.pow(width))?;
            let chunk = Zeroizing::new(format!("{:0width$}", value, width = width as usize));
            suffix.push_str(&chunk);
            remaining -= width;
        }

        Ok(suffix)
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

fn capitalized_len(component: &str) -> usize {
    let mut chars = component.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().map(char::len_utf8).sum::<usize>() + chars.as_str().len()
        }
        None => 0,
    }
}

fn push_capitalized(out: &mut String, component: &str) {
    let mut chars = component.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}
