// This file is part of xkpass.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Index;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use unicode_normalization::UnicodeNormalization;

const DEFAULT_WORDLIST_DATA: &str = include_str!("../assets/default_wordlist.txt");

#[cfg(test)]
const EXPECTED_SHA256: &str = "9607c2cb2ffd1e5822d405031c2e62b9d3ffac8d272a765f86aa52ca4424c5c6";

pub const DEFAULT_PROVIDER: &str = "default";
pub const DEFAULT_WORDLIST_SIZE: usize = 2048;

static DEFAULT_WORDLIST: OnceLock<WordList> = OnceLock::new();

/// An immutable, non-empty list of distinct candidate words.
///
/// Clones are cheap and share storage.
#[derive(Clone, PartialEq, Eq)]
pub struct WordList {
    words: Arc<[String]>,
    source: Arc<str>,
}

impl WordList {
    /// The embedded word list.
    pub fn builtin() -> Self {
        DEFAULT_WORDLIST
            .get_or_init(|| Self {
                words: DEFAULT_WORDLIST_DATA.lines().map(str::to_owned).collect(),
                source: Arc::from(DEFAULT_PROVIDER),
            })
            .clone()
    }

    /// Builds a list from arbitrary entries. Surrounding whitespace is
    /// trimmed; entries that are blank or contain inner whitespace are
    /// rejected. Duplicates collapse to their first occurrence.
    pub fn from_words<I, W>(source: &str, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        let mut duplicates = 0usize;

        for (i, word) in words.into_iter().enumerate() {
            let word: String = word.into();
            let word: String = word.trim().nfc().collect();
            if word.is_empty() {
                return Err(Error::invalid_wordlist(
                    source,
                    format!("entry {} is blank", i + 1),
                ));
            }
            if word.chars().any(char::is_whitespace) {
                return Err(Error::invalid_wordlist(
                    source,
                    format!("entry {} (\"{}\") contains whitespace", i + 1, word),
                ));
            }
            if seen.insert(word.clone()) {
                unique.push(word);
            } else {
                duplicates += 1;
            }
        }

        if unique.is_empty() {
            return Err(Error::invalid_wordlist(source, "wordlist is empty"));
        }

        if duplicates > 0 {
            log::warn!(
                "Wordlist \"{}\" contains {} duplicate {}; keeping the first occurrence",
                source,
                duplicates,
                if duplicates == 1 { "entry" } else { "entries" }
            );
        }

        Ok(Self {
            words: unique.into(),
            source: Arc::from(source),
        })
    }

    /// Reads one word per line. Line terminators (`\n` or `\r\n`) and
    /// surrounding whitespace are stripped; a blank or whitespace-only line
    /// anywhere is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let spec = path.display().to_string();
        let data = std::fs::read_to_string(path).map_err(|e| Error::invalid_wordlist(&spec, e))?;

        if let Some(line) = data.lines().position(|line| line.trim().is_empty()) {
            return Err(Error::invalid_wordlist(
                &spec,
                format!("line {} is blank", line + 1),
            ));
        }

        let list = Self::from_words(&spec, data.lines())?;
        log::debug!("Loaded {} words from {}", list.len(), spec);
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Where the list came from: a provider name or a file path.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Index<usize> for WordList {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.words[index]
    }
}

impl fmt::Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("source", &self.source)
            .field("len", &self.words.len())
            .finish()
    }
}

pub type Loader = fn() -> Result<WordList>;

fn load_builtin() -> Result<WordList> {
    Ok(WordList::builtin())
}

/// Maps provider names to word list loaders.
///
/// A specifier is looked up here first and only treated as a file path if
/// no provider carries that name. Unknown names are never substituted.
#[derive(Clone)]
pub struct WordlistRegistry {
    providers: BTreeMap<String, Loader>,
}

impl WordlistRegistry {
    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// A registry holding the embedded list under [`DEFAULT_PROVIDER`].
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_PROVIDER, load_builtin);
        registry
    }

    /// Registers `loader` under `name`, returning the loader it replaced.
    pub fn register(&mut self, name: impl Into<String>, loader: Loader) -> Option<Loader> {
        self.providers.insert(name.into(), loader)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn resolve(&self, spec: &str) -> Result<WordList> {
        if let Some(loader) = self.providers.get(spec) {
            let list = loader()?;
            log::debug!("Resolved provider \"{}\" ({} words)", spec, list.len());
            return Ok(list);
        }

        let path = Path::new(spec);
        if path.is_file() {
            return WordList::from_file(path);
        }

        Err(Error::invalid_wordlist(
            spec,
            "neither a registered provider nor a readable file",
        ))
    }
}

impl Default for WordlistRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for WordlistRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
