pub mod entropy;
mod error;
pub mod generator;
pub mod sample;
pub mod wordlist;

pub use entropy::{ChaChaSource, EntropySource};
pub use error::{Error, Result};
pub use generator::{Generator, GeneratorConfig, PassphraseRequest};
pub use wordlist::{WordList, WordlistRegistry};
