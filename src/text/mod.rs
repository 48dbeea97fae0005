//! Turning raw document text into the tokens counted by word distributions.

mod normalizer;
mod stopwords;
mod tokenizer;

pub use normalizer::Normalizer;
pub use stopwords::{read_stopwords, stopword_set};
pub use tokenizer::Tokenizer;
