//! Document loading and chunking

mod chunker;
mod loader;

pub use chunker::{split_on_separator, TextChunker};
pub use loader::{DocumentLoader, LoadedPage};
