mod text;

pub use text::TextEmbedding;
