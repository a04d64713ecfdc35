pub mod clock;
pub mod extractor;
