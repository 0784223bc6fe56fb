pub mod markdown;

pub use markdown::MarkdownRenderer;
