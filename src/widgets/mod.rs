//! Block-level layout: bordered panels, tables and markdown.

pub mod markdown;
pub mod panel;
pub mod table;

pub use markdown::{MarkdownRenderer, MarkdownTheme};
pub use panel::Panel;
pub use table::Table;
