//! ANSI console rendering for the `chatlog` terminal chat client.
//!
//! Everything here is pure: text in, styled lines out. Writing to the terminal
//! and reading input belong to the caller.
//!
//! # Overview
//! - [`Style`] and [`Palette`] produce SGR-wrapped text; a disabled palette
//!   returns text untouched (`NO_COLOR`).
//! - [`visible_width`] and [`wrap_text_with_ansi`] measure and wrap styled text.
//! - [`Panel`], [`Table`] and [`MarkdownRenderer`] lay out whole blocks.

pub mod config;
pub mod style;
pub mod text;
pub mod widgets;

pub use crate::config::RenderConfig;
pub use crate::style::{Color, Palette, Style, StyleFn};
pub use crate::text::ansi::strip_ansi;
pub use crate::text::width::{grapheme_width, visible_width};
pub use crate::text::wrap::{pad_to_width, wrap_text_with_ansi};
pub use crate::widgets::{MarkdownRenderer, MarkdownTheme, Panel, Table};
