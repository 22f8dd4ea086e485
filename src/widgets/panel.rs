//! Rounded border box with an optional title in the top edge.

use crate::style::{Palette, Style};
use crate::text::width::visible_width;
use crate::text::wrap::{pad_to_width, wrap_text_with_ansi};

const MIN_INNER_WIDTH: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct Panel {
    title: Option<String>,
    border: Style,
    padding_x: usize,
    fit_content: bool,
}

impl Panel {
    pub fn new() -> Self {
        Self {
            padding_x: 1,
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn border(mut self, style: Style) -> Self {
        self.border = style;
        self
    }

    pub fn padding_x(mut self, padding_x: usize) -> Self {
        self.padding_x = padding_x;
        self
    }

    /// Shrinks the box to its content instead of filling `width`.
    pub fn fit_content(mut self) -> Self {
        self.fit_content = true;
        self
    }

    /// Renders `body` lines inside the border. Lines wider than the box are
    /// wrapped; `width` is the total width including borders.
    pub fn render(&self, body: &[String], width: usize, palette: &Palette) -> Vec<String> {
        let chrome = 2 + self.padding_x * 2;
        let max_inner = width.saturating_sub(chrome).max(MIN_INNER_WIDTH);

        let mut content = Vec::new();
        for line in body {
            content.extend(wrap_text_with_ansi(line, max_inner));
        }

        let inner = if self.fit_content {
            let widest = content.iter().map(|line| visible_width(line)).max().unwrap_or(0);
            let title_width = self.title.as_deref().map_or(0, |title| visible_width(title) + 2);
            widest.max(title_width).clamp(1, max_inner)
        } else {
            max_inner
        };
        let span = inner + self.padding_x * 2;

        let border = |text: &str| palette.paint(self.border, text);
        let mut lines = Vec::with_capacity(content.len() + 2);
        lines.push(self.top_edge(span, palette));

        let pad = " ".repeat(self.padding_x);
        for line in content {
            lines.push(format!(
                "{}{pad}{}{pad}{}",
                border("│"),
                pad_to_width(&line, inner),
                border("│")
            ));
        }

        lines.push(border(&format!("╰{}╯", "─".repeat(span))));
        lines
    }

    fn top_edge(&self, span: usize, palette: &Palette) -> String {
        let border = |text: &str| palette.paint(self.border, text);
        let Some(title) = self.title.as_deref().filter(|title| !title.is_empty()) else {
            return border(&format!("╭{}╮", "─".repeat(span)));
        };

        let label = format!(" {title} ");
        let label_width = visible_width(&label);
        if label_width + 2 > span {
            return border(&format!("╭{}╮", "─".repeat(span)));
        }

        let remaining = span - label_width;
        let left = remaining / 2;
        let right = remaining - left;
        format!(
            "{}{}{}",
            border(&format!("╭{}", "─".repeat(left))),
            palette.paint(self.border.bold(), &label),
            border(&format!("{}╮", "─".repeat(right)))
        )
    }
}
