//! Boxed table with a header row and optional title.

use crate::style::{Palette, Style};
use crate::text::width::visible_width;
use crate::text::wrap::{pad_to_width, wrap_text_with_ansi};

#[derive(Debug, Clone, Default)]
pub struct Table {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    header_style: Style,
    column_styles: Vec<Style>,
    border: Style,
    row_separators: bool,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn header_style(mut self, style: Style) -> Self {
        self.header_style = style;
        self
    }

    /// Style for body cells of column `index`.
    pub fn column_style(mut self, index: usize, style: Style) -> Self {
        if self.column_styles.len() <= index {
            self.column_styles.resize(index + 1, Style::new());
        }
        self.column_styles[index] = style;
        self
    }

    pub fn border(mut self, style: Style) -> Self {
        self.border = style;
        self
    }

    pub fn row_separators(mut self, enabled: bool) -> Self {
        self.row_separators = enabled;
        self
    }

    /// Missing cells render empty; extra cells are dropped.
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_row(cells);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self, width: usize, palette: &Palette) -> Vec<String> {
        let columns = self.headers.len();
        if columns == 0 {
            return Vec::new();
        }

        let widths = self.column_widths(width);
        let border = |text: &str| palette.paint(self.border, text);
        let rule = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            border(&format!("{left}─{}─{right}", cells.join(&format!("─{mid}─"))))
        };

        let mut lines = Vec::new();
        if let Some(title) = self.title.as_deref() {
            let total = widths.iter().sum::<usize>() + 3 * columns + 1;
            let title = palette.paint(Style::new().italic(), title);
            let indent = total.saturating_sub(visible_width(&title)) / 2;
            lines.push(format!("{}{title}", " ".repeat(indent)));
        }

        lines.push(rule("┌", "┬", "┐"));
        let header_cells: Vec<String> = self
            .headers
            .iter()
            .map(|header| palette.paint(self.header_style, header))
            .collect();
        self.push_row(&mut lines, &header_cells, &widths, palette);
        lines.push(rule("├", "┼", "┤"));

        for (index, row) in self.rows.iter().enumerate() {
            let styled: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let style = self.column_styles.get(col).copied().unwrap_or_default();
                    palette.paint(style, cell)
                })
                .collect();
            self.push_row(&mut lines, &styled, &widths, palette);
            if self.row_separators && index + 1 < self.rows.len() {
                lines.push(rule("├", "┼", "┤"));
            }
        }

        lines.push(rule("└", "┴", "┘"));
        lines
    }

    fn push_row(&self, lines: &mut Vec<String>, cells: &[String], widths: &[usize], palette: &Palette) {
        let wrapped: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let cell = cells.get(col).map(String::as_str).unwrap_or("");
                wrap_text_with_ansi(cell, *width)
            })
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let bar = palette.paint(self.border, "│");

        for line_index in 0..height {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let text = wrapped[col].get(line_index).map(String::as_str).unwrap_or("");
                    pad_to_width(text, *width)
                })
                .collect();
            lines.push(format!("{bar} {} {bar}", parts.join(&format!(" {bar} "))));
        }
    }

    /// Natural widths when they fit; otherwise the widest column gives up a
    /// cell at a time until the table fits `width`.
    fn column_widths(&self, width: usize) -> Vec<usize> {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = (0..columns)
            .map(|col| {
                let header = visible_width(&self.headers[col]);
                self.rows
                    .iter()
                    .map(|row| row.get(col).map_or(0, |cell| visible_width(cell)))
                    .fold(header, usize::max)
                    .max(1)
            })
            .collect();

        let available = width.saturating_sub(3 * columns + 1).max(columns);
        while widths.iter().sum::<usize>() > available {
            let Some((widest, _)) = widths
                .iter()
                .enumerate()
                .filter(|(_, width)| **width > 1)
                .max_by_key(|(index, width)| (**width, std::cmp::Reverse(*index)))
            else {
                break;
            };
            widths[widest] -= 1;
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::style::Palette;
    use crate::text::width::visible_width;

    #[test]
    fn renders_header_separator_and_rows() {
        let table = Table::new(["Model Name"])
            .with_row(["gpt-4o-mini"])
            .with_row(["o1-mini"]);
        let lines = table.render(80, &Palette::plain());

        assert_eq!(
            lines,
            vec![
                "┌─────────────┐",
                "│ Model Name  │",
                "├─────────────┤",
                "│ gpt-4o-mini │",
                "│ o1-mini     │",
                "└─────────────┘",
            ]
        );
    }

    #[test]
    fn title_is_centered_above_table() {
        let table = Table::new(["a", "b"]).title("T").with_row(["1", "2"]);
        let lines = table.render(80, &Palette::plain());
        assert_eq!(lines[0], "    T");
        assert_eq!(lines[1], "┌───┬───┐");
    }

    #[test]
    fn shrinks_widest_column_and_wraps() {
        let table = Table::new(["Command", "Description"])
            .with_row(["/help", "Show the list of available commands and what they do."]);
        let lines = table.render(30, &Palette::plain());

        assert!(lines.len() > 5);
        assert!(lines.iter().all(|line| visible_width(line) <= 30), "{lines:#?}");
        assert!(lines[1].starts_with("│ Command │ Description"));
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let mut table = Table::new(["a", "b"]);
        table.add_row(["only"]);
        let lines = table.render(40, &Palette::plain());
        assert_eq!(lines[3], "│ only │   │");
    }
}
