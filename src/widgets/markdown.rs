//! Markdown to styled terminal lines.
//!
//! Parses GitHub-flavored markdown into an mdast tree and renders each block:
//! headings, paragraphs, lists, fenced code, block quotes, rules and tables.
//! Inline emphasis, code spans and links are styled through [`MarkdownTheme`].

use markdown::{mdast, to_mdast, ParseOptions};

use crate::style::{Color, Palette, Style, StyleFn};
use crate::text::wrap::wrap_text_with_ansi;
use crate::widgets::table::Table;

const HR_MAX_WIDTH: usize = 80;
const CODE_BLOCK_INDENT: &str = "  ";

pub struct MarkdownTheme {
    pub heading: StyleFn,
    pub link: StyleFn,
    pub link_url: StyleFn,
    pub code: StyleFn,
    pub code_block: StyleFn,
    pub code_block_border: StyleFn,
    pub quote: StyleFn,
    pub quote_border: StyleFn,
    pub hr: StyleFn,
    pub list_bullet: StyleFn,
    pub bold: StyleFn,
    pub italic: StyleFn,
    pub strikethrough: StyleFn,
    pub underline: StyleFn,
}

impl MarkdownTheme {
    /// Console colors for assistant replies; a disabled palette yields plain text.
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            heading: palette.style_fn(Style::new().fg(Color::Cyan)),
            link: palette.style_fn(Style::new().fg(Color::Blue)),
            link_url: palette.style_fn(Style::new().dim()),
            code: palette.style_fn(Style::new().fg(Color::Yellow)),
            code_block: palette.style_fn(Style::new().fg(Color::Green)),
            code_block_border: palette.style_fn(Style::new().dim()),
            quote: palette.style_fn(Style::new().fg(Color::Gray)),
            quote_border: palette.style_fn(Style::new().dim()),
            hr: palette.style_fn(Style::new().dim()),
            list_bullet: palette.style_fn(Style::new().fg(Color::Cyan)),
            bold: palette.style_fn(Style::new().bold()),
            italic: palette.style_fn(Style::new().italic()),
            strikethrough: palette.style_fn(Style::new().strikethrough()),
            underline: palette.style_fn(Style::new().underline()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Default,
    Quote,
}

enum ItemLine {
    Own(String),
    Nested(String),
}

pub struct MarkdownRenderer {
    theme: MarkdownTheme,
}

impl MarkdownRenderer {
    pub fn new(theme: MarkdownTheme) -> Self {
        Self { theme }
    }

    pub fn from_palette(palette: &Palette) -> Self {
        Self::new(MarkdownTheme::from_palette(palette))
    }

    /// Renders `text` into lines no wider than `width`.
    ///
    /// Input that fails to parse is wrapped as plain text.
    pub fn render(&self, text: &str, width: usize) -> Vec<String> {
        let width = width.max(1);
        if text.trim().is_empty() {
            return Vec::new();
        }

        let source = text.replace('\t', "   ");
        let nodes = match to_mdast(&source, &ParseOptions::gfm()) {
            Ok(mdast::Node::Root(root)) => root.children,
            Ok(other) => vec![other],
            Err(_) => {
                return source
                    .lines()
                    .flat_map(|line| wrap_text_with_ansi(line, width))
                    .collect();
            }
        };

        let mut rendered = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            rendered.extend(self.render_block(node, width));

            let Some(next) = nodes.get(index + 1) else {
                continue;
            };
            let tight_list = matches!(node, mdast::Node::Paragraph(_))
                && matches!(next, mdast::Node::List(_))
                && !blank_line_between(&source, node, next);
            if !tight_list {
                rendered.push(String::new());
            }
        }

        rendered
            .iter()
            .flat_map(|line| wrap_text_with_ansi(line, width))
            .collect()
    }

    fn render_block(&self, node: &mdast::Node, width: usize) -> Vec<String> {
        match node {
            mdast::Node::Heading(heading) => {
                let text = self.render_inline(&heading.children, InlineKind::Default);
                let styled = match heading.depth {
                    1 => (self.theme.heading)(&(self.theme.bold)(&(self.theme.underline)(&text))),
                    2 => (self.theme.heading)(&(self.theme.bold)(&text)),
                    depth => {
                        let prefix = "#".repeat(usize::from(depth));
                        (self.theme.heading)(&(self.theme.bold)(&format!("{prefix} {text}")))
                    }
                };
                vec![styled]
            }
            mdast::Node::Paragraph(paragraph) => split_lines(
                &self.render_inline(&paragraph.children, InlineKind::Default),
            ),
            mdast::Node::Code(code) => self.render_code(code),
            mdast::Node::List(list) => self.render_list(list, 0),
            mdast::Node::Blockquote(quote) => self.render_blockquote(quote, width),
            mdast::Node::ThematicBreak(_) => {
                vec![(self.theme.hr)(&"─".repeat(width.min(HR_MAX_WIDTH)))]
            }
            mdast::Node::Table(table) => self.render_table(table, width),
            mdast::Node::Html(html) => split_lines(html.value.trim()),
            mdast::Node::Text(text) => split_lines(&text.value),
            _ => Vec::new(),
        }
    }

    fn render_inline(&self, nodes: &[mdast::Node], kind: InlineKind) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                mdast::Node::Text(text) => out.push_str(&self.plain(&text.value, kind)),
                mdast::Node::Paragraph(paragraph) => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&self.render_inline(&paragraph.children, kind));
                }
                mdast::Node::Strong(strong) => {
                    out.push_str(&(self.theme.bold)(&self.render_inline(&strong.children, kind)));
                }
                mdast::Node::Emphasis(emphasis) => {
                    out.push_str(&(self.theme.italic)(
                        &self.render_inline(&emphasis.children, kind),
                    ));
                }
                mdast::Node::Delete(delete) => {
                    out.push_str(&(self.theme.strikethrough)(
                        &self.render_inline(&delete.children, kind),
                    ));
                }
                mdast::Node::InlineCode(code) => out.push_str(&(self.theme.code)(&code.value)),
                mdast::Node::Link(link) => {
                    let label = self.render_inline(&link.children, kind);
                    out.push_str(&(self.theme.link)(&(self.theme.underline)(&label)));

                    let plain = plain_text(&link.children);
                    let href = link.url.as_str();
                    if plain != href && plain != href.strip_prefix("mailto:").unwrap_or(href) {
                        out.push_str(&(self.theme.link_url)(&format!(" ({href})")));
                    }
                }
                mdast::Node::Break(_) => out.push('\n'),
                mdast::Node::Html(html) => out.push_str(&self.plain(&html.value, kind)),
                mdast::Node::Image(image) => {
                    let alt = if image.alt.is_empty() { &image.url } else { &image.alt };
                    out.push_str(&self.plain(alt, kind));
                }
                _ => {}
            }
        }
        out
    }

    fn plain(&self, text: &str, kind: InlineKind) -> String {
        match kind {
            InlineKind::Default => text.to_string(),
            InlineKind::Quote => text
                .split('\n')
                .map(|segment| (self.theme.quote)(&(self.theme.italic)(segment)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn render_code(&self, code: &mdast::Code) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push((self.theme.code_block_border)(&format!(
            "```{}",
            code.lang.as_deref().unwrap_or_default()
        )));
        for line in code.value.split('\n') {
            lines.push(format!("{CODE_BLOCK_INDENT}{}", (self.theme.code_block)(line)));
        }
        lines.push((self.theme.code_block_border)("```"));
        lines
    }

    fn render_list(&self, list: &mdast::List, depth: usize) -> Vec<String> {
        let indent = "  ".repeat(depth);
        let start = list.start.unwrap_or(1);
        let mut lines = Vec::new();

        let items = list.children.iter().filter_map(|node| match node {
            mdast::Node::ListItem(item) => Some(item),
            _ => None,
        });
        for (index, item) in items.enumerate() {
            let bullet = if list.ordered {
                format!("{}. ", start as usize + index)
            } else {
                "- ".to_string()
            };
            let bullet = (self.theme.list_bullet)(&bullet);

            let item_lines = self.render_list_item(item, depth);
            if !matches!(item_lines.first(), Some(ItemLine::Own(_))) {
                lines.push(format!("{indent}{bullet}"));
            }
            for (line_index, line) in item_lines.into_iter().enumerate() {
                match line {
                    ItemLine::Nested(line) => lines.push(line),
                    ItemLine::Own(line) if line_index == 0 => {
                        lines.push(format!("{indent}{bullet}{line}"));
                    }
                    ItemLine::Own(line) => lines.push(format!("{indent}  {line}")),
                }
            }
        }

        lines
    }

    fn render_list_item(&self, item: &mdast::ListItem, depth: usize) -> Vec<ItemLine> {
        let mut lines = Vec::new();
        for node in &item.children {
            match node {
                mdast::Node::List(list) => lines.extend(
                    self.render_list(list, depth + 1)
                        .into_iter()
                        .map(ItemLine::Nested),
                ),
                mdast::Node::Code(code) => {
                    lines.extend(self.render_code(code).into_iter().map(ItemLine::Own));
                }
                mdast::Node::Paragraph(paragraph) => lines.extend(
                    split_lines(&self.render_inline(&paragraph.children, InlineKind::Default))
                        .into_iter()
                        .map(ItemLine::Own),
                ),
                other => {
                    let text = self.render_inline(std::slice::from_ref(other), InlineKind::Default);
                    if !text.is_empty() {
                        lines.extend(split_lines(&text).into_iter().map(ItemLine::Own));
                    }
                }
            }
        }
        lines
    }

    fn render_blockquote(&self, quote: &mdast::Blockquote, width: usize) -> Vec<String> {
        let border = (self.theme.quote_border)("│ ");
        let content_width = width.saturating_sub(2).max(1);
        self.render_inline(&quote.children, InlineKind::Quote)
            .split('\n')
            .flat_map(|line| wrap_text_with_ansi(line, content_width))
            .map(|line| format!("{border}{line}"))
            .collect()
    }

    fn render_table(&self, table: &mdast::Table, width: usize) -> Vec<String> {
        let mut rows = table.children.iter().filter_map(|node| match node {
            mdast::Node::TableRow(row) => Some(row),
            _ => None,
        });
        let Some(header) = rows.next() else {
            return Vec::new();
        };

        let mut widget = Table::new(
            header
                .children
                .iter()
                .map(|cell| (self.theme.bold)(&self.render_cell(cell))),
        )
        .row_separators(true);
        for row in rows {
            widget.add_row(row.children.iter().map(|cell| self.render_cell(cell)));
        }

        widget.render(width, &Palette::plain())
    }

    fn render_cell(&self, cell: &mdast::Node) -> String {
        match cell {
            mdast::Node::TableCell(cell) => self.render_inline(&cell.children, InlineKind::Default),
            other => self.render_inline(std::slice::from_ref(other), InlineKind::Default),
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

fn plain_text(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text(&strong.children)),
            mdast::Node::Emphasis(emphasis) => out.push_str(&plain_text(&emphasis.children)),
            mdast::Node::Delete(delete) => out.push_str(&plain_text(&delete.children)),
            _ => {}
        }
    }
    out
}

fn blank_line_between(source: &str, node: &mdast::Node, next: &mdast::Node) -> bool {
    let (Some(current), Some(following)) = (node.position(), next.position()) else {
        return false;
    };
    let start = current.end.offset.min(source.len());
    let end = following.start.offset.min(source.len());
    if start >= end {
        return false;
    }
    let gap = &source[start..end];
    gap.trim().is_empty() && gap.matches('\n').count() >= 2
}

#[cfg(test)]
mod tests {
    use super::{MarkdownRenderer, MarkdownTheme};
    use crate::style::Palette;

    fn tagged_theme() -> MarkdownTheme {
        MarkdownTheme {
            heading: Box::new(|text| format!("<h>{text}</h>")),
            link: Box::new(|text| format!("<l>{text}</l>")),
            link_url: Box::new(|text| format!("<u>{text}</u>")),
            code: Box::new(|text| format!("`{text}`")),
            code_block: Box::new(|text| format!("<code>{text}</code>")),
            code_block_border: Box::new(|text| format!("<cb>{text}</cb>")),
            quote: Box::new(|text| format!("<q>{text}</q>")),
            quote_border: Box::new(|text| text.to_string()),
            hr: Box::new(|text| format!("<hr>{text}</hr>")),
            list_bullet: Box::new(|text| format!("<b>{text}</b>")),
            bold: Box::new(|text| format!("<b>{text}</b>")),
            italic: Box::new(|text| format!("<i>{text}</i>")),
            strikethrough: Box::new(|text| format!("<s>{text}</s>")),
            underline: Box::new(|text| format!("<u>{text}</u>")),
        }
    }

    fn render(text: &str, width: usize) -> Vec<String> {
        MarkdownRenderer::new(tagged_theme()).render(text, width)
    }

    #[test]
    fn heading_is_followed_by_blank_line() {
        let lines = render("# Title\nParagraph", 40);
        assert_eq!(lines, vec!["<h><b><u>Title</u></b></h>", "", "Paragraph"]);
    }

    #[test]
    fn deep_headings_keep_hash_prefix() {
        let lines = render("### Notes", 40);
        assert_eq!(lines, vec!["<h><b>### Notes</b></h>"]);
    }

    #[test]
    fn inline_styles_nest() {
        let lines = render("plain **bold _both_** `code` ~~gone~~", 80);
        assert_eq!(
            lines,
            vec!["plain <b>bold <i>both</i></b> `code` <s>gone</s>"]
        );
    }

    #[test]
    fn link_shows_url_only_when_label_differs() {
        let lines = render("[x](x)\n\n[docs](https://example.com)", 80);
        assert_eq!(lines[0], "<l><u>x</u></l>");
        assert_eq!(lines[2], "<l><u>docs</u></l><u> (https://example.com)</u>");
    }

    #[test]
    fn lists_render_bullets_numbers_and_nesting() {
        let lines = render("- one\n  - inner\n- two\n\n3. three\n4. four", 80);
        assert_eq!(
            lines,
            vec![
                "<b>- </b>one",
                "  <b>- </b>inner",
                "<b>- </b>two",
                "",
                "<b>3. </b>three",
                "<b>4. </b>four",
            ]
        );
    }

    #[test]
    fn paragraph_directly_before_list_stays_tight() {
        let lines = render("Steps:\n- a\n- b", 80);
        assert_eq!(lines, vec!["Steps:", "<b>- </b>a", "<b>- </b>b"]);
    }

    #[test]
    fn code_block_is_fenced_and_indented() {
        let lines = render("```rust\nfn main() {}\n```", 80);
        assert_eq!(
            lines,
            vec![
                "<cb>```rust</cb>",
                "  <code>fn main() {}</code>",
                "<cb>```</cb>",
            ]
        );
    }

    #[test]
    fn blockquote_prefixes_each_line() {
        let lines = render("> quoted text", 80);
        assert_eq!(lines, vec!["│ <q><i>quoted text</i></q>"]);
    }

    #[test]
    fn rule_is_capped_at_eighty_columns() {
        let lines = render("---", 200);
        assert_eq!(lines, vec![format!("<hr>{}</hr>", "─".repeat(80))]);
    }

    #[test]
    fn table_uses_box_borders() {
        let lines = MarkdownRenderer::from_palette(&Palette::plain())
            .render("| a | b |\n| - | - |\n| c | d |\n| e | f |", 80);
        assert_eq!(
            lines,
            vec![
                "┌───┬───┐",
                "│ a │ b │",
                "├───┼───┤",
                "│ c │ d │",
                "├───┼───┤",
                "│ e │ f │",
                "└───┴───┘",
            ]
        );
    }

    #[test]
    fn long_paragraphs_wrap_to_width() {
        let lines = MarkdownRenderer::from_palette(&Palette::plain())
            .render("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn blank_input_renders_nothing() {
        assert!(render("  \n ", 40).is_empty());
    }
}
