//! SGR styling.
//!
//! Every attribute is closed with its own reset code (`22`, `23`, `39`, ...)
//! rather than `0`, so styled fragments nest inside each other.

pub type StyleFn = Box<dyn Fn(&str) -> String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
}

impl Color {
    fn fg_code(self) -> &'static str {
        match self {
            Self::Red => "31",
            Self::Green => "32",
            Self::Yellow => "33",
            Self::Blue => "34",
            Self::Magenta => "35",
            Self::Cyan => "36",
            Self::White => "37",
            Self::Gray => "90",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    fg: Option<Color>,
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            fg: None,
            bold: false,
            dim: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }

    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub const fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::new()
    }

    /// Wraps `text` in the opening and closing sequences for this style.
    pub fn paint(&self, text: &str) -> String {
        if self.is_plain() {
            return text.to_string();
        }

        let mut open = Vec::new();
        let mut close = Vec::new();
        if self.bold || self.dim {
            if self.bold {
                open.push("1");
            }
            if self.dim {
                open.push("2");
            }
            close.push("22");
        }
        if self.italic {
            open.push("3");
            close.push("23");
        }
        if self.underline {
            open.push("4");
            close.push("24");
        }
        if self.strikethrough {
            open.push("9");
            close.push("29");
        }
        if let Some(color) = self.fg {
            open.push(color.fg_code());
            close.push("39");
        }

        format!("\x1b[{}m{text}\x1b[{}m", open.join(";"), close.join(";"))
    }
}

/// Color switch shared by all widgets of one console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn paint(&self, style: Style, text: &str) -> String {
        if self.enabled {
            style.paint(text)
        } else {
            text.to_string()
        }
    }

    pub fn style_fn(&self, style: Style) -> StyleFn {
        let palette = *self;
        Box::new(move |text| palette.paint(style, text))
    }
}
