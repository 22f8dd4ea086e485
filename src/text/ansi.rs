//! Escape sequence scanning and SGR state tracking.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode {
    pub code: String,
    pub length: usize,
}

/// Returns the CSI or OSC sequence starting at byte `pos`, if any.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    let end = match bytes.get(pos + 1)? {
        b'[' => (pos + 2..bytes.len()).find(|&idx| (0x40..=0x7e).contains(&bytes[idx]))? + 1,
        b']' => osc_end(bytes, pos + 2)?,
        _ => return None,
    };

    Some(AnsiCode {
        code: input[pos..end].to_string(),
        length: end - pos,
    })
}

fn osc_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(ansi) = extract_ansi_code(input, idx) {
            idx += ansi.length;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// Tracks which SGR attributes are open so wrapped lines can reopen them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgrState {
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    fg: Option<String>,
}

impl SgrState {
    pub fn apply(&mut self, code: &str) {
        let Some(params) = code
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };

        if params.is_empty() {
            *self = Self::default();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let value = parts[idx].parse::<u16>().unwrap_or(0);
            match value {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                9 => self.strikethrough = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                29 => self.strikethrough = false,
                30..=37 | 90..=97 => self.fg = Some(value.to_string()),
                38 if parts.get(idx + 1) == Some(&"5") && idx + 2 < parts.len() => {
                    self.fg = Some(parts[idx..=idx + 2].join(";"));
                    idx += 2;
                }
                38 if parts.get(idx + 1) == Some(&"2") && idx + 4 < parts.len() => {
                    self.fg = Some(parts[idx..=idx + 4].join(";"));
                    idx += 4;
                }
                39 => self.fg = None,
                _ => {}
            }
            idx += 1;
        }
    }

    /// Feeds every SGR sequence found in `text`.
    pub fn apply_all(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(ansi) = extract_ansi_code(text, idx) {
                self.apply(&ansi.code);
                idx += ansi.length;
            } else {
                idx += text[idx..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    /// Sequence that reopens the current attributes on a fresh line.
    pub fn reopen(&self) -> String {
        let mut codes: Vec<&str> = Vec::new();
        if self.bold {
            codes.push("1");
        }
        if self.dim {
            codes.push("2");
        }
        if self.italic {
            codes.push("3");
        }
        if self.underline {
            codes.push("4");
        }
        if self.strikethrough {
            codes.push("9");
        }
        if let Some(fg) = self.fg.as_deref() {
            codes.push(fg);
        }

        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }

    /// Underline would otherwise bleed into the padding after a line break.
    pub fn line_end_reset(&self) -> &'static str {
        if self.underline {
            "\x1b[24m"
        } else {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_ansi_code, strip_ansi, SgrState};

    #[test]
    fn extracts_csi_and_osc_sequences() {
        let csi = extract_ansi_code("\x1b[1;31mred", 0).expect("csi");
        assert_eq!(csi.code, "\x1b[1;31m");
        assert_eq!(csi.length, 7);

        let osc = extract_ansi_code("\x1b]8;;https://x\x07link", 0).expect("osc");
        assert_eq!(osc.length, "\x1b]8;;https://x\x07".len());

        assert!(extract_ansi_code("plain", 0).is_none());
        assert!(extract_ansi_code("\x1b[31", 0).is_none());
    }

    #[test]
    fn strip_removes_all_sequences() {
        assert_eq!(strip_ansi("\x1b[1mbold\x1b[22m and \x1b]8;;u\x1b\\x"), "bold and x");
    }

    #[test]
    fn tracker_reopens_active_attributes() {
        let mut state = SgrState::default();
        state.apply_all("\x1b[1;36mhead\x1b[3m");
        assert_eq!(state.reopen(), "\x1b[1;3;36m");

        state.apply("\x1b[22;39m");
        assert_eq!(state.reopen(), "\x1b[3m");

        state.apply("\x1b[0m");
        assert_eq!(state.reopen(), "");
    }

    #[test]
    fn underline_needs_line_end_reset() {
        let mut state = SgrState::default();
        state.apply("\x1b[4m");
        assert_eq!(state.line_end_reset(), "\x1b[24m");
    }
}
