//! ANSI-aware word wrapping.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_ansi_code, strip_ansi, SgrState};
use super::width::{grapheme_width, visible_width};

/// Wraps `text` to `width` columns, breaking on spaces and splitting words
/// longer than a line. Active styles are reopened at the start of every
/// continuation line. Embedded newlines always break.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut state = SgrState::default();
    let mut result = Vec::new();
    for input_line in text.split('\n') {
        let line = format!("{}{input_line}", state.reopen());
        wrap_line(&line, width, &mut result);
        state.apply_all(input_line);
    }

    result
        .into_iter()
        .map(|line| line.trim_end_matches(' ').to_string())
        .collect()
}

/// Right-pads `text` with spaces to exactly `width` visible columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text));
    format!("{text}{}", " ".repeat(padding))
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if visible_width(line) <= width {
        out.push(line.to_string());
        return;
    }

    let mut state = SgrState::default();
    let mut current = String::new();
    let mut current_width = 0;

    for token in tokenize(line) {
        let token_width = visible_width(&token);
        let is_space = token_width > 0 && strip_ansi(&token).chars().all(|ch| ch == ' ');

        if token_width > width && !is_space {
            if current_width > 0 {
                push_line(out, &mut current, &state);
            }
            let mut pieces = break_word(&token, width, &mut state);
            if let Some(last) = pieces.pop() {
                out.append(&mut pieces);
                current_width = visible_width(&last);
                current = last;
            }
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            push_line(out, &mut current, &state);
            current = state.reopen();
            current_width = 0;
            if is_space {
                state.apply_all(&token);
                continue;
            }
        }

        current.push_str(&token);
        current_width += token_width;
        state.apply_all(&token);
    }

    if !current.is_empty() {
        out.push(current);
    }
}

fn push_line(out: &mut Vec<String>, current: &mut String, state: &SgrState) {
    let mut line = current.trim_end_matches(' ').to_string();
    line.push_str(state.line_end_reset());
    out.push(line);
    current.clear();
}

/// Splits into alternating runs of spaces and non-spaces. Escape sequences
/// that end a word stay with it; any others stick to the next visible character.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending_ansi = String::new();
    let mut in_space = false;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(ansi) = extract_ansi_code(text, idx) {
            pending_ansi.push_str(&ansi.code);
            idx += ansi.length;
            continue;
        }

        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != in_space && !current.is_empty() {
            if is_space {
                current.push_str(&pending_ansi);
                pending_ansi.clear();
            }
            tokens.push(std::mem::take(&mut current));
        }
        current.push_str(&pending_ansi);
        pending_ansi.clear();
        current.push(ch);
        in_space = is_space;
        idx += ch.len_utf8();
    }

    current.push_str(&pending_ansi);
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn break_word(word: &str, width: usize, state: &mut SgrState) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = state.reopen();
    let mut current_width = 0;
    let mut idx = 0;

    while idx < word.len() {
        if let Some(ansi) = extract_ansi_code(word, idx) {
            current.push_str(&ansi.code);
            state.apply(&ansi.code);
            idx += ansi.length;
            continue;
        }

        let end = next_escape_or_end(word, idx);
        for grapheme in word[idx..end].graphemes(true) {
            let cell = grapheme_width(grapheme);
            if current_width + cell > width && current_width > 0 {
                current.push_str(state.line_end_reset());
                lines.push(std::mem::take(&mut current));
                current = state.reopen();
                current_width = 0;
            }
            current.push_str(grapheme);
            current_width += cell;
        }
        idx = end;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn next_escape_or_end(text: &str, mut idx: usize) -> usize {
    while idx < text.len() {
        if extract_ansi_code(text, idx).is_some() {
            break;
        }
        idx += text[idx..].chars().next().map_or(1, char::len_utf8);
    }
    idx
}
