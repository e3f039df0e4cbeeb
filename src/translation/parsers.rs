pub(super) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub(super) fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

pub(super) fn scan_word(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && is_word_byte(bytes[idx]) {
        idx += 1;
    }
    idx
}

pub(super) fn skip_whitespace(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

/// Index of the first line break at or after `start`, or the input length.
pub(super) fn line_end(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && !is_line_break(bytes[idx]) {
        idx += 1;
    }
    idx
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_slash_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'/')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// End (exclusive) of the block comment opened at `start`; comments do not nest.
pub(super) fn block_comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start + 2;
    while idx < bytes.len() {
        if is_block_comment_end(bytes, idx) {
            return Some(idx + 2);
        }
        idx += 1;
    }
    None
}

/// End (exclusive) of the literal opened by `bytes[start]`.
///
/// A doubled quote or a backslash-escaped quote does not terminate the literal. If the text
/// runs out before an unescaped quote, the last escaped quote is taken as the terminator
/// instead; with no such candidate the opening quote is not a literal at all.
pub(super) fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut fallback = None;
    let mut idx = start + 1;
    while idx < bytes.len() {
        let b = bytes[idx];
        if b == b'\\' && idx + 1 < bytes.len() {
            if bytes[idx + 1] == quote {
                fallback = Some(idx + 2);
            }
            idx += 2;
        } else if b == quote {
            if bytes.get(idx + 1) == Some(&quote) {
                fallback = Some(idx + 1);
                idx += 2;
            } else {
                return Some(idx + 1);
            }
        } else {
            idx += 1;
        }
    }
    fallback
}

pub(super) fn matches_keyword(bytes: &[u8], idx: usize, keyword: &[u8]) -> bool {
    bytes.len() >= idx + keyword.len() && &bytes[idx..idx + keyword.len()] == keyword
}

/// Position of the `}` closing a template, searching from `start` without crossing a line break.
pub(super) fn template_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start;
    while idx < bytes.len() && !is_line_break(bytes[idx]) {
        if bytes[idx] == b'}' {
            return Some(idx);
        }
        idx += 1;
    }
    None
}
