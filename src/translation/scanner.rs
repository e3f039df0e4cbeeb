use super::parsers::{
    block_comment_end, is_block_comment_start, is_line_comment_start, is_slash_comment_start,
    is_word_byte, line_end, matches_keyword, quoted_end, scan_word, skip_whitespace,
    template_close,
};

/// Lexical items recognised by the preprocessor. Everything else is plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token<'a> {
    /// `?<digits>`
    IndexParam { text: &'a str, ordinal: usize },
    /// `:word`, `@word`, `$word` (sigil kept)
    NamedParam(&'a str),
    /// Quoted literals, block comments, `--` comments and `::` casts.
    Verbatim,
    /// `//` comment body, without its line break.
    SlashComment(&'a str),
    IfSeq { data: &'a str, other: &'a str },
    Next { name: &'a str, other: &'a str },
}

/// Try to recognise a token starting exactly at `idx`; returns it with its end offset.
pub(super) fn scan_token(sql: &str, idx: usize) -> Option<(Token<'_>, usize)> {
    let bytes = sql.as_bytes();
    match bytes[idx] {
        b'?' => {
            let end = scan_digits(bytes, idx + 1);
            if end == idx + 1 {
                return None;
            }
            let ordinal = sql[idx + 1..end].parse().ok()?;
            Some((
                Token::IndexParam {
                    text: &sql[idx..end],
                    ordinal,
                },
                end,
            ))
        }
        b':' if bytes.get(idx + 1) == Some(&b':') => Some((Token::Verbatim, idx + 2)),
        b':' | b'@' | b'$' => {
            let end = scan_word(bytes, idx + 1);
            (end > idx + 1).then(|| (Token::NamedParam(&sql[idx..end]), end))
        }
        b'\'' | b'"' => quoted_end(bytes, idx).map(|end| (Token::Verbatim, end)),
        b'/' if is_block_comment_start(bytes, idx) => {
            block_comment_end(bytes, idx).map(|end| (Token::Verbatim, end))
        }
        b'/' if is_slash_comment_start(bytes, idx) => {
            let body_end = line_end(bytes, idx);
            let end = match (bytes.get(body_end), bytes.get(body_end + 1)) {
                (Some(b'\r'), Some(b'\n')) => body_end + 2,
                (Some(_), _) => body_end + 1,
                (None, _) => body_end,
            };
            Some((Token::SlashComment(&sql[idx..body_end]), end))
        }
        b'-' if is_line_comment_start(bytes, idx) => Some((Token::Verbatim, line_end(bytes, idx))),
        b'{' => scan_template(sql, idx),
        _ => None,
    }
}

fn scan_digits(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    idx
}

fn scan_template(sql: &str, idx: usize) -> Option<(Token<'_>, usize)> {
    let bytes = sql.as_bytes();
    if matches_keyword(bytes, idx + 1, b"if_seq") {
        let data_start = skip_whitespace(bytes, idx + 7);
        let mut data_end = data_start;
        while data_end < bytes.len() && bytes[data_end] != b',' && bytes[data_end] != b'}' {
            data_end += 1;
        }
        if data_end == data_start {
            return None;
        }
        let close = template_close(bytes, data_end)?;
        return Some((
            Token::IfSeq {
                data: &sql[data_start..data_end],
                other: &sql[data_end..close],
            },
            close + 1,
        ));
    }
    if matches_keyword(bytes, idx + 1, b"next") {
        let name_start = skip_whitespace(bytes, idx + 5);
        if !bytes.get(name_start).copied().is_some_and(is_word_byte) {
            return None;
        }
        let name_end = scan_word(bytes, name_start);
        let close = template_close(bytes, name_end)?;
        return Some((
            Token::Next {
                name: &sql[name_start..name_end],
                other: &sql[name_end..close],
            },
            close + 1,
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_placeholders() {
        assert_eq!(
            scan_token("?12 x", 0),
            Some((
                Token::IndexParam {
                    text: "?12",
                    ordinal: 12
                },
                3
            ))
        );
        assert_eq!(scan_token("@a_1%", 0), Some((Token::NamedParam("@a_1"), 4)));
        assert_eq!(scan_token("? x", 0), None);
        assert_eq!(scan_token(": x", 0), None);
    }

    #[test]
    fn double_colon_is_a_cast() {
        assert_eq!(scan_token("::int", 0), Some((Token::Verbatim, 2)));
    }

    #[test]
    fn slash_comment_consumes_line_break() {
        assert_eq!(
            scan_token("// hi\r\nnext", 0),
            Some((Token::SlashComment("// hi"), 7))
        );
        assert_eq!(scan_token("// end", 0), Some((Token::SlashComment("// end"), 6)));
    }

    #[test]
    fn templates() {
        assert_eq!(
            scan_token("{if_seq  id,} x", 0),
            Some((
                Token::IfSeq {
                    data: "id",
                    other: ","
                },
                13
            ))
        );
        assert_eq!(
            scan_token("{next gen_1 ,}", 0),
            Some((
                Token::Next {
                    name: "gen_1",
                    other: " ,"
                },
                14
            ))
        );
        assert_eq!(scan_token("{if_seq}", 0), None);
        assert_eq!(scan_token("{if_seq  ,}", 0), None);
        assert_eq!(scan_token("{next }", 0), None);
        assert_eq!(scan_token("{other}", 0), None);
    }
}
