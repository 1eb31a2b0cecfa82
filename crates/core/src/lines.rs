use crate::error::{Result, TallyError};
use std::io::BufRead;

/// Feed every line of `reader` to `handle` as raw bytes with its 1-based number.
///
/// Lines end at `\n`; a trailing `\r` is dropped. Input is never required to
/// be UTF-8 as a whole, only the fields a caller decodes with [`decode_field`].
pub fn for_each_line<R, F>(mut reader: R, source: &str, mut handle: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| TallyError::io(source, err))?;
        if read == 0 {
            return Ok(());
        }
        line_no += 1;

        let mut line = buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        handle(line_no, line)?;
    }
}

pub fn split_on(line: &[u8], sep: u8) -> Vec<&[u8]> {
    line.split(|b| *b == sep).collect()
}

/// Split on runs of ASCII whitespace.
///
/// Leading or trailing whitespace yields an empty first or last field, so an
/// indented line shifts its columns by one.
pub fn split_whitespace_runs(line: &[u8]) -> Vec<&[u8]> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx < line.len() {
        if line[idx].is_ascii_whitespace() {
            fields.push(&line[start..idx]);
            while idx < line.len() && line[idx].is_ascii_whitespace() {
                idx += 1;
            }
            start = idx;
        } else {
            idx += 1;
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Decode one field as UTF-8; bad bytes are a parse error naming the field
pub fn decode_field<'a>(field: &'a [u8], what: &str, source: &str, line_no: usize) -> Result<&'a str> {
    std::str::from_utf8(field).map_err(|err| {
        TallyError::parse(source, line_no, format!("{what} is not valid UTF-8: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(input: &[u8]) -> Vec<(usize, Vec<u8>)> {
        let mut seen = Vec::new();
        for_each_line(input, "mem", |line_no, line| {
            seen.push((line_no, line.to_vec()));
            Ok(())
        })
        .unwrap();
        seen
    }

    #[test]
    fn strips_line_endings() {
        let seen = collect(b"a,b\r\nc\n\nd");
        assert_eq!(
            seen,
            vec![
                (1, b"a,b".to_vec()),
                (2, b"c".to_vec()),
                (3, Vec::new()),
                (4, b"d".to_vec()),
            ]
        );
    }

    #[test]
    fn passes_non_utf8_bytes_through() {
        let seen = collect(b"1,1,/p,\x82\xa0\n");
        assert_eq!(seen[0].1, b"1,1,/p,\x82\xa0".to_vec());
    }

    #[test]
    fn whitespace_runs_keep_edge_fields() {
        let plain: Vec<&[u8]> = vec![&b"x"[..], &b"1"[..], &b"100"[..], &b"/p"[..]];
        assert_eq!(split_whitespace_runs(b"x 1\t 100  /p"), plain);

        let indented: Vec<&[u8]> = vec![&b""[..], &b"x"[..], &b"1"[..], &b"100"[..]];
        assert_eq!(split_whitespace_runs(b"   x 1 100"), indented);

        let empty: Vec<&[u8]> = vec![&b""[..]];
        assert_eq!(split_whitespace_runs(b""), empty);
    }

    #[test]
    fn bad_utf8_field_is_a_parse_error() {
        let err = decode_field(b"\x82\xa0", "path", "a.csv", 3).unwrap_err();
        assert!(matches!(err, TallyError::Parse { line: 3, .. }));
        assert_eq!(decode_field(b"/p", "path", "a.csv", 3).unwrap(), "/p");
    }
}
