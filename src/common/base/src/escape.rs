//! Line-protocol escaping for measurement, tag and field names.

use std::borrow::Cow;

/// Bytes that must be prefixed with a backslash in a field name.
const CODES: [u8; 4] = [b',', b'"', b' ', b'='];

#[inline]
fn needs_escape(c: u8) -> bool {
    CODES.contains(&c)
}

/// bytes escapes the characters in `CODES`. The input is borrowed back untouched
/// when it contains nothing to escape.
pub fn bytes(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.iter().any(|c| needs_escape(*c)) {
        return Cow::Borrowed(input);
    }

    let mut out = Vec::with_capacity(input.len() + 8);
    append_bytes(&mut out, input);
    Cow::Owned(out)
}

pub fn append_bytes(buf: &mut Vec<u8>, input: &[u8]) {
    for &c in input {
        if needs_escape(c) {
            buf.push(b'\\');
        }
        buf.push(c);
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use quickcheck::quickcheck;

    use crate::escape::bytes;

    #[test]
    fn test_escape_bytes() {
        let cases: [(&[u8], &[u8]); 6] = [
            (b"value", b"value"),
            (b"a,b", b"a\\,b"),
            (b"a b", b"a\\ b"),
            (b"a=b", b"a\\=b"),
            (b"\"q\"", b"\\\"q\\\""),
            (b"", b""),
        ];

        for (input, exp) in cases {
            assert_eq!(bytes(input).as_ref(), exp, "escape {:?}", input);
        }
    }

    #[test]
    fn test_escape_borrows_clean_input() {
        assert!(matches!(bytes(b"usage_idle"), Cow::Borrowed(_)));
        assert!(matches!(bytes(b"usage idle"), Cow::Owned(_)));
    }

    quickcheck! {
        fn prop_escape_prefixes_each_code(input: Vec<u8>) -> bool {
            let escaped = bytes(&input);
            let mut rest: &[u8] = &escaped;
            for c in &input {
                if b",\" =".contains(c) {
                    if rest.first() != Some(&b'\\') {
                        return false;
                    }
                    rest = &rest[1..];
                }
                if rest.first() != Some(c) {
                    return false;
                }
                rest = &rest[1..];
            }
            rest.is_empty()
        }
    }
}
