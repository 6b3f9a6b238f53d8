/// KEY_FIELD_SEPARATOR separates the series key from the field name in the composite key
/// that identifies a specific field in series
pub const KEY_FIELD_SEPARATOR: &'static str = "#!~#";

/// series_and_field_from_composite_key returns the series key and the field key extracted from the composite key.
/// A key without separator is returned whole as the series key with an empty field.
pub fn series_and_field_from_composite_key(key: &[u8]) -> (&[u8], &[u8]) {
    let sep = KEY_FIELD_SEPARATOR.as_bytes();
    match key.windows(sep.len()).position(|w| w == sep) {
        Some(i) => (&key[..i], &key[i + sep.len()..]),
        None => (key, &[]),
    }
}

/// append_escaped_string_field appends `s` with backslashes and double quotes escaped,
/// the form a string field value takes inside its quotes.
pub fn append_escaped_string_field(buf: &mut Vec<u8>, s: &[u8]) {
    buf.reserve(s.len());
    for &c in s {
        match c {
            b'\\' | b'"' => {
                buf.push(b'\\');
                buf.push(c);
            }
            _ => buf.push(c),
        }
    }
}
