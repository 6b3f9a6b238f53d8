//! Line protocol rendering of decoded values.

use std::io::{self, Write};

use common_base::point::append_escaped_string_field;
use influxdb_tsdb::engine::tsm1::value::{FieldType, Value, Values};

use crate::error::ExportError;

/// append_values appends one `<series> <field>=<value> <timestamp>` line per value to buf and
/// returns the number of lines. `field` must already be escaped. Nothing is appended when the
/// values have no line protocol rendering.
pub fn append_values(
    buf: &mut Vec<u8>,
    key: &[u8],
    series: &[u8],
    field: &[u8],
    values: &Values,
) -> Result<usize, ExportError> {
    let mut prefix = Vec::with_capacity(series.len() + field.len() + 2);
    prefix.extend_from_slice(series);
    prefix.push(b' ');
    prefix.extend_from_slice(field);
    prefix.push(b'=');

    let n = match values {
        Values::Float(values) => append_lines(buf, &prefix, values, |b, v| append_float(b, *v))?,
        Values::Integer(values) => append_lines(buf, &prefix, values, |b, v| write!(b, "{}i", v))?,
        Values::Bool(values) => append_lines(buf, &prefix, values, |b, v| write!(b, "{}", v))?,
        Values::String(values) => append_lines(buf, &prefix, values, |b, v| {
            b.push(b'"');
            append_escaped_string_field(b, v);
            b.push(b'"');
            Ok(())
        })?,
        Values::Unsigned(_) => {
            return Err(ExportError::UnsupportedBlockType {
                key: String::from_utf8_lossy(key).into_owned(),
                block_type: values.block_type(),
            })
        }
    };

    Ok(n)
}

fn append_lines<T, F>(
    buf: &mut Vec<u8>,
    prefix: &[u8],
    values: &[Value<T>],
    mut append_value: F,
) -> io::Result<usize>
where
    T: FieldType,
    F: FnMut(&mut Vec<u8>, &T) -> io::Result<()>,
{
    for v in values {
        buf.extend_from_slice(prefix);
        append_value(buf, &v.value)?;
        writeln!(buf, " {}", v.unix_nano)?;
    }
    Ok(values.len())
}

/// append_float writes the shortest decimal that reads back as v. Exponents below -4 or from
/// 6 up use the `d.ddde±XX` form, everything else is written plainly.
pub fn append_float(buf: &mut Vec<u8>, v: f64) -> io::Result<()> {
    if v.is_nan() {
        return buf.write_all(b"NaN");
    }
    if v.is_infinite() {
        return buf.write_all(if v > 0.0 { b"+Inf" } else { b"-Inf" });
    }

    let sci = format!("{:e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or_default()),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= 6 {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(buf, "{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        write!(buf, "{}", v)
    }
}
