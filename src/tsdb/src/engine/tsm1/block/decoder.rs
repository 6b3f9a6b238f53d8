use crate::engine::tsm1::block::{
    BLOCK_BOOLEAN, BLOCK_FLOAT64, BLOCK_INTEGER, BLOCK_STRING, BLOCK_UNSIGNED,
    DEFAULT_MAX_POINTS_PER_BLOCK, ENCODED_BLOCK_HEADER_SIZE,
};
use crate::engine::tsm1::codec::boolean::BooleanDecoder;
use crate::engine::tsm1::codec::float::FloatDecoder;
use crate::engine::tsm1::codec::integer::IntegerDecoder;
use crate::engine::tsm1::codec::string::StringDecoder;
use crate::engine::tsm1::codec::timestamp::{count_timestamps, TimeDecoder};
use crate::engine::tsm1::codec::unsigned::UnsignedDecoder;
use crate::engine::tsm1::codec::varint::VarInt;
use crate::engine::tsm1::codec::Decoder;
use crate::engine::tsm1::value::{FieldType, Value, Values};

/// decode_block decodes `block` and appends its points to `values`. The block type must
/// match the variant of `values`.
pub fn decode_block(block: &[u8], values: &mut Values) -> anyhow::Result<()> {
    if block.len() <= ENCODED_BLOCK_HEADER_SIZE {
        return Err(anyhow!(
            "decode of short block: got {}, exp {}",
            block.len(),
            ENCODED_BLOCK_HEADER_SIZE
        ));
    }

    let (typ, tb, vb) = unpack_block(block)?;
    if typ != values.block_type() {
        return Err(anyhow!(
            "invalid block type: exp {}, got {}",
            values.block_type(),
            typ
        ));
    }
    let sz = count_timestamps(tb)?;
    let ts_dec = TimeDecoder::new(tb)?;

    match values {
        Values::Float(values) => decode_block_using(sz, ts_dec, FloatDecoder::new(vb)?, values),
        Values::Integer(values) => {
            decode_block_using(sz, ts_dec, IntegerDecoder::new(vb)?, values)
        }
        Values::Bool(values) => decode_block_using(sz, ts_dec, BooleanDecoder::new(vb)?, values),
        Values::String(values) => decode_block_using(sz, ts_dec, StringDecoder::new(vb)?, values),
        Values::Unsigned(values) => {
            decode_block_using(sz, ts_dec, UnsignedDecoder::new(vb)?, values)
        }
    }
}

fn decode_block_using<T>(
    sz: usize,
    mut ts_dec: impl Decoder<i64>,
    mut v_dec: impl Decoder<T>,
    values: &mut Vec<Value<T>>,
) -> anyhow::Result<()>
where
    T: FieldType,
{
    // sz is read from the file and an RLE count is not bounded by the section length
    values.reserve(sz.min(DEFAULT_MAX_POINTS_PER_BLOCK));

    for _ in 0..sz {
        if !ts_dec.next() {
            return match ts_dec.err() {
                Some(err) => Err(anyhow!("read timestamp block error: {}", err)),
                None => Err(anyhow!("can not read all timestamp block")),
            };
        }
        if !v_dec.next() {
            return match v_dec.err() {
                Some(err) => Err(anyhow!("read values block error: {}", err)),
                None => Err(anyhow!("can not read all values block")),
            };
        }

        values.push(Value::new(ts_dec.read(), v_dec.read()));
    }

    Ok(())
}

/// unpack_block splits a block into its type, timestamp section and value section.
pub fn unpack_block(buf: &[u8]) -> anyhow::Result<(u8, &[u8], &[u8])> {
    let (&typ, rest) = buf
        .split_first()
        .ok_or_else(|| anyhow!("unpackBlock: no data found"))?;

    // Unpack the timestamp block length
    let (ts_len, n) = usize::decode_var(rest)
        .ok_or_else(|| anyhow!("unpackBlock: unable to read timestamp block length"))?;
    let rest = &rest[n..];

    // Unpack the timestamp bytes
    if ts_len > rest.len() {
        return Err(anyhow!("unpackBlock: not enough data for timestamp"));
    }
    let (ts, values) = rest.split_at(ts_len);

    Ok((typ, ts, values))
}

/// block_type returns the type of value encoded in a block or an error
/// if the block type is unknown.
pub fn block_type(block: &[u8]) -> anyhow::Result<u8> {
    let typ = *block
        .first()
        .ok_or_else(|| anyhow!("block_type: no data found"))?;
    match typ {
        BLOCK_FLOAT64 | BLOCK_INTEGER | BLOCK_BOOLEAN | BLOCK_STRING | BLOCK_UNSIGNED => Ok(typ),
        _ => Err(anyhow!("unknown block type: {}", typ)),
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tsm1::block::decoder::{block_type, decode_block, unpack_block};
    use crate::engine::tsm1::block::encoder::{encode_block, pack_block};
    use crate::engine::tsm1::block::{
        BLOCK_BOOLEAN, BLOCK_FLOAT64, BLOCK_INTEGER, BLOCK_STRING, BLOCK_UNSIGNED,
    };
    use crate::engine::tsm1::value::{Value, Values};

    fn round_trip(values: Values) {
        let b = encode_block(&values).unwrap();
        assert_eq!(block_type(&b).unwrap(), values.block_type());

        let mut decoded = Values::new(values.block_type()).unwrap();
        decode_block(&b, &mut decoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_block_float_single_bytes() {
        let b = encode_block(&Values::Float(vec![Value::new(0, 1.0)])).unwrap();
        assert_eq!(
            b,
            vec![
                0, 9, 28, 0, 0, 0, 0, 0, 0, 0, 0, 16, 63, 240, 0, 0, 0, 0, 0, 0, 195, 252, 0, 128,
                0, 0, 0, 0, 0, 16
            ]
        );
    }

    #[test]
    fn test_block_round_trip_each_type() {
        let ts = |i: i64| 1_000_000_000 + i * 10_000_000_000;

        round_trip(Values::Float(
            (0..100).map(|i| Value::new(ts(i), i as f64 * 1.5)).collect(),
        ));
        round_trip(Values::Integer(
            (0..100).map(|i| Value::new(ts(i), i * i - 50)).collect(),
        ));
        round_trip(Values::Bool(
            (0..100).map(|i| Value::new(ts(i), i % 3 == 0)).collect(),
        ));
        round_trip(Values::String(
            (0..100)
                .map(|i| Value::new(ts(i), format!("value {}", i).into_bytes()))
                .collect(),
        ));
        round_trip(Values::Unsigned(
            (0..100).map(|i| Value::new(ts(i), u64::MAX - i as u64)).collect(),
        ));
    }

    #[test]
    fn test_block_decode_appends() {
        let b1 = encode_block(&Values::Integer(vec![Value::new(1, 10), Value::new(2, 20)])).unwrap();
        let b2 = encode_block(&Values::Integer(vec![Value::new(3, 30)])).unwrap();

        let mut values = Values::new(BLOCK_INTEGER).unwrap();
        decode_block(&b1, &mut values).unwrap();
        decode_block(&b2, &mut values).unwrap();
        assert_eq!(values.timestamps(), vec![1, 2, 3]);
    }

    #[test]
    fn test_block_encode_no_values() {
        assert!(encode_block(&Values::Float(vec![])).is_err());
    }

    #[test]
    fn test_block_decode_type_mismatch() {
        let b = encode_block(&Values::Bool(vec![Value::new(1, true)])).unwrap();
        let mut values = Values::new(BLOCK_STRING).unwrap();
        assert!(decode_block(&b, &mut values).is_err());
    }

    #[test]
    fn test_block_decode_corrupt() {
        let mut values = Values::new(BLOCK_FLOAT64).unwrap();
        assert!(decode_block(&[BLOCK_FLOAT64], &mut values).is_err());
        // timestamp section length larger than the block
        assert!(decode_block(&[BLOCK_FLOAT64, 50, 1, 2], &mut values).is_err());

        // the value section holds fewer points than the timestamps
        let full = encode_block(&Values::Float(vec![
            Value::new(1, 1.0),
            Value::new(2, 2.5),
            Value::new(3, 3.75),
        ]))
        .unwrap();
        let (_, tb, _) = unpack_block(&full).unwrap();
        let short = encode_block(&Values::Float(vec![Value::new(1, 1.0)])).unwrap();
        let (_, _, vb) = unpack_block(&short).unwrap();
        let b = pack_block(BLOCK_FLOAT64, tb, vb);
        assert!(decode_block(&b, &mut values).is_err());
    }

    /// rle_timestamps returns an RLE section starting at 0 with a delta of 1 repeated count times.
    fn rle_timestamps(count: &[u8]) -> Vec<u8> {
        let mut tb = vec![0x20];
        tb.extend_from_slice(&0u64.to_be_bytes());
        tb.push(1);
        tb.extend_from_slice(count);
        tb
    }

    #[test]
    fn test_block_decode_huge_rle_count() {
        // a repeat count near 2^60 with a single float value
        let tb = rle_timestamps(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x0f]);
        let one = encode_block(&Values::Float(vec![Value::new(0, 1.5)])).unwrap();
        let (_, _, vb) = unpack_block(&one).unwrap();
        let b = pack_block(BLOCK_FLOAT64, &tb, vb);

        let mut values = Values::new(BLOCK_FLOAT64).unwrap();
        assert!(decode_block(&b, &mut values).is_err());
        assert_eq!(values.len(), 1);

        // a matching count still decodes
        let tb = rle_timestamps(&[1]);
        let b = pack_block(BLOCK_FLOAT64, &tb, vb);
        let mut values = Values::new(BLOCK_FLOAT64).unwrap();
        decode_block(&b, &mut values).unwrap();
        assert_eq!(values, Values::Float(vec![Value::new(0, 1.5)]));
    }

    #[test]
    fn test_block_type_unknown() {
        assert!(block_type(&[9, 0]).is_err());
        assert!(block_type(&[]).is_err());
        assert_eq!(block_type(&[BLOCK_BOOLEAN]).unwrap(), BLOCK_BOOLEAN);
        assert_eq!(block_type(&[BLOCK_UNSIGNED]).unwrap(), BLOCK_UNSIGNED);
    }
}
