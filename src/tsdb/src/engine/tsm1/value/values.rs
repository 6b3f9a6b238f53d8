use crate::engine::tsm1::block::{
    BLOCK_BOOLEAN, BLOCK_FLOAT64, BLOCK_INTEGER, BLOCK_STRING, BLOCK_UNSIGNED,
};
use crate::engine::tsm1::value::{
    BoolValue, FloatValue, IntegerValue, StringValue, UnsignedValue,
};

/// Values holds the points of one key. Each variant matches one block type.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float(Vec<FloatValue>),
    Integer(Vec<IntegerValue>),
    Bool(Vec<BoolValue>),
    String(Vec<StringValue>),
    Unsigned(Vec<UnsignedValue>),
}

macro_rules! with_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::Float($v) => $body,
            Values::Integer($v) => $body,
            Values::Bool($v) => $body,
            Values::String($v) => $body,
            Values::Unsigned($v) => $body,
        }
    };
}

impl Values {
    /// new returns an empty collection for `block_type`, or an error if the type is unknown.
    pub fn new(block_type: u8) -> anyhow::Result<Self> {
        Ok(match block_type {
            BLOCK_FLOAT64 => Values::Float(vec![]),
            BLOCK_INTEGER => Values::Integer(vec![]),
            BLOCK_BOOLEAN => Values::Bool(vec![]),
            BLOCK_STRING => Values::String(vec![]),
            BLOCK_UNSIGNED => Values::Unsigned(vec![]),
            _ => return Err(anyhow!("unknown block type: {}", block_type)),
        })
    }

    pub fn block_type(&self) -> u8 {
        match self {
            Values::Float(_) => BLOCK_FLOAT64,
            Values::Integer(_) => BLOCK_INTEGER,
            Values::Bool(_) => BLOCK_BOOLEAN,
            Values::String(_) => BLOCK_STRING,
            Values::Unsigned(_) => BLOCK_UNSIGNED,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        with_values!(self, v => v.clear())
    }

    /// min_time returns the timestamp of the first point.
    pub fn min_time(&self) -> Option<i64> {
        with_values!(self, v => v.first().map(|x| x.unix_nano))
    }

    /// max_time returns the timestamp of the last point.
    pub fn max_time(&self) -> Option<i64> {
        with_values!(self, v => v.last().map(|x| x.unix_nano))
    }

    /// timestamps returns every timestamp in order.
    pub fn timestamps(&self) -> Vec<i64> {
        with_values!(self, v => v.iter().map(|x| x.unix_nano).collect())
    }

    /// split_off splits the collection at `at`, returning the tail with the same type.
    pub fn split_off(&mut self, at: usize) -> Values {
        match self {
            Values::Float(v) => Values::Float(v.split_off(at)),
            Values::Integer(v) => Values::Integer(v.split_off(at)),
            Values::Bool(v) => Values::Bool(v.split_off(at)),
            Values::String(v) => Values::String(v.split_off(at)),
            Values::Unsigned(v) => Values::Unsigned(v.split_off(at)),
        }
    }
}

impl From<Vec<FloatValue>> for Values {
    fn from(v: Vec<FloatValue>) -> Self {
        Values::Float(v)
    }
}

impl From<Vec<IntegerValue>> for Values {
    fn from(v: Vec<IntegerValue>) -> Self {
        Values::Integer(v)
    }
}

impl From<Vec<BoolValue>> for Values {
    fn from(v: Vec<BoolValue>) -> Self {
        Values::Bool(v)
    }
}

impl From<Vec<StringValue>> for Values {
    fn from(v: Vec<StringValue>) -> Self {
        Values::String(v)
    }
}

impl From<Vec<UnsignedValue>> for Values {
    fn from(v: Vec<UnsignedValue>) -> Self {
        Values::Unsigned(v)
    }
}
