use std::fmt::Debug;

pub use values::Values;

mod values;

/// FieldType is implemented by every payload type a TSM block can hold.
pub trait FieldType: Send + Sync + Debug + Clone + PartialEq + Default {}

impl FieldType for f64 {}
impl FieldType for i64 {}
impl FieldType for bool {}
impl FieldType for Vec<u8> {}
impl FieldType for u64 {}

/// Value is a single timestamped point of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Value<T>
where
    T: FieldType,
{
    pub unix_nano: i64,
    pub value: T,
}

impl<T> Value<T>
where
    T: FieldType,
{
    pub fn new(unix_nano: i64, value: T) -> Self {
        Self { unix_nano, value }
    }
}

pub type FloatValue = Value<f64>;
pub type IntegerValue = Value<i64>;
pub type BoolValue = Value<bool>;
pub type StringValue = Value<Vec<u8>>;
pub type UnsignedValue = Value<u64>;
