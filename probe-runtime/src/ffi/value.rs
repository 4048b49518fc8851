use libffi::middle::{Arg, Type};
use std::fmt::{Display, Formatter};
use std::os::raw::c_void;

/// The semantic type of an argument or a return value at the native boundary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// Only valid as a return type.
    Void,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    /// A NUL-terminated UTF-8 string passed as `*const c_char`.
    CString,
    /// An opaque address.
    Pointer,
}

impl ValueType {
    pub fn can_be_argument(&self) -> bool {
        !matches!(self, ValueType::Void)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Void => "void",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::CString => "cstring",
            ValueType::Pointer => "pointer",
        };
        f.write_str(name)
    }
}

impl From<ValueType> for Type {
    fn from(value: ValueType) -> Self {
        match value {
            ValueType::Void => Self::void(),
            ValueType::I32 => Self::i32(),
            ValueType::I64 => Self::i64(),
            ValueType::U32 => Self::u32(),
            ValueType::U64 => Self::u64(),
            ValueType::F32 => Self::f32(),
            ValueType::F64 => Self::f64(),
            ValueType::CString => Self::pointer(),
            ValueType::Pointer => Self::pointer(),
        }
    }
}

/// A caller-visible value passed to or returned from a native function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Pointer(usize),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::String(_) => ValueType::CString,
            Value::Pointer(_) => ValueType::Pointer,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::I32(value) => write!(f, "{}", value),
            Value::I64(value) => write!(f, "{}", value),
            Value::U32(value) => write!(f, "{}", value),
            Value::U64(value) => write!(f, "{}", value),
            Value::F32(value) => write!(f, "{}", value),
            Value::F64(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{:?}", value),
            Value::Pointer(value) => write!(f, "{:#x}", value),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U32(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// An argument in its native representation, kept alive for the duration of a call.
#[derive(Debug, Copy, Clone)]
pub(crate) enum MarshalledValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Pointer(*const c_void),
}

impl MarshalledValue {
    pub fn as_arg(&self) -> Arg {
        match self {
            MarshalledValue::I32(v) => Arg::new(v),
            MarshalledValue::I64(v) => Arg::new(v),
            MarshalledValue::U32(v) => Arg::new(v),
            MarshalledValue::U64(v) => Arg::new(v),
            MarshalledValue::F32(v) => Arg::new(v),
            MarshalledValue::F64(v) => Arg::new(v),
            MarshalledValue::Pointer(v) => Arg::new(v),
        }
    }
}
