mod binding;
mod signature;
mod value;

pub use binding::SymbolBinding;
pub use signature::{CallingConvention, Signature};
pub use value::{Value, ValueType};
