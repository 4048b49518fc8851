use crate::{Value, ValueType};
use std::fmt::{Display, Formatter};

/// The calling convention a native function is declared with.
///
/// Calls go through libffi's default ABI for the target, which is the
/// platform's C convention.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CallingConvention {
    #[default]
    C,
}

impl Display for CallingConvention {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CallingConvention::C => f.write_str("extern \"C\""),
        }
    }
}

/// The declared shape of a native function: argument types, return type,
/// calling convention and an optional return value that signals failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    arguments: Vec<ValueType>,
    result: ValueType,
    convention: CallingConvention,
    failure_sentinel: Option<Value>,
}

impl Signature {
    pub fn new(arguments: impl Into<Vec<ValueType>>, result: ValueType) -> Self {
        Self {
            arguments: arguments.into(),
            result,
            convention: CallingConvention::default(),
            failure_sentinel: None,
        }
    }

    pub fn with_calling_convention(mut self, convention: CallingConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Treat a return value equal to `sentinel` as a failure reported by the native function.
    pub fn with_failure_sentinel(mut self, sentinel: impl Into<Value>) -> Self {
        self.failure_sentinel = Some(sentinel.into());
        self
    }

    pub fn arguments(&self) -> &[ValueType] {
        self.arguments.as_slice()
    }

    pub fn result(&self) -> ValueType {
        self.result
    }

    pub fn calling_convention(&self) -> CallingConvention {
        self.convention
    }

    pub fn failure_sentinel(&self) -> Option<&Value> {
        self.failure_sentinel.as_ref()
    }

    /// Checks the declaration itself, before it is bound to anything.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (index, argument) in self.arguments.iter().enumerate() {
            if !argument.can_be_argument() {
                return Err(format!("argument {} is declared as {}", index, argument));
            }
        }

        if let Some(sentinel) = &self.failure_sentinel {
            if self.result == ValueType::Void {
                return Err("a void function can't have a failure sentinel".to_string());
            }
            if sentinel.value_type() != self.result {
                return Err(format!(
                    "failure sentinel {} is not a {}",
                    sentinel, self.result
                ));
            }
        }

        Ok(())
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fn(", self.convention)?;
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", argument)?;
        }
        write!(f, ") -> {}", self.result)
    }
}
