use crate::ffi::value::MarshalledValue;
use crate::{LibraryHandle, ProbeError, Result, Signature, Value, ValueType};
use libffi::middle::{Arg, Cif, CodePtr, Type};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

/// An exported function resolved against a loaded library with a declared signature.
///
/// The binding borrows the library handle it was resolved against, so the library
/// can't be closed while the binding is alive.
#[derive(Debug)]
pub struct SymbolBinding<'lib> {
    library: &'lib LibraryHandle,
    symbol: String,
    signature: Signature,
    function: CodePtr,
    cif: Cif,
}

// Integers narrower than a register are returned widened to the size of `ffi_arg`,
// which is pointer sized on every supported target.
macro_rules! call_widened {
    ($binding:expr, $arguments:expr, $widened:ty, $ty:ty) => {{
        let value = $binding.cif.call::<$widened>($binding.function, $arguments);
        value as $ty
    }};
}

impl<'lib> SymbolBinding<'lib> {
    pub(crate) fn new(
        library: &'lib LibraryHandle,
        symbol: &str,
        signature: Signature,
    ) -> Result<Self> {
        let function = unsafe {
            library
                .library()
                .get::<unsafe extern "C" fn()>(symbol.as_bytes())
        }
        .map_err(|error| ProbeError::SymbolNotFound {
            symbol: symbol.to_string(),
            source: Some(error),
        })?;
        let function = unsafe { function.into_raw() }.as_raw_ptr();
        if function.is_null() {
            return ProbeError::SymbolNotFound {
                symbol: symbol.to_string(),
                source: None,
            }
            .into();
        }

        signature
            .validate()
            .map_err(|reason| ProbeError::SignatureMismatch {
                symbol: symbol.to_string(),
                reason,
            })?;

        let cif = Cif::new(
            signature.arguments().iter().map(|each| Type::from(*each)),
            Type::from(signature.result()),
        );

        debug!("Bound `{}` as {}", symbol, signature);

        Ok(Self {
            library,
            symbol: symbol.to_string(),
            signature,
            function: CodePtr::from_ptr(function),
            cif,
        })
    }

    pub fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn library(&self) -> &'lib LibraryHandle {
        self.library
    }

    /// Calls the native function exactly once with the given arguments.
    ///
    /// Arguments are checked against the declared signature before anything crosses
    /// the native boundary; the return value is checked against the function's own
    /// failure convention (null strings and the declared sentinel).
    pub fn invoke(&self, arguments: &[Value]) -> Result<Value> {
        let declared = self.signature.arguments();
        if arguments.len() != declared.len() {
            return self
                .signature_mismatch(format!(
                    "expected {} argument(s), got {}",
                    declared.len(),
                    arguments.len()
                ))
                .into();
        }

        // the native strings must outlive the call
        let mut strings: Vec<CString> = Vec::new();
        let mut marshalled_arguments = Vec::with_capacity(arguments.len());
        for (index, (value, value_type)) in arguments.iter().zip(declared).enumerate() {
            marshalled_arguments.push(self.marshall(index, value, *value_type, &mut strings)?);
        }
        let arguments: Vec<Arg> = marshalled_arguments
            .iter()
            .map(MarshalledValue::as_arg)
            .collect();

        trace!("Calling `{}` with {:?}", self.symbol, marshalled_arguments);
        let value = unsafe { self.call_and_marshall_result(arguments.as_slice()) }?;
        self.check_failure_sentinel(value)
    }

    fn marshall(
        &self,
        index: usize,
        value: &Value,
        value_type: ValueType,
        strings: &mut Vec<CString>,
    ) -> Result<MarshalledValue> {
        match (value_type, value) {
            (ValueType::I32, Value::I32(v)) => Ok(MarshalledValue::I32(*v)),
            (ValueType::I64, Value::I64(v)) => Ok(MarshalledValue::I64(*v)),
            (ValueType::U32, Value::U32(v)) => Ok(MarshalledValue::U32(*v)),
            (ValueType::U64, Value::U64(v)) => Ok(MarshalledValue::U64(*v)),
            (ValueType::F32, Value::F32(v)) => Ok(MarshalledValue::F32(*v)),
            (ValueType::F64, Value::F64(v)) => Ok(MarshalledValue::F64(*v)),
            (ValueType::CString, Value::String(v)) => {
                let string = CString::new(v.as_str()).map_err(|error| {
                    self.signature_mismatch(format!(
                        "argument {} has a NUL byte at {}",
                        index,
                        error.nul_position()
                    ))
                })?;
                let pointer = string.as_ptr() as *const c_void;
                strings.push(string);
                Ok(MarshalledValue::Pointer(pointer))
            }
            (ValueType::Pointer, Value::Pointer(v)) => {
                Ok(MarshalledValue::Pointer(*v as *const c_void))
            }
            (value_type, value) => Err(self.signature_mismatch(format!(
                "argument {} is declared as {} but got {}",
                index,
                value_type,
                value.value_type()
            ))),
        }
    }

    unsafe fn call_and_marshall_result(&self, arguments: &[Arg]) -> Result<Value> {
        let value = match self.signature.result() {
            ValueType::Void => {
                self.cif.call::<()>(self.function, arguments);
                Value::Void
            }
            ValueType::I32 => Value::I32(call_widened!(self, arguments, isize, i32)),
            ValueType::U32 => Value::U32(call_widened!(self, arguments, usize, u32)),
            ValueType::I64 => Value::I64(self.cif.call::<i64>(self.function, arguments)),
            ValueType::U64 => Value::U64(self.cif.call::<u64>(self.function, arguments)),
            ValueType::F32 => Value::F32(self.cif.call::<f32>(self.function, arguments)),
            ValueType::F64 => Value::F64(self.cif.call::<f64>(self.function, arguments)),
            ValueType::Pointer => {
                let pointer = self.cif.call::<*mut c_void>(self.function, arguments);
                Value::Pointer(pointer as usize)
            }
            ValueType::CString => {
                let pointer = self.cif.call::<*const c_char>(self.function, arguments);
                if pointer.is_null() {
                    return Err(self.invocation_failure("returned a null string".to_string()));
                }
                // the string is owned by the library, copy it before anything else runs
                let string = CStr::from_ptr(pointer).to_str().map_err(|error| {
                    self.invocation_failure(format!("returned a non UTF-8 string: {}", error))
                })?;
                Value::String(string.to_owned())
            }
        };
        Ok(value)
    }

    fn check_failure_sentinel(&self, value: Value) -> Result<Value> {
        match self.signature.failure_sentinel() {
            Some(sentinel) if sentinel == &value => Err(
                self.invocation_failure(format!("returned the failure sentinel {}", value)),
            ),
            _ => Ok(value),
        }
    }

    fn signature_mismatch(&self, reason: String) -> ProbeError {
        ProbeError::SignatureMismatch {
            symbol: self.symbol.clone(),
            reason,
        }
    }

    fn invocation_failure(&self, reason: String) -> ProbeError {
        ProbeError::InvocationFailure {
            symbol: self.symbol.clone(),
            reason,
        }
    }
}
