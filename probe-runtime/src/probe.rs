use crate::{
    LibraryHandle, LibraryResolver, ProbeError, Result, Signature, SymbolBinding, Value, ValueType,
};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// How far a probe got before it finished.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ProbeStage {
    /// The symbol could not be bound.
    Unbound,
    /// The symbol was bound but the call never crossed the boundary.
    Bound,
    /// The native function was called.
    Invoked,
}

impl Display for ProbeStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProbeStage::Unbound => "unbound",
            ProbeStage::Bound => "bound",
            ProbeStage::Invoked => "invoked",
        };
        f.write_str(name)
    }
}

/// A single call used to check that a binding works end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    symbol: String,
    signature: Signature,
    arguments: Vec<Value>,
    // arguments that could not be represented, reported once the symbol is bound
    rejected_argument: Option<String>,
}

impl Probe {
    pub const ADD_SYMBOL: &'static str = "add";
    pub const DECODE_SYMBOL: &'static str = "decode";

    pub fn new(symbol: impl Into<String>, signature: Signature, arguments: Vec<Value>) -> Self {
        Self {
            symbol: symbol.into(),
            signature,
            arguments,
            rejected_argument: None,
        }
    }

    /// `add(a: i32, b: i32) -> i32`
    pub fn add(lhs: i32, rhs: i32) -> Self {
        Self::new(
            Self::ADD_SYMBOL,
            Signature::new([ValueType::I32, ValueType::I32], ValueType::I32),
            vec![Value::I32(lhs), Value::I32(rhs)],
        )
    }

    /// `decode(path: *const c_char) -> *const c_char`, a null result is a failure.
    ///
    /// The path is passed as UTF-8; a path that isn't valid UTF-8 fails the probe
    /// with a signature mismatch instead of being passed altered.
    pub fn decode(input: impl AsRef<Path>) -> Self {
        let input = input.as_ref();
        let signature = Signature::new([ValueType::CString], ValueType::CString);
        match input.to_str() {
            Some(path) => Self::new(Self::DECODE_SYMBOL, signature, vec![Value::from(path)]),
            None => Self {
                rejected_argument: Some(format!(
                    "argument 0 is not valid UTF-8: {}",
                    input.display()
                )),
                ..Self::new(Self::DECODE_SYMBOL, signature, vec![])
            },
        }
    }

    pub fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arguments(&self) -> &[Value] {
        self.arguments.as_slice()
    }

    pub fn run(&self, library: &LibraryHandle) -> ProbeOutcome {
        let binding = match library.bind(&self.symbol, self.signature.clone()) {
            Ok(binding) => binding,
            Err(error) => return self.finish(ProbeStage::Unbound, Err(error)),
        };
        if let Some(reason) = &self.rejected_argument {
            let error = ProbeError::SignatureMismatch {
                symbol: self.symbol.clone(),
                reason: reason.clone(),
            };
            return self.finish(ProbeStage::Bound, Err(error));
        }
        self.invoke(&binding)
    }

    fn invoke(&self, binding: &SymbolBinding) -> ProbeOutcome {
        match binding.invoke(&self.arguments) {
            Ok(value) => self.finish(ProbeStage::Invoked, Ok(value)),
            // these are caught before the call is made
            Err(error @ ProbeError::SignatureMismatch { .. }) => {
                self.finish(ProbeStage::Bound, Err(error))
            }
            Err(error) => self.finish(ProbeStage::Invoked, Err(error)),
        }
    }

    fn finish(&self, stage: ProbeStage, result: Result<Value>) -> ProbeOutcome {
        let outcome = ProbeOutcome {
            symbol: self.symbol.clone(),
            stage,
            result,
        };
        match outcome.result() {
            Ok(value) => info!("Probe `{}` returned {}", self.symbol, value),
            Err(error) => warn!("Probe `{}` failed ({}): {}", self.symbol, stage, error),
        }
        outcome
    }
}

#[derive(Debug)]
pub struct ProbeOutcome {
    symbol: String,
    stage: ProbeStage,
    result: Result<Value>,
}

impl ProbeOutcome {
    pub fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    pub fn stage(&self) -> ProbeStage {
        self.stage
    }

    pub fn result(&self) -> std::result::Result<&Value, &ProbeError> {
        self.result.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.result.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<Value> {
        self.result
    }
}

impl Display for ProbeOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(value) => write!(f, "{}: {}", self.symbol, value),
            Err(error) => write!(f, "{}: failed ({}): {}", self.symbol, error.kind(), error),
        }
    }
}

/// Runs every probe against the library, one after another.
/// A failing probe never prevents the following ones from running.
pub fn run_probes(library: &LibraryHandle, probes: &[Probe]) -> Vec<ProbeOutcome> {
    probes.iter().map(|probe| probe.run(library)).collect()
}

/// Outcomes of all probes run against one resolved library.
#[derive(Debug)]
pub struct ProbeReport {
    library: PathBuf,
    outcomes: Vec<ProbeOutcome>,
}

impl ProbeReport {
    pub fn new(library: impl Into<PathBuf>, outcomes: Vec<ProbeOutcome>) -> Self {
        Self {
            library: library.into(),
            outcomes,
        }
    }

    /// The candidate path the library was loaded from.
    pub fn library(&self) -> &Path {
        self.library.as_path()
    }

    pub fn outcomes(&self) -> &[ProbeOutcome] {
        self.outcomes.as_slice()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ProbeOutcome::is_success)
    }
}

/// Resolves the library, runs the probes against it and unloads it again.
///
/// Only a failed resolution is returned as an error; probe failures end up in the report.
pub fn probe_library(resolver: &LibraryResolver, probes: &[Probe]) -> Result<ProbeReport> {
    let library = resolver.resolve()?;
    let outcomes = run_probes(&library, probes);
    let report = ProbeReport::new(library.source_path(), outcomes);

    if let Err(error) = library.close() {
        warn!("{}", error);
    }
    Ok(report)
}
