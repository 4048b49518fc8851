use probe_client_tests::{test_library, write_png_header};
use probe_runtime::{
    probe_library, run_probes, CallingConvention, CandidatePaths, LibraryHandle, LibraryResolver,
    Probe, ProbeErrorKind, ProbeStage, SharedLibrary, Signature, Value, ValueType,
};
use std::path::Path;

fn load_test_library() -> LibraryHandle {
    let library = test_library(Path::new(env!("CARGO_TARGET_TMPDIR")));
    LibraryResolver::new(CandidatePaths::new([library.to_path_buf()]))
        .resolve()
        .unwrap()
}

#[test]
pub fn add() {
    let library = load_test_library();
    let outcome = Probe::add(2, 3).run(&library);

    assert_eq!(outcome.stage(), ProbeStage::Invoked);
    assert_eq!(outcome.value(), Some(&Value::I32(5)));
}

#[test]
pub fn add_negative() {
    let library = load_test_library();
    let binding = library
        .bind(
            "add",
            Signature::new([ValueType::I32, ValueType::I32], ValueType::I32),
        )
        .unwrap();

    assert_eq!(
        binding.invoke(&[Value::I32(-7), Value::I32(2)]).unwrap(),
        Value::I32(-5)
    );
    assert_eq!(
        binding.invoke(&[Value::I32(i32::MAX), Value::I32(1)]).unwrap(),
        Value::I32(i32::MIN)
    );
}

#[test]
pub fn missing_symbol() {
    let library = load_test_library();
    let error = library
        .bind(
            "does_not_exist",
            Signature::new([ValueType::I32], ValueType::I32),
        )
        .unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::SymbolNotFound);
    assert!(error.to_string().contains("does_not_exist"));

    let outcome = Probe::new(
        "does_not_exist",
        Signature::new(Vec::<ValueType>::new(), ValueType::Void),
        vec![],
    )
    .run(&library);
    assert_eq!(outcome.stage(), ProbeStage::Unbound);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::SymbolNotFound)
    );
}

#[test]
pub fn missing_symbol_with_an_invalid_declaration() {
    let library = load_test_library();
    let error = library
        .bind(
            "does_not_exist",
            Signature::new([ValueType::Void], ValueType::I32),
        )
        .unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::SymbolNotFound);
}

fn call(
    library: &LibraryHandle,
    symbol: &str,
    signature: Signature,
    arguments: &[Value],
) -> Value {
    library
        .bind(symbol, signature)
        .unwrap()
        .invoke(arguments)
        .unwrap()
}

#[test]
pub fn binding_remembers_its_declaration() {
    let library = load_test_library();
    let signature = Signature::new([ValueType::I32, ValueType::I32], ValueType::I32)
        .with_calling_convention(CallingConvention::C);
    let binding = library.bind("add", signature.clone()).unwrap();

    assert_eq!(binding.symbol(), "add");
    assert_eq!(binding.signature(), &signature);
    assert_eq!(binding.signature().calling_convention(), CallingConvention::C);
    assert_eq!(binding.library().source_path(), library.source_path());
}

#[test]
pub fn unsigned_and_wide_integers() {
    let library = load_test_library();

    assert_eq!(
        call(
            &library,
            "add_u32",
            Signature::new([ValueType::U32, ValueType::U32], ValueType::U32),
            &[Value::U32(4_000_000_000), Value::U32(100_000_000)],
        ),
        Value::U32(4_100_000_000)
    );
    assert_eq!(
        call(
            &library,
            "add_i64",
            Signature::new([ValueType::I64, ValueType::I64], ValueType::I64),
            &[Value::I64(1 << 40), Value::I64(-3)],
        ),
        Value::I64((1 << 40) - 3)
    );
    assert_eq!(
        call(
            &library,
            "add_u64",
            Signature::new([ValueType::U64, ValueType::U64], ValueType::U64),
            &[Value::U64(u64::MAX - 1), Value::U64(1)],
        ),
        Value::U64(u64::MAX)
    );
}

#[test]
pub fn floats() {
    let library = load_test_library();

    assert_eq!(
        call(
            &library,
            "scale_f32",
            Signature::new([ValueType::F32, ValueType::F32], ValueType::F32),
            &[Value::F32(1.5), Value::F32(4.0)],
        ),
        Value::F32(6.0)
    );
    assert_eq!(
        call(
            &library,
            "scale_f64",
            Signature::new([ValueType::F64, ValueType::F64], ValueType::F64),
            &[Value::F64(-2.5), Value::F64(0.5)],
        ),
        Value::F64(-1.25)
    );
}

#[test]
pub fn pointers() {
    let library = load_test_library();
    let signature = Signature::new([ValueType::Pointer], ValueType::Pointer);

    assert_eq!(
        call(&library, "identity_pointer", signature.clone(), &[Value::Pointer(0x1000)]),
        Value::Pointer(0x1000)
    );
    assert_eq!(
        call(&library, "identity_pointer", signature, &[Value::Pointer(0)]),
        Value::Pointer(0)
    );
}

#[test]
pub fn invalid_utf8_result_is_an_invocation_failure() {
    let library = load_test_library();
    let outcome = Probe::new(
        "invalid_utf8",
        Signature::new(Vec::<ValueType>::new(), ValueType::CString),
        vec![],
    )
    .run(&library);

    assert_eq!(outcome.stage(), ProbeStage::Invoked);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::InvocationFailure)
    );
}

#[test]
pub fn wrong_arity_is_caught_before_the_call() {
    let library = load_test_library();
    let binding = library
        .bind(
            "add",
            Signature::new(
                [ValueType::I32, ValueType::I32, ValueType::I32],
                ValueType::I32,
            ),
        )
        .unwrap();

    let error = binding
        .invoke(&[Value::I32(2), Value::I32(3)])
        .unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::SignatureMismatch);
}

#[test]
pub fn wrong_argument_type_is_caught_before_the_call() {
    let library = load_test_library();
    let binding = library
        .bind(
            "add",
            Signature::new([ValueType::I32, ValueType::I32], ValueType::I32),
        )
        .unwrap();

    let error = binding
        .invoke(&[Value::I32(2), Value::from("three")])
        .unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::SignatureMismatch);
}

#[test]
pub fn void_argument_is_rejected_at_bind_time() {
    let library = load_test_library();
    let error = library
        .bind(
            "add",
            Signature::new([ValueType::Void, ValueType::I32], ValueType::I32),
        )
        .unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::SignatureMismatch);
}

#[test]
pub fn interior_nul_is_a_mismatch() {
    let library = load_test_library();
    let outcome = Probe::new(
        "decode",
        Signature::new([ValueType::CString], ValueType::CString),
        vec![Value::from("test\0.png")],
    )
    .run(&library);

    assert_eq!(outcome.stage(), ProbeStage::Bound);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::SignatureMismatch)
    );
}

#[test]
pub fn decode_missing_file() {
    let library = load_test_library();
    let directory = tempfile::tempdir().unwrap();
    let outcome = Probe::decode(directory.path().join("test.png")).run(&library);

    assert_eq!(outcome.stage(), ProbeStage::Invoked);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::InvocationFailure)
    );
}

#[cfg(unix)]
#[test]
pub fn decode_rejects_a_non_utf8_path() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let library = load_test_library();
    let directory = tempfile::tempdir().unwrap();
    let image = directory.path().join(OsStr::from_bytes(b"test\xff.png"));

    let outcome = Probe::decode(&image).run(&library);
    assert_eq!(outcome.stage(), ProbeStage::Bound);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::SignatureMismatch)
    );
}

#[test]
pub fn decode_png() {
    let library = load_test_library();
    let directory = tempfile::tempdir().unwrap();
    let image = directory.path().join("test.png");
    write_png_header(&image, 4, 2).unwrap();

    let outcome = Probe::decode(&image).run(&library);
    assert_eq!(outcome.value(), Some(&Value::from("png 4x2")));
}

#[test]
pub fn probes_are_independent() {
    let library = load_test_library();
    let directory = tempfile::tempdir().unwrap();
    let image = directory.path().join("test.png");
    write_png_header(&image, 16, 9).unwrap();

    let misdeclared_add = Probe::new(
        "add",
        Signature::new([ValueType::I32], ValueType::I32),
        vec![Value::I32(2), Value::I32(3)],
    );
    let probes = [
        misdeclared_add,
        Probe::new(
            "missing",
            Signature::new(Vec::<ValueType>::new(), ValueType::I32),
            vec![],
        ),
        Probe::decode(&image),
        Probe::add(2, 3),
    ];

    let outcomes = run_probes(&library, &probes);
    assert_eq!(outcomes.len(), probes.len());

    assert_eq!(
        outcomes[0].error().map(|error| error.kind()),
        Some(ProbeErrorKind::SignatureMismatch)
    );
    assert_eq!(
        outcomes[1].error().map(|error| error.kind()),
        Some(ProbeErrorKind::SymbolNotFound)
    );
    assert_eq!(outcomes[2].value(), Some(&Value::from("png 16x9")));
    assert_eq!(outcomes[3].value(), Some(&Value::I32(5)));
}

#[test]
pub fn failure_sentinel() {
    let library = load_test_library();
    let outcome = Probe::new(
        "add",
        Signature::new([ValueType::I32, ValueType::I32], ValueType::I32)
            .with_failure_sentinel(-1i32),
        vec![Value::I32(-3), Value::I32(2)],
    )
    .run(&library);

    assert_eq!(outcome.stage(), ProbeStage::Invoked);
    assert_eq!(
        outcome.error().map(|error| error.kind()),
        Some(ProbeErrorKind::InvocationFailure)
    );
}

#[test]
pub fn probe_library_reports_every_probe() {
    let library = test_library(Path::new(env!("CARGO_TARGET_TMPDIR")));
    let directory = tempfile::tempdir().unwrap();
    let resolver = LibraryResolver::new(CandidatePaths::new([
        directory.path().join("debug").join("missing.so"),
        library.to_path_buf(),
    ]));

    let report = probe_library(
        &resolver,
        &[Probe::add(2, 3), Probe::decode(directory.path().join("test.png"))],
    )
    .unwrap();

    assert_eq!(report.library(), library);
    assert_eq!(report.outcomes().len(), 2);
    assert_eq!(report.outcomes()[0].value(), Some(&Value::I32(5)));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.all_succeeded(), false);
}

#[test]
pub fn shared_library_between_threads() {
    let shared = SharedLibrary::new(load_test_library());

    let workers: Vec<_> = (0..4)
        .map(|index| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                shared
                    .with_library(|library| Probe::add(index, index).run(library).into_result())
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    for (index, worker) in workers.into_iter().enumerate() {
        let index = index as i32;
        assert_eq!(worker.join().unwrap(), Value::I32(index + index));
    }

    assert!(shared.is_loaded());
    shared.unload().unwrap();
    assert!(!shared.is_loaded());

    let error = shared.with_library(|_| ()).unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::LibraryUnloaded);
    assert_eq!(
        shared.unload().unwrap_err().kind(),
        ProbeErrorKind::LibraryUnloaded
    );
}
