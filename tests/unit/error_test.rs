//! Tests for error types

use std::io;
use std::path::PathBuf;

use mminte::core::{ErrorMarker, InteractionError, IoCategory, JobOutcome, PoolError};

#[test]
fn test_io_error_keeps_category_and_path() {
    let source = io::Error::new(io::ErrorKind::NotFound, "gone");
    let err = InteractionError::io("models/BAD.json", &source);

    assert!(err.is_io());
    assert_eq!(err.io_category(), Some(IoCategory::NotFound));
    assert_eq!(err.to_string(), "models/BAD.json: gone");
}

#[test]
fn test_unsupported_format_is_io() {
    let err = InteractionError::unsupported_format("models/FP.bad");
    assert!(err.is_io());
    assert_eq!(err.io_category(), Some(IoCategory::UnsupportedFormat));
    assert!(err.to_string().contains("`bad`"));
}

#[test]
fn test_non_io_errors() {
    let err = InteractionError::InsufficientSources { found: 1 };
    assert!(!err.is_io());
    assert_eq!(err.io_category(), None);
    assert_eq!(err.to_string(), "at least two source models are required, got 1");

    let err: InteractionError = PoolError::NothingOutstanding.into();
    assert_eq!(err, InteractionError::Pool(PoolError::NothingOutstanding));
}

#[test]
fn test_conversion_to_io_error() {
    let err = InteractionError::unsupported_format("FP.bad");
    let io_err: io::Error = err.into();
    assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);
}

#[test]
fn test_error_survives_serialization() {
    let err = InteractionError::Io {
        category: IoCategory::PermissionDenied,
        path: PathBuf::from("out/BTxFP.json"),
        message: "read-only file system".into(),
    };
    let json = serde_json::to_string(&err).unwrap();
    let back: InteractionError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}

#[test]
fn test_failure_outcome_reraises_original_error() {
    let original = InteractionError::invalid_model("BT.json", "missing field `id`");
    let outcome: JobOutcome<u32> = JobOutcome::Failure(ErrorMarker::new(1, 9, original.clone()));

    assert!(outcome.is_failure());
    assert_eq!(outcome.into_result(), Err(original));
    assert_eq!(JobOutcome::Success(4_u32).into_result(), Ok(4));
}
