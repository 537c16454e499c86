use palimpsest_error::{
    ConfigError, ConfigErrorKind, GraphError, GraphErrorKind, PalimpsestError, PalimpsestErrorKind,
    PalimpsestResult, StoreError, StoreErrorKind,
};

fn conflict() -> PalimpsestResult<()> {
    Err(StoreError::new(StoreErrorKind::ConcurrencyConflict {
        branch: "main".to_string(),
        expected: 1,
        actual: 2,
    }))?
}

#[test]
fn test_store_error_captures_location() {
    let err = StoreError::not_found("root r-1");
    assert!(err.file.ends_with("error_test.rs"));
    assert!(err.line > 0);
    assert_eq!(err.kind, StoreErrorKind::NotFound("root r-1".to_string()));
}

#[test]
fn test_question_mark_converts_into_palimpsest_error() {
    let err = conflict().unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConcurrencyConflict { expected: 1, actual: 2, .. })
    ));
    let message = format!("{}", err);
    assert!(message.contains("expected head version 1, found 2"));
}

#[test]
fn test_non_store_errors_have_no_store_kind() {
    let err: PalimpsestError = GraphError::new(GraphErrorKind::Validation("node id".into())).into();
    assert!(err.store_kind().is_none());
    assert!(matches!(err.kind(), PalimpsestErrorKind::Graph(_)));

    let err: PalimpsestError = ConfigError::invalid_setting("snapshot_interval", "must be positive").into();
    assert!(matches!(err.kind(), PalimpsestErrorKind::Config(_)));
}

#[test]
fn test_display_messages() {
    let err = StoreError::new(StoreErrorKind::DuplicateSequence {
        scope: "act r:act:1".to_string(),
        sequence: 3,
    });
    assert!(format!("{}", err).contains("Duplicate sequence 3 in act r:act:1"));

    let err = StoreError::new(StoreErrorKind::InvalidStateTransition {
        from: "dormant".to_string(),
        to: "resolved".to_string(),
    });
    assert!(format!("{}", err).contains("from 'dormant' to 'resolved'"));
}

#[test]
fn test_config_errors_name_the_setting() {
    let err = ConfigError::invalid_setting("gc_retention_days", "must not be negative");
    assert_eq!(
        err.kind,
        ConfigErrorKind::InvalidSetting {
            key: "gc_retention_days".to_string(),
            reason: "must not be negative".to_string(),
        }
    );
    assert!(err.file.ends_with("error_test.rs"));
    assert!(
        err.to_string()
            .starts_with("Config Error: Setting 'gc_retention_days' must not be negative")
    );

    let err = ConfigError::new(ConfigErrorKind::Logging("invalid directive".to_string()));
    assert!(err.to_string().contains("Could not set up logging: invalid directive"));
}

#[cfg(feature = "database")]
#[test]
fn test_database_errors_describe_graph_operations() {
    use palimpsest_error::{DatabaseError, DatabaseErrorKind};

    let err = DatabaseError::new(DatabaseErrorKind::MissingUrl);
    assert!(err.to_string().starts_with("Graph Database Error: DATABASE_URL is not set"));

    let err: DatabaseError = diesel::result::Error::NotFound.into();
    assert!(matches!(err.kind, DatabaseErrorKind::Query(_)));
    assert!(err.to_string().contains("Graph table query failed"));

    let err = DatabaseError::new(DatabaseErrorKind::DanglingEndpoint("harbor".to_string()));
    assert!(err.to_string().contains("Edge endpoint 'harbor' is not in graph_nodes"));
}
