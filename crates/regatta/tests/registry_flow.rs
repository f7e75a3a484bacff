// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end registry scenarios through the facade.

use std::sync::Arc;

use regatta::{
    CompatibilityLevel, ConfigScope, Coordinator, MemoryCommandLog, RegistryError, Role,
    SchemaRegistry, StateMachine,
};

fn primary_registry() -> SchemaRegistry {
    let state = Arc::new(StateMachine::new(
        Box::new(MemoryCommandLog::new()),
        CompatibilityLevel::None,
    ));
    state.bootstrap().unwrap();
    SchemaRegistry::new(state, Coordinator::new(Role::Primary))
}

#[tokio::test]
async fn basic_registration() {
    let registry = primary_registry();

    let id = registry.register("t1", r#"{"type":"string"}"#).await.unwrap();
    assert_eq!(id, 1);

    let record = registry.get_version("t1", "latest").unwrap();
    assert_eq!(record.version, 1);
    assert_eq!(record.schema_id, 1);

    assert_eq!(registry.list_versions("t1").unwrap(), vec![1]);
    assert_eq!(registry.list_subjects(), vec!["t1"]);
}

#[tokio::test]
async fn same_schema_under_two_subjects_shares_one_id() {
    let registry = primary_registry();

    let id_a = registry.register("a", r#"{"type":"string"}"#).await.unwrap();
    let id_b = registry.register("b", r#"{"type":"string"}"#).await.unwrap();

    assert_eq!(id_a, 1);
    assert_eq!(id_b, 1);
    assert_eq!(registry.list_versions("a").unwrap(), vec![1]);
    assert_eq!(registry.list_versions("b").unwrap(), vec![1]);
}

#[tokio::test]
async fn canonicalization_dedupes_whitespace_variants() {
    let registry = primary_registry();

    let id1 = registry
        .register("t", "{   \"type\":   \"string\"}")
        .await
        .unwrap();
    let id2 = registry.register("t", "{\"type\":\"string\"}").await.unwrap();

    assert_eq!(id1, 1);
    assert_eq!(id2, 1);
    assert_eq!(registry.list_versions("t").unwrap(), vec![1]);

    // Lookup with yet another spelling still finds version 1.
    let found = registry.lookup("t", "{ \"type\" : \"string\" }").unwrap();
    assert_eq!(found.version, 1);
    assert_eq!(found.schema_id, 1);
}

#[tokio::test]
async fn incompatible_schema_is_rejected_under_full() {
    let registry = primary_registry();

    registry
        .set_config(
            ConfigScope::Subject("s".to_string()),
            CompatibilityLevel::Full,
        )
        .await
        .unwrap();

    let id = registry
        .register(
            "s",
            r#"{"type":"record","name":"r","fields":[{"name":"f","type":"string"}]}"#,
        )
        .await
        .unwrap();
    assert_eq!(id, 1);

    let err = registry
        .register(
            "s",
            r#"{"type":"record","name":"r","fields":[{"name":"f","type":"int"}]}"#,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::IncompatibleSchema(_)));
    assert_eq!(err.error_code(), 40901);

    // The rejected registration left no trace.
    assert_eq!(registry.list_versions("s").unwrap(), vec![1]);
}

#[tokio::test]
async fn version_selector_validation() {
    let registry = primary_registry();
    registry.register("t", r#"{"type":"string"}"#).await.unwrap();

    // Keywords other than "latest" are invalid input, not missing data.
    let err = registry
        .test_compatibility("t", r#"{"type":"string"}"#, "earliest")
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidVersion(_)));

    let err = registry.get_version("t", "0").unwrap_err();
    assert!(matches!(err, RegistryError::InvalidVersion(_)));

    let err = registry.get_version("t", "200").unwrap_err();
    assert!(matches!(err, RegistryError::VersionNotFound(200)));

    // Selector validity is checked before subject existence.
    let err = registry.get_version("missing", "0").unwrap_err();
    assert!(matches!(err, RegistryError::InvalidVersion(_)));
    let err = registry.get_version("missing", "1").unwrap_err();
    assert!(matches!(err, RegistryError::SubjectNotFound(_)));
}

#[tokio::test]
async fn config_scoping() {
    let registry = primary_registry();

    // Global default is NONE.
    assert_eq!(
        registry.get_config(&ConfigScope::Global),
        Some(CompatibilityLevel::None)
    );

    registry
        .set_config(ConfigScope::Global, CompatibilityLevel::Forward)
        .await
        .unwrap();
    assert_eq!(
        registry.get_config(&ConfigScope::Global),
        Some(CompatibilityLevel::Forward)
    );
    // The subject scope does not inherit the global value on reads.
    assert_eq!(
        registry.get_config(&ConfigScope::Subject("s".to_string())),
        None
    );

    // Setting config for a subject with no schemas succeeds...
    registry
        .set_config(
            ConfigScope::Subject("s".to_string()),
            CompatibilityLevel::Forward,
        )
        .await
        .unwrap();
    assert_eq!(
        registry.get_config(&ConfigScope::Subject("s".to_string())),
        Some(CompatibilityLevel::Forward)
    );
    assert_eq!(
        registry.get_config(&ConfigScope::Global),
        Some(CompatibilityLevel::Forward)
    );
    // ...but does not make the subject visible.
    assert!(registry.list_subjects().is_empty());
    assert!(matches!(
        registry.list_versions("s").unwrap_err(),
        RegistryError::SubjectNotFound(_)
    ));
}

#[tokio::test]
async fn reads_leave_the_log_untouched() {
    let registry = primary_registry();
    registry.register("t", r#"{"type":"string"}"#).await.unwrap();
    let log_len = registry.state().log_len();

    registry.get_schema_by_id(1).unwrap();
    registry.get_version("t", "latest").unwrap();
    registry.list_subjects();
    registry.list_versions("t").unwrap();
    registry.lookup("t", r#"{"type":"string"}"#).unwrap();
    registry
        .test_compatibility("t", r#"{"type":"int"}"#, "latest")
        .unwrap();
    registry.get_config(&ConfigScope::Global);

    assert_eq!(registry.state().log_len(), log_len);
}

#[tokio::test]
async fn compatibility_is_enforced_only_on_writes() {
    let registry = primary_registry();
    registry
        .set_config(
            ConfigScope::Subject("s".to_string()),
            CompatibilityLevel::Full,
        )
        .await
        .unwrap();
    registry
        .register(
            "s",
            r#"{"type":"record","name":"r","fields":[{"name":"f","type":"string"}]}"#,
        )
        .await
        .unwrap();

    // test_compatibility reports the verdict without rejecting anything.
    let compatible = registry
        .test_compatibility(
            "s",
            r#"{"type":"record","name":"r","fields":[{"name":"f","type":"int"}]}"#,
            "latest",
        )
        .unwrap();
    assert!(!compatible);

    // Reads of existing versions never re-validate.
    assert!(registry.get_version("s", "1").is_ok());
}

#[tokio::test]
async fn interleaved_subjects_keep_independent_version_sequences() {
    let registry = primary_registry();

    let texts = [
        r#"{"type":"string"}"#,
        r#"{"type":"int"}"#,
        r#"{"type":"long"}"#,
        r#"{"type":"double"}"#,
    ];

    for text in &texts {
        registry.register("one", text).await.unwrap();
    }
    registry.register("two", texts[0]).await.unwrap();
    registry.register("two", texts[2]).await.unwrap();

    assert_eq!(registry.list_versions("one").unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(registry.list_versions("two").unwrap(), vec![1, 2]);
    assert_eq!(registry.list_subjects(), vec!["one", "two"]);

    // Shared schemas resolved to the ids assigned at first observation.
    assert_eq!(registry.lookup("two", texts[0]).unwrap().schema_id, 1);
    assert_eq!(registry.lookup("two", texts[2]).unwrap().schema_id, 3);
}
