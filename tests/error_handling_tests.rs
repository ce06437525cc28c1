//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Store operations surface the right variant for each failure

use axum::http::StatusCode;
use axum::response::IntoResponse;
use kindstore::apis::external_name;
use kindstore::prelude::*;

fn resource() -> String {
    "externalnames.service.kindstore.dev".to_string()
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_misconfigured_returns_500() {
        let err = StoreError::misconfigured("no strategy");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_rejected_returns_422() {
        let err = StoreError::ValidationRejected {
            kind: "ExternalName".to_string(),
            name: "svc-a".to_string(),
            errors: FieldErrors::new(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_forbidden_returns_403() {
        let err = StoreError::Forbidden {
            kind: "ExternalName".to_string(),
            name: "svc-a".to_string(),
            message: "protected".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_type_mismatch_returns_500() {
        let err = StoreError::TypeMismatch {
            resource: resource(),
            expected: "ExternalName".to_string(),
            actual: "ConfigMap".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_malformed_row_is_not_a_composition_error() {
        let err = StoreError::MalformedRow {
            resource: resource(),
            name: "svc-a".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "MALFORMED_TABLE_ROW");
        assert!(!err.to_string().contains("misconfigured"));
    }

    #[test]
    fn test_not_found_returns_404() {
        let err = StoreError::NotFound {
            resource: resource(),
            name: "svc-a".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_already_exists_and_conflict_return_409() {
        let exists = StoreError::AlreadyExists {
            resource: resource(),
            name: "svc-a".to_string(),
        };
        let conflict = StoreError::Conflict {
            resource: resource(),
            name: "svc-a".to_string(),
            message: "stale".to_string(),
        };
        assert_eq!(exists.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_request_returns_400() {
        assert_eq!(
            StoreError::bad_request("bad selector").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_returns_500() {
        let err: StoreError = StorageError::LockPoisoned {
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        assert_eq!(
            StoreError::misconfigured("x").error_code(),
            "MISCONFIGURED_COMPOSITION"
        );
        assert_eq!(StoreError::bad_request("x").error_code(), "BAD_REQUEST");
        assert_eq!(
            StoreError::NotFound {
                resource: resource(),
                name: "a".to_string()
            }
            .error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_storage_error_codes_pass_through() {
        let cases = [
            (
                StorageError::KeyExists {
                    key: "/k".to_string(),
                },
                "STORAGE_KEY_EXISTS",
            ),
            (
                StorageError::RevisionMismatch {
                    key: "/k".to_string(),
                    expected: 1,
                    actual: 2,
                },
                "STORAGE_REVISION_MISMATCH",
            ),
            (
                StorageError::Unavailable {
                    backend: "memory".to_string(),
                },
                "STORAGE_UNAVAILABLE",
            ),
        ];
        for (storage, code) in cases {
            let err: StoreError = storage.into();
            assert_eq!(err.error_code(), code);
        }
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_validation_response_lists_causes() {
        let errors: FieldErrors = vec![
            FieldError::required("metadata.name"),
            FieldError::invalid("spec.host", "bad host", "not a DNS subdomain"),
        ]
        .into_iter()
        .collect();
        let err = StoreError::ValidationRejected {
            kind: "ExternalName".to_string(),
            name: "svc-a".to_string(),
            errors,
        };

        let response = err.to_response();
        assert_eq!(response.code, "VALIDATION_REJECTED");
        assert!(response.message.starts_with("ExternalName \"svc-a\" is invalid"));

        let details = response.details.unwrap();
        assert_eq!(details["kind"], "ExternalName");
        assert_eq!(details["causes"].as_array().unwrap().len(), 2);
        assert_eq!(details["causes"][1]["field"], "spec.host");
    }

    #[test]
    fn test_conflict_response_names_object() {
        let err = StoreError::Conflict {
            resource: resource(),
            name: "svc-a".to_string(),
            message: "stale".to_string(),
        };
        let response = err.to_response();
        let details = response.details.unwrap();
        assert_eq!(details["resource"], resource());
        assert_eq!(details["name"], "svc-a");
    }

    #[test]
    fn test_bad_request_has_no_details() {
        assert!(StoreError::bad_request("x").to_response().details.is_none());
    }

    #[test]
    fn test_response_serializes() {
        let json = serde_json::to_value(StoreError::bad_request("bad selector").to_response())
            .unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json.get("details").is_none());
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[test]
    fn test_not_found_into_response_status() {
        let err = StoreError::NotFound {
            resource: resource(),
            name: "svc-a".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_into_response_status() {
        let err = StoreError::ValidationRejected {
            kind: "ExternalName".to_string(),
            name: "svc-a".to_string(),
            errors: FieldErrors::new(),
        };
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}

// =============================================================================
// Store Operation Error Tests
// =============================================================================

mod store_error_tests {
    use super::*;

    fn store() -> Store<ExternalName> {
        let getter = Arc::new(ConfigOptionsGetter::new(StorageConfig::default()).unwrap());
        external_name::new_storage(getter).unwrap()
    }

    #[tokio::test]
    async fn test_missing_object_is_typed_not_found() {
        let err = store().get("default", "ghost").await.unwrap_err();
        match err {
            StoreError::NotFound { resource: r, name } => {
                assert_eq!(r, resource());
                assert_eq!(name, "ghost");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_update_is_conflict_with_message() {
        let store = store();
        let created = store
            .create(
                ExternalName::new("default", "svc-a", "a.com"),
                &CreateOptions::default(),
            )
            .await
            .unwrap();
        let mut first = created.clone();
        first.spec.host = Some("b.com".to_string());
        store.update(first, &UpdateOptions::default()).await.unwrap();

        let err = store
            .update(created, &UpdateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
        assert!(err.to_string().contains("the object has been modified"));
    }

    #[tokio::test]
    async fn test_successful_operations_return_ok() {
        let store = store();
        assert!(
            store
                .create(
                    ExternalName::new("default", "svc-a", "a.com"),
                    &CreateOptions::default()
                )
                .await
                .is_ok()
        );
        assert!(store.get("default", "svc-a").await.is_ok());
        assert!(store.list(&ListOptions::all()).await.is_ok());
        assert!(
            store
                .delete("default", "svc-a", &DeleteOptions::default())
                .await
                .is_ok()
        );
    }
}
