//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Failed fetches leave the session usable and retryable
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted

mod listing_harness;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use listing_harness::*;
use manualink::core::error::{FieldValidationError, RequestError, ValidationError};
use manualink::prelude::*;
use std::time::Duration;

// =============================================================================
// Session behaviour on failure
// =============================================================================

mod session_failure_tests {
    use super::*;

    fn farming() -> FilterSpec {
        FilterSpec::all().with(FilterKey::Category, "Farming")
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_items() {
        let provider = FailingProvider::new(scenario_jobs());
        let engine = ListingEngine::new("jobs", provider.clone(), ListingSettings::whole_collection(10));

        engine.load(FilterSpec::all(), SortSpec::Newest).await.unwrap();
        provider.fail_next(1);

        let err = engine.load(farming(), SortSpec::Newest).await.unwrap_err();
        assert!(matches!(err, ListingError::Fetch(FetchError::Remote { .. })));
        assert!(err.is_retryable());

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, ListingStatus::Error);
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.last_error, Some(err));
        // The items still belong to the last filter that loaded
        assert_eq!(snapshot.filter, FilterSpec::all());
        assert_eq!(snapshot.sort, SortSpec::Newest);
    }

    #[tokio::test]
    async fn test_load_can_be_retried_after_failure() {
        let provider = FailingProvider::new(scenario_jobs());
        let engine = ListingEngine::new("jobs", provider.clone(), ListingSettings::whole_collection(10));
        provider.fail_next(1);

        assert!(engine.load(farming(), SortSpec::PayHigh).await.is_err());
        assert!(matches!(
            engine.jump_to_page(1),
            Err(ListingError::NotReady { .. })
        ));

        let items = engine.load(farming(), SortSpec::PayHigh).await.unwrap();
        assert_eq!(ids(&items), vec!["1", "3"]);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, ListingStatus::Loaded);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_cursor() {
        let provider = FailingProvider::new(numbered_jobs("j", "Farming", 5));
        let engine = ListingEngine::new("jobs", provider.clone(), ListingSettings::incremental(2));

        engine.load(FilterSpec::all(), SortSpec::Oldest).await.unwrap();
        let cursor = engine.snapshot().cursor;
        assert!(cursor.is_some());

        provider.fail_next(1);
        assert!(engine.load_more().await.is_err());

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, ListingStatus::Error);
        assert_eq!(snapshot.cursor, cursor);
        assert_eq!(ids(&snapshot.items), vec!["j1", "j2"]);
        assert!(snapshot.has_more);

        let retried = engine.load_more().await.unwrap();
        assert_eq!(ids(&retried), vec!["j3", "j4"]);
        assert_eq!(engine.status(), ListingStatus::Loaded);
    }

    #[tokio::test]
    async fn test_removed_cursor_document_needs_a_fresh_load() {
        let store = collection(numbered_jobs("j", "Farming", 5));
        let engine = ListingEngine::new("jobs", store.clone(), ListingSettings::incremental(2));

        engine.load(FilterSpec::all(), SortSpec::Oldest).await.unwrap();
        store.remove("j2").unwrap();

        for _ in 0..2 {
            let err = engine.load_more().await.unwrap_err();
            assert!(matches!(err, ListingError::Fetch(FetchError::Remote { .. })));
        }
        assert_eq!(ids(&engine.snapshot().items), vec!["j1", "j2"]);

        let reloaded = engine.load(FilterSpec::all(), SortSpec::Oldest).await.unwrap();
        assert_eq!(ids(&reloaded), vec!["j1", "j3"]);
        assert_eq!(ids(&engine.load_more().await.unwrap()), vec!["j4", "j5"]);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = FailingProvider::stalling(scenario_jobs(), Duration::from_millis(500));
        let settings =
            ListingSettings::whole_collection(10).with_fetch_timeout(Duration::from_millis(20));
        let engine = ListingEngine::new("jobs", provider, settings);

        let err = engine.load(farming(), SortSpec::Newest).await.unwrap_err();
        assert_eq!(
            err,
            ListingError::Fetch(FetchError::Timeout {
                collection: "jobs".to_string(),
                timeout_ms: 20
            })
        );
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(engine.status(), ListingStatus::Error);
    }

    #[tokio::test]
    async fn test_failure_is_published_on_the_bus() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let provider = FailingProvider::new(scenario_jobs());
        let engine = ListingEngine::new("jobs", provider.clone(), ListingSettings::whole_collection(10))
            .with_events(bus);

        provider.fail_next(1);
        let _ = engine.load(farming(), SortSpec::Newest).await;

        let envelope = events.try_recv().expect("failure should be published");
        match envelope.event {
            AppEvent::Listing(ListingEvent::Failed {
                listing,
                operation,
                message,
            }) => {
                assert_eq!(listing, "jobs");
                assert_eq!(operation, "load");
                assert!(message.contains("network unreachable"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_invalid_page_returns_400() {
        let err = ManualinkError::Listing(ListingError::InvalidPage {
            requested: 7,
            total_pages: 3,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_concurrent_operation_returns_409() {
        let err = ManualinkError::Listing(ListingError::ConcurrentOperation {
            operation: "load_more",
            in_flight: "load",
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_remote_failure_returns_502() {
        let err = ManualinkError::Fetch(FetchError::remote("users", "connection reset"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_query_returns_400() {
        let err = ManualinkError::Request(RequestError::InvalidQuery {
            parameter: "sort".to_string(),
            message: "unknown sort 'cheapest'".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_error_returns_500() {
        let err = ManualinkError::Config(ConfigError::InvalidValue {
            field: "listings[0].page_size".to_string(),
            message: "must be at least 1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Error Code and Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_listing_error_codes() {
        let cases = [
            (
                ListingError::InvalidPage {
                    requested: 0,
                    total_pages: 1,
                },
                "INVALID_PAGE",
            ),
            (
                ListingError::NotReady {
                    operation: "load_more",
                    reason: "the collection is exhausted".to_string(),
                },
                "LISTING_NOT_READY",
            ),
            (
                ListingError::Superseded {
                    operation: "load",
                    generation: 4,
                },
                "LISTING_SUPERSEDED",
            ),
            (
                ListingError::Cancelled {
                    operation: "load_more",
                },
                "LISTING_CANCELLED",
            ),
            (
                ListingError::Fetch(FetchError::MissingIndex {
                    collection: "jobs".to_string(),
                    fields: vec!["category".to_string(), "pay".to_string()],
                }),
                "FETCH_MISSING_INDEX",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(ManualinkError::from(err).error_code(), code);
        }
    }

    #[test]
    fn test_unknown_listing_code() {
        let err: ManualinkError = RequestError::UnknownListing {
            name: "tenders".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "UNKNOWN_LISTING");
        assert!(err.to_string().contains("tenders"));
    }

    #[test]
    fn test_validation_errors_include_field_details() {
        let err = ManualinkError::Validation(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "pay".to_string(),
                message: "range".to_string(),
            },
            FieldValidationError {
                field: "title".to_string(),
                message: "length".to_string(),
            },
        ]));
        let response = err.to_response();
        assert_eq!(response.code, "VALIDATION_ERROR");
        let details = response.details.expect("field details");
        assert_eq!(details["fields"][0]["field"], "pay");
        assert_eq!(details["fields"][1]["field"], "title");
    }

    #[test]
    fn test_timeout_has_no_details() {
        let err = ManualinkError::Fetch(FetchError::Timeout {
            collection: "jobs".to_string(),
            timeout_ms: 10_000,
        });
        let response = err.to_response();
        assert_eq!(response.code, "FETCH_TIMEOUT");
        assert!(response.message.contains("10000ms"));
        assert!(response.details.is_none());
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[test]
    fn test_listing_error_into_response_status() {
        let err: ManualinkError = ListingError::InvalidPage {
            requested: 12,
            total_pages: 2,
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fetch_error_into_response_status() {
        let err: ManualinkError = FetchError::remote("jobs", "quota exceeded").into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_error_into_response_status() {
        let err: ManualinkError = anyhow::anyhow!("seed file vanished").into();
        assert!(matches!(err, ManualinkError::Internal(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
