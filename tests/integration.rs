//! Integration tests for the update detector and notification feed against a
//! mocked REST backend.
//!
//! These tests verify:
//! 1. Status payloads are decoded and turned into the right alerts end-to-end
//! 2. Network and decoding failures are absorbed by the detector
//! 3. Release announcements survive a restart via the file-backed registry
//! 4. Notification endpoints are called with the session token and the
//!    dropdown merges both sources in order

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tidings::alerts::AlertStore;
use tidings::api::{HttpApi, NotificationApi, StatusSource};
use tidings::jobs::{TickOutcome, UpdateDetector};
use tidings::models::alert::AlertKind;
use tidings::models::session::{Role, Session, SessionHandle};
use tidings::store::{FileStorage, MemoryStorage, SeenRegistry};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(role: Role) -> SessionHandle {
    SessionHandle::new(Some(Session {
        username: "mara".into(),
        role,
        token: "tok-123".into(),
    }))
}

fn http_api(server: &MockServer, session: SessionHandle) -> Arc<HttpApi> {
    Arc::new(
        HttpApi::new(
            &format!("{}/api/", server.uri()),
            &format!("{}/api/status/", server.uri()),
            session,
            Duration::from_secs(5),
            0,
        )
        .unwrap(),
    )
}

async fn mount_status(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

mod detector_tests {
    use super::*;

    #[tokio::test]
    async fn test_maintenance_warning_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "maintenanceActive": false,
                "maintenanceWarning": true,
                "maintenanceMessage": "Down 10pm",
                "releaseNotes": "",
                "releaseId": null
            })))
            .expect(2)
            .mount(&server)
            .await;

        let session = session(Role::User);
        let alerts = AlertStore::new();
        let detector = UpdateDetector::new(
            http_api(&server, session.clone()),
            session,
            alerts.clone(),
            SeenRegistry::new(Arc::new(MemoryStorage::new())),
        );

        assert_eq!(
            detector.tick().await,
            TickOutcome::Checked {
                maintenance_warning: true,
                release_announced: false
            }
        );
        let active = alerts.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, AlertKind::Warning);
        assert_eq!(active[0].message, "Down 10pm");
        assert!(alerts.modals().is_empty());

        // Second identical payload: guarded, nothing new.
        detector.tick().await;
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(Role::User);
        let alerts = AlertStore::new();
        let detector = UpdateDetector::new(
            http_api(&server, session.clone()),
            session,
            alerts.clone(),
            SeenRegistry::new(Arc::new(MemoryStorage::new())),
        );

        assert_eq!(detector.tick().await, TickOutcome::Failed);
        assert!(!detector.is_in_flight());
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let session = session(Role::User);
        let alerts = AlertStore::new();
        let detector = UpdateDetector::new(
            http_api(&server, session.clone()),
            session,
            alerts.clone(),
            SeenRegistry::new(Arc::new(MemoryStorage::new())),
        );

        assert_eq!(detector.tick().await, TickOutcome::Failed);
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_status_call_is_unauthenticated() {
        let server = MockServer::start().await;
        mount_status(&server, json!({ "maintenanceActive": true })).await;

        let api = http_api(&server, SessionHandle::default());
        let payload = api.fetch_status().await.unwrap();
        assert!(payload.maintenance_active);
    }

    #[tokio::test]
    async fn test_release_announced_once_across_restart() {
        let server = MockServer::start().await;
        mount_status(
            &server,
            json!({
                "maintenanceActive": false,
                "maintenanceWarning": false,
                "releaseNotes": "Drafts autosave.\nFaster comments.",
                "releaseId": 42,
                "releaseTitle": "Version 2.4"
            }),
        )
        .await;

        let dir = std::env::temp_dir().join(format!("tidings-it-{}", std::process::id()));
        let registry_path = dir.join("seen.json");
        let session = session(Role::User);

        let first_run = AlertStore::new();
        let detector = UpdateDetector::new(
            http_api(&server, session.clone()),
            session.clone(),
            first_run.clone(),
            SeenRegistry::new(Arc::new(FileStorage::new(&registry_path))),
        );
        assert_eq!(
            detector.tick().await,
            TickOutcome::Checked {
                maintenance_warning: false,
                release_announced: true
            }
        );
        let modals = first_run.modals();
        assert_eq!(modals.len(), 1);
        assert_eq!(modals[0].title, "Version 2.4");
        assert!(modals[0].message.contains('\n'));

        // Fresh process: new store, registry reopened from disk.
        let second_run = AlertStore::new();
        let detector = UpdateDetector::new(
            http_api(&server, session.clone()),
            session,
            second_run.clone(),
            SeenRegistry::new(Arc::new(FileStorage::new(&registry_path))),
        );
        detector.tick().await;
        assert!(second_run.is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }
}

mod feed_tests {
    use super::*;
    use tidings::notification::{FeedEntry, NotificationFeed};

    fn activity(id: i64, is_read: bool) -> serde_json::Value {
        json!({
            "id": id,
            "type": "like",
            "is_read": is_read,
            "created_at": "2024-05-01T12:00:00Z",
            "triggered_by": { "id": 3, "username": "jo" },
            "story": { "id": 11, "title": "The Lighthouse" },
            "story_id": 11
        })
    }

    #[tokio::test]
    async fn test_unread_count_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count/"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3 })))
            .expect(1)
            .mount(&server)
            .await;

        let api = http_api(&server, session(Role::User));
        assert_eq!(api.unread_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unread_filter_and_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/"))
            .and(query_param("unread", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "results": [activity(5, false)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = http_api(&server, session(Role::User));
        let items = api.list_notifications(true).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 5);
    }

    #[tokio::test]
    async fn test_expired_token_surfaces_as_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let api = http_api(&server, session(Role::User));
        let err = api.unread_count().await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_dropdown_merge_and_mark_read_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/release-notes/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "rel-2.4",
                "title": "Version 2.4",
                "summary": "Drafts autosave",
                "version": "2.4.0",
                "releaseType": "minor",
                "releaseDate": "2024-05-02",
                "isNew": true
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([activity(8, false), activity(7, true)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 1 })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/8/read/"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let feed = NotificationFeed::new(http_api(&server, session(Role::User)));
        feed.open_dropdown().await;

        let entries = feed.entries().await;
        assert_eq!(entries.len(), 4);
        assert!(matches!(&entries[0], FeedEntry::Release(n) if n.is_new && n.id.as_str() == "rel-2.4"));
        assert_eq!(entries[1], FeedEntry::Separator);
        assert!(matches!(&entries[2], FeedEntry::Activity(n) if n.id == 8));
        assert!(matches!(&entries[3], FeedEntry::Activity(n) if n.id == 7));

        // Read item: navigation only, no POST.
        assert_eq!(feed.click_activity(7).await.as_deref(), Some("/stories/11"));
        // Unread item: exactly one POST (asserted by wiremock on drop).
        assert_eq!(feed.click_activity(8).await.as_deref(), Some("/stories/11"));
        assert!(!feed.is_open());
    }

    #[tokio::test]
    async fn test_mark_all_read_posts_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/mark-all-read/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updated": 2 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unread_count": 0 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity(8, true)])))
            .mount(&server)
            .await;

        let feed = NotificationFeed::new(http_api(&server, session(Role::User)));
        feed.mark_all_read().await.unwrap();
        assert_eq!(feed.unread_count().await, 0);
        assert!(feed.activity().await.iter().all(|n| n.is_read));
    }

    #[tokio::test]
    async fn test_release_note_failure_clears_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/release-notes/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity(8, false)])))
            .mount(&server)
            .await;

        let feed = NotificationFeed::new(http_api(&server, session(Role::User)));
        feed.open_dropdown().await;

        assert!(feed.releases().await.is_empty());
        let entries = feed.entries().await;
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], FeedEntry::Activity(_)));
    }
}
