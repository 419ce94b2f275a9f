//! FIRST cutouts end to end against a mock archive

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{FIRST_NO_DATA_PAGE, FIRST_PATH, fits_payload, mock_config, reference_target, temp_files};
use radioquery::{CutoutQuery, ErrorKind, Survey};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn reference_target_is_fetched_once_and_then_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .and(query_param("RA", "10 50 07.27 +30 40 37.52"))
        .and(query_param("ImageSize", "5"))
        .and(query_param("ImageType", "FITS File"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .set_body_bytes(fits_payload(2, 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let first = query.download_image().await;
    assert!(first.success, "{:?}", first.error);
    assert!(first.fetched);
    assert!(first.path.is_absolute());
    assert_eq!(
        first.path,
        std::path::absolute(root.path().join("FIRST/FIRST_J105007.27+304037.52_5arcmin.fits")).unwrap()
    );
    assert_eq!(std::fs::read(&first.path).unwrap(), fits_payload(2, 1));

    // second call is served from disk; the mock's expect(1) fails the test otherwise
    let second = query.download_image().await;
    assert!(second.success);
    assert!(!second.fetched);
    assert_eq!(second.path, first.path);
}

#[tokio::test]
async fn overwrite_replaces_existing_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 7)))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config)
        .unwrap()
        .overwrite(true);

    let target = query.artifact_path().await.unwrap();
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, fits_payload(1, 3)).unwrap();

    let result = query.download_image().await;
    assert!(result.success);
    assert!(result.fetched);
    assert_eq!(std::fs::read(&target).unwrap(), fits_payload(1, 7));
}

#[tokio::test]
async fn overwrite_fetches_on_every_call_and_keeps_latest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 1)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(2, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config)
        .unwrap()
        .overwrite(true);

    let first = query.download_image().await;
    let second = query.download_image().await;

    assert!(first.fetched && second.fetched);
    assert_eq!(first.path, second.path);
    assert_eq!(std::fs::read(&second.path).unwrap(), fits_payload(2, 2));
}

#[tokio::test]
async fn html_error_page_is_rejected_and_nothing_is_left_behind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIRST_NO_DATA_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let result = query.download_image().await;
    assert!(!result.success);
    assert!(!result.fetched);
    assert!(!result.path.exists());
    assert_eq!(result.error.unwrap().kind, ErrorKind::InvalidResponse);
    assert!(temp_files(&root.path().join("FIRST")).is_empty());
}

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    // mounted first, so it answers the first two requests
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let outcome = query.try_download_image().await.unwrap();
    assert!(outcome.fetched);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn persistent_outage_reports_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let result = query.download_image().await;
    assert!(!result.success);
    assert_eq!(result.error.unwrap().kind, ErrorKind::Network);
    assert!(!result.path.exists());
}

#[tokio::test]
async fn caller_supplied_directory_is_used_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 0)))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config)
        .unwrap()
        .destination(elsewhere.path().join("nested"));

    let result = query.download_image().await;
    assert!(result.success);
    assert!(result.path.starts_with(elsewhere.path()));
    assert!(!root.path().join("FIRST").exists());
}

#[tokio::test]
async fn stale_html_at_artifact_path_is_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let target = query.artifact_path().await.unwrap();
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, "<html><body>No FIRST data</body></html>").unwrap();

    let result = query.download_image().await;
    assert!(result.success, "{:?}", result.error);
    assert!(result.fetched);
    assert_eq!(std::fs::read(&target).unwrap(), fits_payload(1, 4));
}

#[tokio::test]
async fn timed_out_attempts_count_against_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fits_payload(1, 5))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(1, 6)))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let mut config = mock_config(&server, root.path());
    config.http.request_timeout = Duration::from_millis(300);
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config).unwrap();

    let outcome = query.try_download_image().await.unwrap();
    assert_eq!(outcome.attempts, 3);
    assert_eq!(std::fs::read(&outcome.path).unwrap(), fits_payload(1, 6));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overwrites_leave_one_intact_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FIRST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fits_payload(4, 9)))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = mock_config(&server, root.path());
    let query = CutoutQuery::with_config(Survey::First, reference_target(), 5.0, config)
        .unwrap()
        .overwrite(true);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let query = query.clone();
            tokio::spawn(async move { query.download_image().await })
        })
        .collect();
    for task in tasks {
        let result = task.await.unwrap();
        assert!(result.success, "{:?}", result.error);
    }

    let dir = root.path().join("FIRST");
    let entries: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, ["FIRST_J105007.27+304037.52_5arcmin.fits"]);
    assert_eq!(std::fs::read(dir.join(&entries[0])).unwrap(), fits_payload(4, 9));
}
