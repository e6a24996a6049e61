//! GitHub adapter behaviour against a mock REST API.

use std::time::Duration;

use futures::TryStreamExt;
use github::{GithubClient, GithubConfig, GithubError, PER_PAGE};
use pipeline::{IssueNumber, IssueRef, IssueTracker, LabelName, RepositoryRef, TrackerError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(GithubConfig {
        api_url: server.uri(),
        token: Some("gh-token".to_string()),
        user_agent: "LabelCat".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn hello_world_issue(number: u64) -> IssueRef {
    IssueRef {
        repository: "Codertocat/Hello-World".parse().unwrap(),
        number: IssueNumber::new(number),
    }
}

fn api_issue(title: &str, labels: &[&str]) -> serde_json::Value {
    json!({
        "repository_url": "https://api.github.com/repos/o/r",
        "title": title,
        "body": format!("{title} body"),
        "labels": labels.iter().map(|l| json!({"name": l})).collect::<Vec<_>>(),
    })
}

// ---------------------------------------------------------------------------
// Label application
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_labels_posts_label_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/Codertocat/Hello-World/issues/2/labels"))
        .and(header("authorization", "Bearer gh-token"))
        .and(header("user-agent", "LabelCat"))
        .and(body_json(json!({"labels": ["bug"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 271022241, "name": "bug", "color": "fc2929", "default": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_labels(&hello_world_issue(2), &[LabelName::new("bug").unwrap()])
        .await
        .unwrap();
}

#[tokio::test]
async fn add_labels_reports_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/Codertocat/Hello-World/issues/2/labels"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .add_labels(&hello_world_issue(2), &[LabelName::new("bug").unwrap()])
        .await
        .unwrap_err();

    match err {
        TrackerError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not Found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Harvesting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pages_follow_link_header_until_last() {
    let server = MockServer::start().await;
    let issues_path = "/repos/o/r/issues";

    Mock::given(method("GET"))
        .and(path(issues_path))
        .and(query_param("state", "all"))
        .and(query_param("per_page", PER_PAGE.to_string()))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    "<https://api.github.com/repos/o/r/issues?page=2>; rel=\"next\"",
                )
                .set_body_json(json!([api_issue("first", &["bug"]), api_issue("second", &[])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut pull_request = api_issue("a pull request", &[]);
    pull_request["pull_request"] = json!({"url": "https://api.github.com/repos/o/r/pulls/3"});
    Mock::given(method("GET"))
        .and(path(issues_path))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    "<https://api.github.com/repos/o/r/issues?page=1>; rel=\"prev\"",
                )
                .set_body_json(json!([api_issue("third", &["enhancement"]), pull_request])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let github = client(&server);
    let repo: RepositoryRef = "o/r".parse().unwrap();
    let pages: Vec<_> = github.issue_pages(repo, 10).try_collect().await.unwrap();

    assert_eq!(pages.len(), 2);
    let titles: Vec<_> = pages
        .iter()
        .flat_map(|p| p.issues.iter().map(|i| i.title.as_str()))
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(pages[0].issues[0].labels, vec!["bug"]);
}

#[tokio::test]
async fn page_bound_stops_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", "<https://api.github.com/x?page=99>; rel=\"next\"")
                .set_body_json(json!([api_issue("endless", &[])])),
        )
        .expect(3)
        .mount(&server)
        .await;

    let github = client(&server);
    let pages: Vec<_> = github
        .issue_pages("o/r".parse().unwrap(), 3)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages.last().unwrap().page, 3);
}

#[tokio::test]
async fn short_page_without_link_is_the_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([api_issue("only", &[])])))
        .expect(1)
        .mount(&server)
        .await;

    let pages: Vec<_> = client(&server)
        .issue_pages("o/r".parse().unwrap(), 10)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert!(!pages[0].has_next);
}

#[tokio::test]
async fn listing_error_ends_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/missing/issues"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result: Result<Vec<_>, _> = client(&server)
        .issue_pages("o/missing".parse().unwrap(), 10)
        .try_collect()
        .await;
    assert!(matches!(result, Err(GithubError::Status { status: 404, .. })));
}

#[tokio::test]
async fn stalled_listing_fails_with_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let github = GithubClient::new(GithubConfig {
        api_url: server.uri(),
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        github.issue_pages("o/r".parse().unwrap(), 1).try_next(),
    )
    .await
    .expect("client timeout bounds the request");
    match result {
        Err(GithubError::Transport(err)) => assert!(err.is_timeout()),
        other => panic!("expected a transport timeout, got {other:?}"),
    }
}
