//! End-to-end tests of the portal client against a mocked ETIS server.
//!
//! These drive the analysis engine through real HTTP, cookie handling and
//! HTML parsing, with a renderer that only records what it was given.

use std::sync::Arc;

use etisgrade_core::cache::{AnalysisKey, ArtifactBundle, ArtifactKind};
use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::GradeSet;
use etisgrade_core::statistics::AnalysisStats;
use etisgrade_core::traits::{ArtifactRenderer, Credentials};
use etisgrade_core::AnalysisEngine;
use etisgrade_portal::{EtisPortal, PortalSettings};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME_PAGE: &str = "<html><body><h1>Студент</h1></body></html>";
const LOGIN_PAGE: &str = "<html><body><h2>Вход</h2><form></form></body></html>";

const STATUS_PAGE: &str = r#"<html><body>
<div class="submenu">
  <span class="submenu-item"><a href="stu.signs?p_mode=current&p_term=3">3 семестр</a></span>
  <span class="submenu-item">2 семестр</span>
</div>
</body></html>"#;

fn grades_page(sections: &[(&str, &[[&str; 9]])]) -> String {
    let mut html = String::from("<html><body><table class=\"layout\"><tr><td>menu</td></tr></table>");
    for (subject, rows) in sections {
        html.push_str(&format!("<h3>{subject}</h3>"));
        html.push_str("<table class=\"common\"><tr><th>h</th></tr><tr><th>cols</th></tr>");
        for row in *rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{cell}</td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
    }
    html.push_str("</body></html>");
    html
}

fn row(grade: &str) -> [&str; 9] {
    ["КТ", "ЛР", "Защита", grade, "3", "4", "5", "01.10.2024", "Иванов"]
}

/// Writes the number of rows and subjects into the CSV slot.
struct SummaryRenderer;

impl ArtifactRenderer for SummaryRenderer {
    fn render(
        &self,
        grades: &GradeSet,
        stats: &AnalysisStats,
    ) -> Result<ArtifactBundle, AnalysisError> {
        Ok(ArtifactBundle {
            table_csv: format!("{}/{}", grades.len(), stats.subjects.len()).into_bytes(),
            ..ArtifactBundle::default()
        })
    }
}

async fn mount_login(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/stu.login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session_id=s1; Path=/")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/stu.signs"))
        .and(query_param("p_mode", "current"))
        .and(header("cookie", "session_id=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_PAGE))
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_term(server: &MockServer, term: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/stu.signs"))
        .and(query_param("p_term", term.to_string()))
        .and(header("cookie", "session_id=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(1)
        .mount(server)
        .await;
}

fn engine(server: &MockServer) -> AnalysisEngine {
    let portal = EtisPortal::new(PortalSettings {
        base_url: server.uri(),
        timeout_secs: 5,
        ..PortalSettings::default()
    });
    AnalysisEngine::new(Arc::new(portal), Arc::new(SummaryRenderer))
}

#[tokio::test]
async fn discover_terms_merges_links_and_labels() {
    let server = MockServer::start().await;
    mount_login(&server, HOME_PAGE).await;
    mount_status(&server).await;

    let terms = engine(&server)
        .discover_terms(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert_eq!(terms, vec![2, 3]);
}

#[tokio::test]
async fn login_marker_fails_both_entry_points() {
    let server = MockServer::start().await;
    mount_login(&server, LOGIN_PAGE).await;
    mount_status(&server).await;

    let engine = engine(&server);
    let creds = Credentials::new("student", "wrong");

    let err = engine.discover_terms(&creds).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Auth));
    assert_eq!(err.status_code(), 401);

    let err = engine.run_analysis(&creds, None).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Auth));
}

#[tokio::test]
async fn full_analysis_over_discovered_terms() {
    let server = MockServer::start().await;
    mount_login(&server, HOME_PAGE).await;
    mount_status(&server).await;
    mount_term(
        &server,
        2,
        grades_page(&[("Математика", &[row("5"), row("н/я")]), ("Физика", &[row("3")])]),
    )
    .await;
    mount_term(&server, 3, grades_page(&[("Математика", &[row("4")])])).await;

    let engine = engine(&server);
    let outcome = engine
        .run_analysis(&Credentials::new("student", "secret"), None)
        .await
        .unwrap();

    assert_eq!(outcome.rows, 4);
    assert_eq!(
        outcome.bar_data.labels,
        vec!["Математика (3 КТ)", "Физика (1 КТ)"]
    );
    assert_eq!(outcome.bar_data.values, vec![4.5, 3.0]);
    assert_eq!(outcome.line_data.labels, vec![2, 3]);
    assert_eq!(outcome.line_data.values, vec![4.0, 4.0]);

    let csv = engine
        .export(&AnalysisKey::new("student", None), ArtifactKind::TableCsv)
        .unwrap();
    assert_eq!(csv, b"4/2");
}

#[tokio::test]
async fn single_term_analysis_fetches_only_that_term() {
    let server = MockServer::start().await;
    mount_login(&server, HOME_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/stu.signs"))
        .and(query_param("p_term", "3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(grades_page(&[("Химия", &[row("5"), row("4")])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server);
    let outcome = engine
        .run_analysis(&Credentials::new("student", "secret"), Some(3))
        .await
        .unwrap();

    assert_eq!(outcome.key, AnalysisKey::new("student", Some(3)));
    assert_eq!(outcome.line_data.labels, vec![3]);
    assert_eq!(outcome.line_data.values, vec![9.0]);
}

#[tokio::test]
async fn pages_without_tables_are_no_data() {
    let server = MockServer::start().await;
    mount_login(&server, HOME_PAGE).await;
    mount_term(&server, 5, "<html><body>Нет данных</body></html>".to_string()).await;

    let engine = engine(&server);
    let err = engine
        .run_analysis(&Credentials::new("student", "secret"), Some(5))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NoData));
    assert_eq!(err.status_code(), 400);

    let err = engine
        .export(&AnalysisKey::new("student", Some(5)), ArtifactKind::TableCsv)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NotFound(_)));
}
