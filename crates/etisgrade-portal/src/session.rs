//! Authenticated HTTP session against the ETIS portal.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use etisgrade_core::error::AnalysisError;
use etisgrade_core::model::GradeSet;
use etisgrade_core::traits::{Credentials, PortalConnector, PortalSession};

use crate::config::PortalSettings;
use crate::{grades, terms};

/// Text only present on the portal's login form.
pub const LOGIN_MARKER: &str = "Вход";

const LOGIN_PATH: &str = "/stu.login";
const SIGNS_PATH: &str = "/stu.signs?p_mode=current";

/// Connector that opens real portal sessions over HTTPS.
pub struct EtisPortal {
    settings: PortalSettings,
}

impl EtisPortal {
    pub fn new(settings: PortalSettings) -> Self {
        if settings.accept_invalid_certs {
            warn!(
                base_url = %settings.base_url,
                "TLS certificate validation is disabled for the portal"
            );
        }
        Self { settings }
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, AnalysisError> {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .user_agent(self.settings.user_agent.clone())
            .danger_accept_invalid_certs(self.settings.accept_invalid_certs)
            .build()
            .map_err(|e| AnalysisError::Transport(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl PortalConnector for EtisPortal {
    #[instrument(skip_all, fields(user = %credentials.username))]
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn PortalSession>, AnalysisError> {
        let session = EtisSession::login(self.build_client()?, &self.settings, credentials).await?;
        Ok(Box::new(session))
    }
}

/// A logged-in portal session. Cookies live inside the client.
pub struct EtisSession {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl EtisSession {
    /// Submit the login form and keep the session cookies it sets.
    ///
    /// The portal answers a failed login with the login page itself, whatever
    /// the status code, so the marker text is the only failure signal.
    pub async fn login(
        client: reqwest::Client,
        settings: &PortalSettings,
        credentials: &Credentials,
    ) -> Result<Self, AnalysisError> {
        let session = Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
        };

        let form = [
            ("p_username", credentials.username.as_str()),
            ("p_password", credentials.password.as_str()),
            ("p_redirect", ""),
        ];
        let response = session
            .client
            .post(session.url(LOGIN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| session.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| session.transport_error(e))?;

        if body.contains(LOGIN_MARKER) {
            debug!(status, "login form returned after submit");
            return Err(AnalysisError::Auth);
        }
        debug!(status, "logged in");
        Ok(session)
    }

    /// The "current status" page listing the available terms.
    pub async fn status_page(&self) -> Result<String, AnalysisError> {
        self.get(&self.url(SIGNS_PATH)).await
    }

    /// The grades page of one term.
    pub async fn grades_page(&self, term: u32) -> Result<String, AnalysisError> {
        self.get(&format!("{}&p_term={term}", self.url(SIGNS_PATH))).await
    }

    async fn get(&self, url: &str) -> Result<String, AnalysisError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AnalysisError::Transport(format!(
                "portal answered HTTP {} for {url}",
                status.as_u16()
            )));
        }
        response.text().await.map_err(|e| self.transport_error(e))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.timeout_secs)
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl PortalSession for EtisSession {
    async fn list_terms(&mut self) -> Result<Vec<u32>, AnalysisError> {
        terms::list_terms(self).await
    }

    async fn scrape(&mut self, terms: &[u32]) -> Result<GradeSet, AnalysisError> {
        grades::scrape(self, terms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_PAGE: &str =
        "<html><body><form><h1>Вход в систему</h1><input name=p_username></form></body></html>";
    const HOME_PAGE: &str = "<html><body><h1>Личный кабинет</h1></body></html>";

    fn settings(server: &MockServer) -> PortalSettings {
        PortalSettings {
            base_url: server.uri(),
            timeout_secs: 5,
            ..PortalSettings::default()
        }
    }

    #[tokio::test]
    async fn successful_login_posts_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .and(body_string_contains("p_username=student"))
            .and(body_string_contains("p_password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let portal = EtisPortal::new(settings(&server));
        let result = portal.login(&Credentials::new("student", "secret")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn login_marker_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
            .mount(&server)
            .await;

        let portal = EtisPortal::new(settings(&server));
        let err = portal
            .login(&Credentials::new("student", "wrong"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Auth));
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[tokio::test]
    async fn login_marker_wins_over_status_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .respond_with(ResponseTemplate::new(500).set_body_string(LOGIN_PAGE))
            .mount(&server)
            .await;

        let portal = EtisPortal::new(settings(&server));
        let err = portal
            .login(&Credentials::new("student", "wrong"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Auth));
    }

    #[tokio::test]
    async fn session_cookie_is_sent_with_page_fetches() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session_id=abc123; Path=/")
                    .set_body_string(HOME_PAGE),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/stu.signs"))
            .and(query_param("p_mode", "current"))
            .and(query_param("p_term", "3"))
            .and(header("cookie", "session_id=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>term 3</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().cookie_store(true).build().unwrap();
        let session = EtisSession::login(
            client,
            &settings(&server),
            &Credentials::new("student", "secret"),
        )
        .await
        .unwrap();

        let page = session.grades_page(3).await.unwrap();
        assert_eq!(page, "<p>term 3</p>");
    }

    #[tokio::test]
    async fn server_error_on_fetch_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stu.signs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let session = EtisSession::login(
            client,
            &settings(&server),
            &Credentials::new("student", "secret"),
        )
        .await
        .unwrap();

        let err = session.status_page().await.unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn slow_portal_is_timeout_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/stu.login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(HOME_PAGE)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let portal = EtisPortal::new(PortalSettings {
            timeout_secs: 1,
            ..settings(&server)
        });
        assert_eq!(portal.settings().timeout_secs, 1);

        let err = portal
            .login(&Credentials::new("student", "secret"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Timeout(1)));
        assert_eq!(err.status_code(), 504);
    }

    #[tokio::test]
    async fn unreachable_portal_is_transport_error() {
        let portal = EtisPortal::new(PortalSettings {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..PortalSettings::default()
        });
        let err = portal
            .login(&Credentials::new("student", "secret"))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AnalysisError::Transport(_) | AnalysisError::Timeout(_)
        ));
    }
}
