#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use keepalley::test_utils::test_helpers::{
    create_test_app, create_test_db, create_test_state, RecordingEmailService,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drives the real router while carrying the session cookie between
/// requests, like a browser would.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Loads `form_uri` and submits its CSRF token along with `fields`.
    pub async fn submit(
        &mut self,
        form_uri: &str,
        action: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let page = self.get(form_uri).await;
        let token = extract_csrf_token(&page.body)
            .unwrap_or_else(|| panic!("no CSRF token on {}", form_uri));

        let mut with_token: Vec<(&str, &str)> = fields.to_vec();
        with_token.push(("csrf_token", token.as_str()));
        self.post_form(action, &with_token).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.submit(
            "/login",
            "/login",
            &[("email", email), ("password", password)],
        )
        .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub email: Arc<RecordingEmailService>,
    pub client: TestClient,
}

pub async fn spawn_app() -> TestApp {
    let pool = create_test_db().await.unwrap();
    let email = Arc::new(RecordingEmailService::new());
    let state = create_test_state(pool.clone(), email.clone());
    TestApp {
        pool,
        email,
        client: TestClient::new(create_test_app(state)),
    }
}

impl TestApp {
    /// A second browser against the same application.
    pub fn new_client(&self) -> TestClient {
        let state = create_test_state(self.pool.clone(), self.email.clone());
        TestClient::new(create_test_app(state))
    }
}
