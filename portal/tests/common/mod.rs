#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use portal::config::{
    AuthProviderSettings, DatabaseSettings, DomainUrls, ObservabilitySettings, ServerSettings,
    SessionSettings, Settings,
};
use portal::models::{Organization, Profile};
use portal::services::{AuthUser, InMemoryDirectory, MockAuthProvider};
use portal::session::{session_cookies, StoredSession};
use portal::startup::build_router;
use portal::AppState;
use secrecy::Secret;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "sb-test-auth-token";
pub const OWNER_PASSWORD: &str = "correct horse battery staple";

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: "static".to_string(),
        },
        domains: DomainUrls {
            www: "https://www.example".to_string(),
            app: "https://app.example".to_string(),
            admin: "https://admin.example".to_string(),
            ops: "https://ops.example".to_string(),
        },
        auth: AuthProviderSettings {
            url: "http://auth.invalid".to_string(),
            anon_key: Secret::new("anon".to_string()),
            request_timeout_secs: 1,
        },
        session: SessionSettings {
            cookie_name: COOKIE_NAME.to_string(),
            cookie_domain: None,
            secure_cookies: true,
            max_age_days: 400,
        },
        database: DatabaseSettings {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 0,
            run_migrations: false,
        },
        observability: ObservabilitySettings::default(),
    }
}

/// A tenant with one organization and a user per role, plus an outsider.
pub struct TestApp {
    pub router: Router,
    pub auth: Arc<MockAuthProvider>,
    pub directory: Arc<InMemoryDirectory>,
    pub acme: Organization,
    pub globex: Organization,
    pub owner: AuthUser,
    pub admin: AuthUser,
    pub member: AuthUser,
    pub ops: AuthUser,
    pub outsider: AuthUser,
}

fn user(email: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
    }
}

/// Bearer token the mock provider accepts for `user`.
pub fn token_for(user: &AuthUser) -> String {
    format!("token-{}", user.id)
}

impl TestApp {
    pub fn spawn() -> Self {
        let acme = Organization {
            id: Uuid::new_v4(),
            slug: "acme".to_string(),
            name: "Acme Corp".to_string(),
        };
        let globex = Organization {
            id: Uuid::new_v4(),
            slug: "globex".to_string(),
            name: "Globex".to_string(),
        };

        let owner = user("owner@acme.test");
        let admin = user("admin@acme.test");
        let member = user("member@acme.test");
        let ops = user("ops@acme.test");
        let outsider = user("outsider@elsewhere.test");

        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_organization(acme.clone()).unwrap();
        directory.insert_organization(globex.clone()).unwrap();
        directory.insert_membership(owner.id, acme.id, "owner").unwrap();
        directory.insert_membership(owner.id, globex.id, "member").unwrap();
        directory.insert_membership(admin.id, acme.id, "admin").unwrap();
        directory.insert_membership(member.id, acme.id, "member").unwrap();
        directory.insert_membership(ops.id, acme.id, "ops").unwrap();
        directory.insert_profile(Profile {
            id: owner.id,
            email: owner.email.clone(),
            default_org_id: Some(acme.id),
        })
        .unwrap();

        let mut auth = MockAuthProvider::new()
            .with_password("owner@acme.test", OWNER_PASSWORD, owner.clone())
            .unwrap();
        for user in [&owner, &admin, &member, &ops, &outsider] {
            auth = auth.with_token(&token_for(user), user.clone()).unwrap();
        }
        let auth = Arc::new(auth);

        let state = AppState::new(test_settings(), auth.clone(), directory.clone());

        Self {
            router: build_router(state),
            auth,
            directory,
            acme,
            globex,
            owner,
            admin,
            member,
            ops,
            outsider,
        }
    }

    pub async fn get(&self, host: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(Method::GET, host, uri, cookie, None, Body::empty())
            .await
    }

    pub async fn post_form(
        &self,
        host: &str,
        uri: &str,
        cookie: Option<&str>,
        form: &str,
    ) -> Response<Body> {
        self.send(
            Method::POST,
            host,
            uri,
            cookie,
            Some("application/x-www-form-urlencoded"),
            Body::from(form.to_string()),
        )
        .await
    }

    pub async fn send(
        &self,
        method: Method,
        host: &str,
        uri: &str,
        cookie: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, host);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }

        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }
}

/// `Cookie` header value carrying a session for `access_token`, encoded the
/// same way sign-in writes it.
pub fn session_cookie(access_token: &str) -> String {
    let session = StoredSession {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh".to_string()),
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: None,
    };

    session_cookies(&session, &test_settings().session)
        .unwrap()
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
