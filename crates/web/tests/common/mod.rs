#![allow(dead_code, unreachable_pub)]

use std::collections::BTreeMap;

use salvo::http::header::{COOKIE, LOCATION};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt, TestClient};
use warbler::{AppState, Config};
use warbler_models::{Signup, User};

pub const PASSWORD: &str = "HASHED_PASSWORD";
const BASE_URL: &str = "http://127.0.0.1:5800";

/// A client that keeps cookies between requests, like a browser would.
pub struct Browser {
    service: Service,
    cookies: BTreeMap<String, String>,
}

impl Browser {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            cookies: BTreeMap::new(),
        }
    }

    pub async fn get(&mut self, path: &str) -> Response {
        self.send(TestClient::get(format!("{BASE_URL}{path}"))).await
    }

    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Response {
        self.send(TestClient::post(format!("{BASE_URL}{path}")).form(&form.to_vec()))
            .await
    }

    /// Follows redirects until a non-redirect response arrives.
    pub async fn follow(&mut self, mut res: Response) -> Response {
        while let Some(location) = location(&res) {
            res = self.get(&location).await;
        }
        res
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Response {
        self.post("/login", &[("username", username), ("password", password)])
            .await
    }

    async fn send(&mut self, mut builder: RequestBuilder) -> Response {
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.add_header(COOKIE, header, true);
        }
        let res = builder.send(&self.service).await;
        for cookie in res.cookies().delta() {
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
        res
    }
}

/// The `Location` header of a redirect.
pub fn location(res: &Response) -> Option<String> {
    if !res.status_code.is_some_and(|code| code.is_redirection()) {
        return None;
    }
    res.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

pub async fn body(res: &mut Response) -> String {
    res.take_string().await.unwrap()
}

/// A fresh in-memory application with `testuser` and `testuser2` signed up.
pub struct TestApp {
    pub state: AppState,
    pub browser: Browser,
    pub u: User,
    pub u2: User,
}

pub async fn setup() -> TestApp {
    let config = Config::in_memory();
    let (service, state) = warbler::build(&config).await.unwrap();
    let u = User::signup(
        &state.db,
        Signup::new("testuser", "test@test.com", PASSWORD),
        config.bcrypt_cost,
    )
    .await
    .unwrap();
    let u2 = User::signup(
        &state.db,
        Signup::new("testuser2", "user2@user.com", PASSWORD),
        config.bcrypt_cost,
    )
    .await
    .unwrap();
    TestApp {
        state,
        browser: Browser::new(service),
        u,
        u2,
    }
}
