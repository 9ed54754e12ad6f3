use std::collections::HashMap;

use anyhow::ensure;
use casecache::{Parametrized, Suite, TestCase, TestContext};
use serde::Deserialize;

use super::mockserver::{VALID_PASSWORD, VALID_USERNAME};

pub const LOGIN_SUCCESS: &str = "test_login_for_access_token_success";
pub const LOGIN_FAILURES: &str = "test_login_failure_cases";
pub const PROTECTED_API: &str = "test_token_can_access_protected_api";
pub const ACCESS_TOKEN_KEY: &str = "access_token";

#[derive(Deserialize)]
struct TokenResponseData {
    access_token: String,
    token_type: String,
}

#[derive(Deserialize)]
struct UserProfile {
    username: String,
}

#[derive(Clone)]
pub struct LoginFailure {
    username: Option<&'static str>,
    password: Option<&'static str>,
    expected_status: u16,
    expected_keyword: &'static str,
}

#[derive(Clone)]
struct Api {
    client: reqwest::Client,
    base_uri: String,
}

impl Api {
    async fn login(&self, body: &HashMap<&str, &str>) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}/api/login/token", self.base_uri))
            .json(body)
            .send()
            .await
    }

    async fn me(&self, token: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}/api/users/me", self.base_uri))
            .bearer_auth(token)
            .send()
            .await
    }
}

/// The login scenarios: a smoke login storing the token, a table of rejected logins,
/// and a protected call depending on the stored token.
pub fn login_suite(base_uri: &str) -> Suite {
    let api = Api {
        client: reqwest::Client::new(),
        base_uri: base_uri.to_string(),
    };

    let success = {
        let api = api.clone();
        TestCase::new(LOGIN_SUCCESS, move |ctx: TestContext| {
            let api = api.clone();
            async move {
                let body = HashMap::from([("username", VALID_USERNAME), ("password", VALID_PASSWORD)]);
                let response = api.login(&body).await?;
                ensure!(
                    response.status().as_u16() == 200,
                    "expected status 200, got {}",
                    response.status()
                );
                let data: TokenResponseData = response.json().await?;
                ensure!(!data.access_token.is_empty(), "access_token is empty");
                ensure!(
                    data.token_type == "bearer",
                    "expected token_type 'bearer', got '{}'",
                    data.token_type
                );
                ctx.cache().set(ACCESS_TOKEN_KEY, &data.access_token).await?;
                Ok(())
            }
        })
        .mark("smoke")
    };

    let failures = {
        let api = api.clone();
        Parametrized::new(LOGIN_FAILURES)
            .row(
                "wrong_username",
                LoginFailure {
                    username: Some("wrong_user"),
                    password: Some(VALID_PASSWORD),
                    expected_status: 401,
                    expected_keyword: "invalid credentials",
                },
            )
            .row(
                "wrong_password",
                LoginFailure {
                    username: Some(VALID_USERNAME),
                    password: Some("wrong_password"),
                    expected_status: 401,
                    expected_keyword: "invalid credentials",
                },
            )
            .row(
                "missing_username",
                LoginFailure {
                    username: None,
                    password: Some(VALID_PASSWORD),
                    expected_status: 422,
                    expected_keyword: "username",
                },
            )
            .row(
                "missing_password",
                LoginFailure {
                    username: Some(VALID_USERNAME),
                    password: None,
                    expected_status: 422,
                    expected_keyword: "password",
                },
            )
            .cases(move |_ctx: TestContext, failure: LoginFailure| {
                let api = api.clone();
                async move {
                    let mut body = HashMap::new();
                    if let Some(username) = failure.username {
                        body.insert("username", username);
                    }
                    if let Some(password) = failure.password {
                        body.insert("password", password);
                    }
                    let response = api.login(&body).await?;
                    let status = response.status().as_u16();
                    ensure!(
                        status == failure.expected_status,
                        "expected status {}, got {}",
                        failure.expected_status,
                        status
                    );
                    let text = response.text().await?.to_lowercase();
                    ensure!(
                        text.contains(failure.expected_keyword),
                        "'{}' not found in response: {}",
                        failure.expected_keyword,
                        text
                    );
                    Ok(())
                }
            })
    };

    let protected = TestCase::new(PROTECTED_API, move |ctx: TestContext| {
        let api = api.clone();
        async move {
            let token: String = ctx.cache().get(ACCESS_TOKEN_KEY).await?;
            let response = api.me(&token).await?;
            ensure!(
                response.status().as_u16() == 200,
                "expected status 200, got {}",
                response.status()
            );
            let profile: UserProfile = response.json().await?;
            ensure!(
                profile.username == VALID_USERNAME,
                "unexpected user '{}'",
                profile.username
            );
            Ok(())
        }
    })
    .depends_on(LOGIN_SUCCESS, ACCESS_TOKEN_KEY)
    .mark("auth");

    Suite::new()
        .with(success)
        .with_all(failures)
        .with(protected)
}
