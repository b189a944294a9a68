pub mod models;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use snafu::{OptionExt, ResultExt, Snafu};

use models::{
    Domain, KubeconfigOptions, KubeconfigRequest, LoginCredentials, LoginRequest, LoginResponse,
    Project, ShootCluster, ShootClusterRequest, WorkerGroupRequest,
};

pub const DEFAULT_API_URL: &str = "https://rest.cleura.cloud";
pub const DEFAULT_GARDENER_DOMAIN: &str = "public";
pub const DEFAULT_KUBECONFIG_DURATION: u64 = 86400;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const LOGIN_OK: &str = "login_ok";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("request failed: {}", source))]
    Http { source: reqwest::Error },

    #[snafu(display("{}", status_message(*status, *expected, body)))]
    Status {
        status: StatusCode,
        expected: StatusCode,
        body: String,
    },

    #[snafu(display("unable to decode response: {}", source))]
    Decode { source: serde_json::Error },

    #[snafu(display("get token failed, expected result `{}`, got `{}`", LOGIN_OK, result))]
    Login { result: String },

    #[snafu(display("`{}` is not a valid API URL", url))]
    InvalidUrl { url: String },
}

impl Error {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_message(status: StatusCode, expected: StatusCode, body: &str) -> String {
    if status == StatusCode::FORBIDDEN {
        return "invalid token".to_string();
    }

    format!(
        "unexpected response status {} (expected {}): {}",
        status.as_u16(),
        expected.as_u16(),
        body
    )
}

/// Where shoot clusters of one project live.
#[derive(Debug, Clone, Copy)]
pub struct ShootScope<'a> {
    pub gardener_domain: &'a str,
    pub region: &'a str,
    pub project_id: &'a str,
}

/// Authenticated access to the REST API.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    token: String,
}

impl Client {
    pub fn new(base_url: &str, username: &str, token: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(HttpSnafu)?;

        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .context(InvalidUrlSnafu { url: base_url })?;

        Ok(Self {
            http,
            base_url,
            username: username.to_string(),
            token: token.to_string(),
        })
    }

    /// Logs in with a password and returns a client holding the issued token.
    pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Self, Error> {
        let mut client = Self::new(base_url, username, "")?;

        let request = client
            .request(Method::POST, &["auth", "v1", "tokens"])?
            .json(&LoginRequest {
                auth: LoginCredentials {
                    login: username,
                    password,
                },
            });
        let response: LoginResponse = client.send_json(request, StatusCode::OK).await?;

        if response.result != LOGIN_OK {
            return LoginSnafu {
                result: response.result,
            }
            .fail();
        }

        client.token = response.token;
        Ok(client)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn validate_token(&self) -> Result<(), Error> {
        let request = self.request(Method::POST, &["auth", "v1", "tokens", "validate"])?;
        self.send(request, StatusCode::NO_CONTENT).await?;

        Ok(())
    }

    pub async fn revoke_token(&self) -> Result<(), Error> {
        let request = self.request(Method::DELETE, &["auth", "v1", "tokens"])?;
        self.send(request, StatusCode::NO_CONTENT).await?;

        Ok(())
    }

    pub async fn list_domains(&self) -> Result<Vec<Domain>, Error> {
        let request = self.request(
            Method::GET,
            &["accesscontrol", "v1", "openstack", "domains"],
        )?;
        self.send_json(request, StatusCode::OK).await
    }

    pub async fn list_projects(&self, domain_id: &str) -> Result<Vec<Project>, Error> {
        let request = self.request(
            Method::GET,
            &["accesscontrol", "v1", "openstack", domain_id, "projects"],
        )?;
        self.send_json(request, StatusCode::OK).await
    }

    pub async fn list_shoot_clusters(
        &self,
        scope: ShootScope<'_>,
    ) -> Result<Vec<ShootCluster>, Error> {
        let request = self.request(Method::GET, &shoot_segments(scope, &[]))?;
        self.send_json(request, StatusCode::OK).await
    }

    /// Returns the created cluster object as sent back by the API.
    pub async fn create_shoot_cluster(
        &self,
        scope: ShootScope<'_>,
        cluster: &ShootClusterRequest,
    ) -> Result<serde_json::Value, Error> {
        let request = self
            .request(Method::POST, &shoot_segments(scope, &[]))?
            .json(cluster);
        self.send_json(request, StatusCode::OK).await
    }

    /// Returns the response body, a human readable confirmation.
    pub async fn delete_shoot_cluster(
        &self,
        scope: ShootScope<'_>,
        name: &str,
    ) -> Result<String, Error> {
        let request = self.request(Method::DELETE, &shoot_segments(scope, &[name]))?;
        self.send(request, StatusCode::ACCEPTED).await
    }

    /// Returns the updated cluster.
    pub async fn add_worker_group(
        &self,
        scope: ShootScope<'_>,
        name: &str,
        worker_group: &WorkerGroupRequest,
    ) -> Result<serde_json::Value, Error> {
        let request = self
            .request(Method::POST, &shoot_segments(scope, &[name, "worker"]))?
            .json(worker_group);
        self.send_json(request, StatusCode::ACCEPTED).await
    }

    pub async fn delete_worker_group(
        &self,
        scope: ShootScope<'_>,
        name: &str,
        worker_group: &str,
    ) -> Result<serde_json::Value, Error> {
        let segments = shoot_segments(scope, &[name, "worker", worker_group]);
        let request = self.request(Method::DELETE, &segments)?;
        self.send_json(request, StatusCode::ACCEPTED).await
    }

    pub async fn hibernate_shoot_cluster(
        &self,
        scope: ShootScope<'_>,
        name: &str,
    ) -> Result<(), Error> {
        let request = self.request(Method::POST, &shoot_segments(scope, &[name, "hibernate"]))?;
        self.send(request, StatusCode::ACCEPTED).await?;

        Ok(())
    }

    pub async fn wake_up_shoot_cluster(
        &self,
        scope: ShootScope<'_>,
        name: &str,
    ) -> Result<(), Error> {
        let request = self.request(Method::POST, &shoot_segments(scope, &[name, "wakeup"]))?;
        self.send(request, StatusCode::ACCEPTED).await?;

        Ok(())
    }

    /// Returns the kubeconfig document, valid for `expiration_seconds`.
    pub async fn generate_kubeconfig(
        &self,
        scope: ShootScope<'_>,
        name: &str,
        expiration_seconds: u64,
    ) -> Result<String, Error> {
        let segments = shoot_segments(scope, &[name, "adminkubeconfig"]);
        let request = self
            .request(Method::POST, &segments)?
            .json(&KubeconfigRequest {
                config: KubeconfigOptions { expiration_seconds },
            });
        self.send_json(request, StatusCode::OK).await
    }

    /// Credentials of the monitoring stack of a shoot cluster, passed through as is.
    pub async fn monitoring_credentials(
        &self,
        scope: ShootScope<'_>,
        name: &str,
    ) -> Result<serde_json::Value, Error> {
        let request = self.request(Method::GET, &shoot_segments(scope, &[name, "monitoring"]))?;
        self.send_json(request, StatusCode::OK).await
    }

    /// The base URL with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()
            .context(InvalidUrlSnafu {
                url: self.base_url.as_str(),
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, Error> {
        Ok(self
            .http
            .request(method, self.endpoint(segments)?)
            .header("X-AUTH-LOGIN", &self.username)
            .header("X-AUTH-TOKEN", &self.token))
    }

    async fn send(&self, request: RequestBuilder, expected: StatusCode) -> Result<String, Error> {
        let response = request.send().await.context(HttpSnafu)?;
        let status = response.status();
        let body = response.text().await.context(HttpSnafu)?;

        log::debug!("{} responded {}", self.base_url, status);

        if status != expected {
            return StatusSnafu {
                status,
                expected,
                body,
            }
            .fail();
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<T, Error> {
        let body = self.send(request, expected).await?;
        serde_json::from_str(&body).context(DecodeSnafu)
    }
}

fn shoot_segments<'a>(scope: ShootScope<'a>, extra: &[&'a str]) -> Vec<&'a str> {
    let mut segments = vec![
        "gardener",
        "v1",
        scope.gardener_domain,
        "shoot",
        scope.region,
        scope.project_id,
    ];
    segments.extend_from_slice(extra);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const SCOPE: ShootScope<'static> = ShootScope {
        gardener_domain: "public",
        region: "kna1",
        project_id: "p-1",
    };

    #[test]
    fn shoot_endpoints_are_scoped() {
        let client = Client::new("https://rest.example.test", "alice", "t0k3n").unwrap();

        assert_eq!(
            client.endpoint(&shoot_segments(SCOPE, &[])).unwrap().as_str(),
            "https://rest.example.test/gardener/v1/public/shoot/kna1/p-1"
        );
        assert_eq!(
            client
                .endpoint(&shoot_segments(SCOPE, &["prod", "worker", "wg1"]))
                .unwrap()
                .as_str(),
            "https://rest.example.test/gardener/v1/public/shoot/kna1/p-1/prod/worker/wg1"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = Client::new("http://localhost:8088/api/", "alice", "t0k3n").unwrap();

        assert_eq!(
            client.endpoint(&["auth", "v1", "tokens"]).unwrap().as_str(),
            "http://localhost:8088/api/auth/v1/tokens"
        );
    }

    #[test]
    fn names_cannot_escape_their_segment() {
        let client = Client::new("https://rest.example.test", "alice", "t0k3n").unwrap();
        let url = client
            .endpoint(&shoot_segments(SCOPE, &["prod/../x?y#z", "hibernate"]))
            .unwrap();

        assert_eq!(
            url.path(),
            "/gardener/v1/public/shoot/kna1/p-1/prod%2F..%2Fx%3Fy%23z/hibernate"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            Client::new("not a url", "alice", "t0k3n"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            Client::new("mailto:ops@example.test", "alice", "t0k3n"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn login_returns_client_with_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/tokens")
            .match_body(Matcher::Json(json!({
                "auth": { "login": "alice", "password": "hunter2" }
            })))
            .with_status(200)
            .with_body(r#"{"result":"login_ok","token":"t0k3n"}"#)
            .create_async()
            .await;

        let client = Client::login(&server.url(), "alice", "hunter2").await.unwrap();

        mock.assert_async().await;
        assert_eq!(client.token(), "t0k3n");
        assert_eq!(client.username(), "alice");
    }

    #[tokio::test]
    async fn login_requires_login_ok_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/tokens")
            .with_status(200)
            .with_body(r#"{"result":"twofactor_required","verification":"abc"}"#)
            .create_async()
            .await;

        let result = Client::login(&server.url(), "alice", "hunter2").await;

        assert!(matches!(result, Err(Error::Login { result }) if result == "twofactor_required"));
    }

    #[tokio::test]
    async fn requests_carry_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/tokens/validate")
            .match_header("X-AUTH-LOGIN", "alice")
            .match_header("X-AUTH-TOKEN", "t0k3n")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        client.validate_token().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn forbidden_is_reported_as_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accesscontrol/v1/openstack/domains")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "expired").unwrap();
        let error = client.list_domains().await.unwrap_err();

        assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(error.to_string(), "invalid token");
    }

    #[tokio::test]
    async fn unexpected_status_includes_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/auth/v1/tokens")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let error = client.revoke_token().await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "unexpected response status 500 (expected 204): boom"
        );
    }

    #[tokio::test]
    async fn lists_projects_of_domain() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accesscontrol/v1/openstack/d-1/projects")
            .with_status(200)
            .with_body(r#"[{"id":"p-1","name":"web","domain_id":"d-1","enabled":true}]"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let projects = client.list_projects("d-1").await.unwrap();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "web");
        assert!(projects[0].enabled);
        assert!(!projects[0].default);
    }

    #[tokio::test]
    async fn lists_shoot_clusters() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gardener/v1/public/shoot/kna1/p-1")
            .with_status(200)
            .with_body(
                r#"[{"metadata":{"name":"prod","uid":"u-1"},"spec":{"region":"kna1"},"status":{"hibernated":true,"lastOperation":{"progress":100,"state":"Succeeded","type":"Reconcile"}}}]"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let clusters = client.list_shoot_clusters(SCOPE).await.unwrap();

        assert_eq!(clusters[0].metadata.name, "prod");
        assert!(clusters[0].status.hibernated);
        assert_eq!(
            clusters[0].status.last_operation.as_ref().unwrap().state,
            "Succeeded"
        );
        assert_eq!(clusters[0].spec["region"], "kna1");
    }

    #[tokio::test]
    async fn lifecycle_calls_expect_accepted() {
        let mut server = mockito::Server::new_async().await;
        let hibernate = server
            .mock("POST", "/gardener/v1/public/shoot/kna1/p-1/prod/hibernate")
            .with_status(202)
            .create_async()
            .await;
        let wakeup = server
            .mock("POST", "/gardener/v1/public/shoot/kna1/p-1/prod/wakeup")
            .with_status(200)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();

        client.hibernate_shoot_cluster(SCOPE, "prod").await.unwrap();
        let error = client.wake_up_shoot_cluster(SCOPE, "prod").await.unwrap_err();

        hibernate.assert_async().await;
        wakeup.assert_async().await;
        assert_eq!(error.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn generates_kubeconfig_with_expiration() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gardener/v1/public/shoot/kna1/p-1/prod/adminkubeconfig")
            .match_body(Matcher::Json(json!({ "config": { "expirationSeconds": 3600 } })))
            .with_status(200)
            .with_body(r#""apiVersion: v1\nkind: Config\n""#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let kubeconfig = client
            .generate_kubeconfig(SCOPE, "prod", 3600)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(kubeconfig, "apiVersion: v1\nkind: Config\n");
    }

    #[tokio::test]
    async fn creates_shoot_cluster() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gardener/v1/public/shoot/kna1/p-1")
            .match_body(Matcher::PartialJson(json!({
                "shoot": {
                    "name": "prod",
                    "kubernetes": { "version": "1.28.7" },
                    "provider": {
                        "infrastructureConfig": { "floatingPoolName": "ext-net" }
                    }
                }
            })))
            .with_status(200)
            .with_body(r#"{"metadata":{"name":"prod"}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let request = ShootClusterRequest::new(
            "prod",
            "1.28.7",
            models::Worker {
                name: String::new(),
                minimum: 2,
                maximum: 3,
                ..models::Worker::default()
            },
            None,
        );
        let created = client.create_shoot_cluster(SCOPE, &request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created["metadata"]["name"], "prod");
    }

    #[tokio::test]
    async fn adds_worker_group() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gardener/v1/public/shoot/kna1/p-1/prod/worker")
            .match_body(Matcher::PartialJson(json!({ "worker": { "name": "wg2" } })))
            .with_status(202)
            .with_body(r#"{"metadata":{"name":"prod"}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let worker_group = WorkerGroupRequest {
            worker: models::Worker {
                name: "wg2".to_string(),
                ..models::Worker::default()
            },
        };
        client
            .add_worker_group(SCOPE, "prod", &worker_group)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetches_monitoring_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gardener/v1/public/shoot/kna1/p-1/prod/monitoring")
            .with_status(200)
            .with_body(r#"{"username":"admin","password":"pw","url":"https://grafana"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "alice", "t0k3n").unwrap();
        let credentials = client.monitoring_credentials(SCOPE, "prod").await.unwrap();

        assert_eq!(credentials["username"], "admin");
        assert_eq!(credentials["url"], "https://grafana");
    }
}
