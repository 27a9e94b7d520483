//! Integration tests for the registry hub API

use std::collections::HashSet;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use camino::{Utf8Path, Utf8PathBuf};
use registry_client::RegistryClient;
use registry_client::mock::{MockTransport, StaticResolver};
use registry_hub::HubBuilder;
use registry_store::{NewRegistry, RegistryStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

/// A hub wired to a mock registry network and a temporary registry file
struct TestHub {
    app: axum::Router,
    store: RegistryStore,
    mock: MockTransport,
    _dir: TempDir,
}

impl TestHub {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = registry_file(&dir);
        Self::with_path(dir, path).await
    }

    async fn with_path(dir: TempDir, path: Utf8PathBuf) -> Self {
        let store = RegistryStore::open(path).await.unwrap();
        let mock = MockTransport::new();
        let client = RegistryClient::with_transport(
            mock.transport(),
            StaticResolver::new(["registry.example", "private.example"]),
        );

        let app = HubBuilder::new(store.clone()).client(client).build();

        Self {
            app,
            store,
            mock,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_registry(
        &self,
        body: Value,
        authorization: Option<&str>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/registry")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(authorization) = authorization {
            request = request.header(header::AUTHORIZATION, authorization);
        }

        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn create(
        &self,
        name: &str,
        url: &str,
        authorization: Option<&str>,
    ) -> (StatusCode, Value) {
        let (status, body) = self
            .post_registry(json!({ "name": name, "url": url }), authorization)
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

fn registry_file(dir: &TempDir) -> Utf8PathBuf {
    Utf8Path::from_path(dir.path())
        .unwrap()
        .join("registries.json")
}

#[tokio::test]
async fn test_empty_list() {
    let hub = TestHub::new().await;

    let (status, body) = hub.get("/api/registry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_anonymous_registry() {
    let hub = TestHub::new().await;
    hub.mock.add("registry.example:5000", "/v2/", StatusCode::OK, b"{}");

    let (status, body) = hub.create("local", "http://registry.example:5000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": 200,
            "message": "success",
            "data": { "id": 1, "name": "local", "url": "http://registry.example:5000" }
        })
    );

    let (status, list) = hub.get("/api/registry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([body["data"]]));

    let requests = hub.mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri, "http://registry.example:5000/v2/");
    assert!(requests[0].headers.get(header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn test_create_normalizes_url() {
    let hub = TestHub::new().await;
    hub.mock.add("registry.example:5000", "/v2/", StatusCode::OK, b"{}");

    let (_, body) = hub.create("local", "http://registry.example:5000/v2/", None).await;
    assert_eq!(body["data"]["url"], "http://registry.example:5000");
}

#[tokio::test]
async fn test_create_with_credentials() {
    let hub = TestHub::new().await;
    hub.mock.require_auth("private.example", "/v2/", "Basic dXNlcjpwYXNz");

    let (status, body) = hub
        .create("private", "https://private.example", Some("Basic dXNlcjpwYXNz"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["token"], "dXNlcjpwYXNz");

    let stored = hub.store.get(1).await.unwrap();
    assert_eq!(stored.token.unwrap().revealed(), "dXNlcjpwYXNz");

    let requests = hub.mock.requests();
    assert_eq!(
        requests[0].headers.get(header::AUTHORIZATION).unwrap(),
        "Basic dXNlcjpwYXNz"
    );
}

#[tokio::test]
async fn test_create_unauthorized() {
    let hub = TestHub::new().await;
    hub.mock.require_auth("private.example", "/v2/", "Basic dXNlcjpwYXNz");

    let (status, body) = hub
        .create("private", "https://private.example", Some("Basic bm9wZTpub3Bl"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": 401,
            "message": "You do not have access rights. \nPlease check your username and password.",
            "data": {}
        })
    );

    let (status, body) = hub.create("private", "https://private.example", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 401);

    assert!(hub.store.list().await.is_empty());
    assert!(!hub.store.path().exists());
}

#[tokio::test]
async fn test_create_unresolvable_host() {
    let hub = TestHub::new().await;

    let (status, body) = hub.create("missing", "http://nonexistent.invalid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": 400,
            "message": "Invalid url. \nPlease check the url.",
            "data": {}
        })
    );

    assert!(hub.mock.requests().is_empty());
    assert!(hub.store.list().await.is_empty());
}

#[tokio::test]
async fn test_create_malformed_url() {
    let hub = TestHub::new().await;

    for url in ["", "ftp://registry.example", "http://exa mple.com"] {
        let (status, body) = hub.create("bad", url, None).await;
        assert_eq!(status, StatusCode::OK, "{url}");
        assert_eq!(body["status"], 400, "{url}");
        assert_eq!(body["data"], json!({}), "{url}");
    }

    assert!(hub.mock.requests().is_empty());
    assert!(hub.store.list().await.is_empty());
}

#[tokio::test]
async fn test_create_invalid_body() {
    let hub = TestHub::new().await;

    let (status, body) = hub.post_registry(json!({ "name": "x" }), None).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Invalid request body.");
}

#[tokio::test]
async fn test_create_redirect_is_bad_gateway() {
    let hub = TestHub::new().await;
    hub.mock.add("registry.example", "/v2/", StatusCode::MOVED_PERMANENTLY, b"");

    let (status, body) = hub
        .post_registry(
            json!({ "name": "moved", "url": "https://registry.example" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.is_empty());
    assert!(hub.store.list().await.is_empty());
}

#[tokio::test]
async fn test_create_transport_failure() {
    let hub = TestHub::new().await;
    hub.mock.fail("registry.example", "/v2/");

    let (status, body) = hub
        .post_registry(
            json!({ "name": "down", "url": "https://registry.example" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
    assert!(hub.store.list().await.is_empty());
}

#[tokio::test]
async fn test_create_persistence_failure() {
    let dir = tempfile::tempdir().unwrap();
    let parent = Utf8Path::from_path(dir.path()).unwrap().join("data");
    let hub = TestHub::with_path(dir, parent.join("registries.json")).await;

    // A file where the data directory should be makes the write fail.
    std::fs::write(&parent, b"").unwrap();
    hub.mock.add("registry.example", "/v2/", StatusCode::OK, b"{}");

    let (status, body) = hub
        .post_registry(
            json!({ "name": "local", "url": "https://registry.example" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
    assert!(hub.store.list().await.is_empty());
}

#[tokio::test]
async fn test_unsupported_method() {
    let hub = TestHub::new().await;
    hub.store
        .append(NewRegistry::new("local", "http://registry.example:5000"))
        .await
        .unwrap();
    let before = std::fs::read(hub.store.path()).unwrap();

    for method in ["DELETE", "PUT", "PATCH"] {
        let (status, _) = hub
            .send(
                Request::builder()
                    .method(method)
                    .uri("/api/registry")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
    }

    assert_eq!(hub.store.list().await.len(), 1);
    assert_eq!(std::fs::read(hub.store.path()).unwrap(), before);
}

#[tokio::test]
async fn test_ids_increase_with_each_registry() {
    let hub = TestHub::new().await;
    hub.mock.add("registry.example:5000", "/v2/", StatusCode::OK, b"{}");

    for n in 1..=5u64 {
        let (_, body) = hub
            .create(&format!("r{n}"), "http://registry.example:5000", None)
            .await;
        assert_eq!(body["data"]["id"], n);

        let file = hub.store.load().await;
        assert_eq!(file.last_id, n);
        assert_eq!(file.list.iter().map(|r| r.id).max(), Some(n));
    }

    let (_, list) = hub.get("/api/registry").await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 5);
    for (index, entry) in list.iter().enumerate() {
        assert_eq!(entry["id"], index as u64 + 1);
        assert_eq!(entry["name"], format!("r{}", index + 1));
        assert!(entry.get("lastId").is_none());
    }

    let on_disk: Value =
        serde_json::from_slice(&std::fs::read(hub.store.path()).unwrap()).unwrap();
    assert_eq!(on_disk["lastId"], 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_have_unique_ids() {
    let hub = TestHub::new().await;
    hub.mock.add("registry.example:5000", "/v2/", StatusCode::OK, b"{}");

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let app = hub.app.clone();
            tokio::spawn(async move {
                let body = json!({
                    "name": format!("r{n}"),
                    "url": "http://registry.example:5000",
                });
                let request = Request::builder()
                    .method("POST")
                    .uri("/api/registry")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap();
                let response = app.oneshot(request).await.unwrap();
                let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                    .await
                    .unwrap();
                let body: Value = serde_json::from_slice(&body).unwrap();
                body["data"]["id"].as_u64().unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap()));
    }
    assert_eq!(ids, (1..=16).collect::<HashSet<u64>>());
    assert_eq!(hub.store.load().await.last_id, 16);
}

#[tokio::test]
async fn test_get_registry_by_id() {
    let hub = TestHub::new().await;
    hub.store
        .append(NewRegistry::new("local", "http://registry.example:5000"))
        .await
        .unwrap();

    let (status, body) = hub.get("/api/registry/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["name"], "local");

    let (status, body) = hub.get("/api/registry/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": 404, "message": "Registry not found.", "data": {} })
    );
}

async fn browse_hub() -> TestHub {
    let hub = TestHub::new().await;
    hub.store
        .append(NewRegistry::new("local", "http://registry.example:5000"))
        .await
        .unwrap();
    hub.store
        .append(NewRegistry::new("private", "https://private.example").token("dXNlcjpwYXNz"))
        .await
        .unwrap();

    hub.mock.add(
        "registry.example:5000",
        "/v2/_catalog",
        StatusCode::OK,
        br#"{"repositories":["alpine","library/nginx"]}"#,
    );
    hub.mock.add(
        "registry.example:5000",
        "/v2/library/nginx/tags/list",
        StatusCode::OK,
        br#"{"name":"library/nginx","tags":["1.25","latest","1.24"]}"#,
    );
    hub.mock.add(
        "registry.example:5000",
        "/v2/alpine/tags/list",
        StatusCode::OK,
        br#"{"name":"alpine","tags":null}"#,
    );
    hub.mock.require_auth("private.example", "/v2/_catalog", "Basic bm9wZTpub3Bl");
    hub.mock.add(
        "private.example",
        "/v2/broken/tags/list",
        StatusCode::SERVICE_UNAVAILABLE,
        b"",
    );
    hub.mock.add(
        "registry.example:5000",
        "/v2/library/nginx/manifests/latest",
        StatusCode::OK,
        br#"{"schemaVersion":2,"config":{"digest":"sha256:c0ffee","size":2}}"#,
    );
    hub.mock.add(
        "registry.example:5000",
        "/v2/library/nginx/blobs/sha256:c0ffee",
        StatusCode::OK,
        NGINX_CONFIG.as_bytes(),
    );
    hub.mock.add(
        "registry.example:5000",
        "/v2/busybox/tags/list",
        StatusCode::OK,
        br#"{"name":"busybox","tags":["1.36"]}"#,
    );
    hub
}

const NGINX_CONFIG: &str = concat!(
    r#"{"architecture":"amd64","config":{"Labels":{"#,
    r#""org.opencontainers.image.source":"https://github.com/nginx/docker-nginx"}}}"#,
);

#[tokio::test]
async fn test_list_images() {
    let hub = browse_hub().await;

    let (status, body) = hub.get("/api/images/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": 200, "message": "success", "data": ["alpine", "library/nginx"] })
    );
}

#[tokio::test]
async fn test_list_tags() {
    let hub = browse_hub().await;

    let (status, body) = hub.get("/api/tags/1/library/nginx").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{ "name": "latest" }, { "name": "1.25" }, { "name": "1.24" }])
    );

    let (_, body) = hub.get("/api/tags/1/alpine").await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = hub.get("/api/tags/1/unknown").await;
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_image_detail() {
    let hub = browse_hub().await;

    let (status, body) = hub.get("/api/image/1/library/nginx").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "library/nginx");
    assert_eq!(
        body["data"]["pullCommand"],
        "docker pull registry.example:5000/library/nginx:latest"
    );

    assert_eq!(
        body["data"]["sourceRepositoryUrl"],
        "https://github.com/nginx/docker-nginx"
    );

    let requests = hub.mock.requests();
    assert_eq!(
        requests[requests.len() - 2].uri,
        "http://registry.example:5000/v2/library/nginx/manifests/latest"
    );
    assert_eq!(
        requests[requests.len() - 1].uri,
        "http://registry.example:5000/v2/library/nginx/blobs/sha256:c0ffee"
    );

    let (_, body) = hub.get("/api/image/1/alpine").await;
    assert_eq!(body["data"]["tags"], json!([]));
    assert!(body["data"].get("pullCommand").is_none());
    assert!(body["data"].get("sourceRepositoryUrl").is_none());
}

#[tokio::test]
async fn test_image_detail_without_source() {
    let hub = browse_hub().await;

    // The manifest is missing upstream; the page still renders without a source.
    let (status, body) = hub.get("/api/image/1/busybox").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(
        body["data"]["pullCommand"],
        "docker pull registry.example:5000/busybox:1.36"
    );
    assert!(body["data"].get("sourceRepositoryUrl").is_none());
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let hub = browse_hub().await;

    for uri in [
        "/api/registry/abc",
        "/api/images/abc",
        "/api/tags/abc/alpine",
        "/api/image/-1/alpine",
    ] {
        let (status, body) = hub.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(
            body,
            json!({ "status": 404, "message": "Registry not found.", "data": {} }),
            "{uri}"
        );
    }
    assert!(hub.mock.requests().is_empty());
}

#[tokio::test]
async fn test_browse_failures() {
    let hub = browse_hub().await;

    let (status, body) = hub.get("/api/images/9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "Registry not found.");

    // The stored token is replayed but the registry now rejects it.
    let (status, body) = hub.get("/api/images/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 401);

    let requests = hub.mock.requests();
    let authorization = requests.last().unwrap().headers.get(header::AUTHORIZATION);
    assert_eq!(authorization.unwrap(), "Basic dXNlcjpwYXNz");

    let (status, body) = hub.get("/api/tags/1/Not_Valid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 400);

    let (status, _) = hub
        .send(
            Request::builder()
                .uri("/api/tags/2/broken")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
