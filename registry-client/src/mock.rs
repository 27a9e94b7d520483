//! In-process stand-ins for registries, for tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use hyperdriver::Body;
use hyperdriver::client::SharedClientService;
use hyperdriver::service::SharedService;
use parking_lot::Mutex;

use crate::resolve::Resolve;

type ResponseResult = Result<http::Response<Body>, hyperdriver::client::Error>;
type ResponseFuture = Pin<Box<dyn Future<Output = ResponseResult> + Send>>;

/// A request seen by a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Full request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
enum Route {
    Respond { status: StatusCode, body: Bytes },
    RequireAuth { expected: HeaderValue },
    Fail,
    Stall,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<String, Route>,
    requests: Vec<RecordedRequest>,
}

/// A transport which answers from a table of canned responses.
///
/// Routes are keyed by authority and path. Unknown routes answer 404.
/// Clones share their routes and request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport with no routes
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, authority: &str, path: &str, route: Route) {
        self.state
            .lock()
            .routes
            .insert(format!("{authority}{path}"), route);
    }

    /// Answer `path` on `authority` with a fixed status and body.
    pub fn add(&self, authority: &str, path: &str, status: StatusCode, body: &'static [u8]) {
        self.route(
            authority,
            path,
            Route::Respond {
                status,
                body: Bytes::from_static(body),
            },
        );
    }

    /// Answer 200 only when the request carries the `expected` authorization, 401 otherwise.
    pub fn require_auth(&self, authority: &str, path: &str, expected: &'static str) {
        self.route(
            authority,
            path,
            Route::RequireAuth {
                expected: HeaderValue::from_static(expected),
            },
        );
    }

    /// Fail requests to `path` with a transport error.
    pub fn fail(&self, authority: &str, path: &str) {
        self.route(authority, path, Route::Fail);
    }

    /// Never answer requests to `path`.
    pub fn stall(&self, authority: &str, path: &str) {
        self.route(authority, path, Route::Stall);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Wrap this mock as a client transport.
    pub fn transport(&self) -> SharedClientService<Body, Body> {
        tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .service(self.clone())
    }
}

fn respond(status: StatusCode, body: Bytes) -> http::Response<Body> {
    let mut response = http::Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

impl tower::Service<http::Request<Body>> for MockTransport {
    type Response = http::Response<Body>;
    type Error = hyperdriver::client::Error;
    type Future = ResponseFuture;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let (parts, _) = req.into_parts();
        let authority = parts
            .uri
            .authority()
            .map(|authority| authority.as_str())
            .unwrap_or_default();
        let key = format!("{authority}{}", parts.uri.path());

        let route = {
            let mut state = self.state.lock();
            state.requests.push(RecordedRequest {
                uri: parts.uri.clone(),
                headers: parts.headers.clone(),
            });
            state.routes.get(&key).cloned()
        };

        let response = match route {
            None => respond(StatusCode::NOT_FOUND, Bytes::new()),
            Some(Route::Respond { status, body }) => respond(status, body),
            Some(Route::RequireAuth { expected }) => {
                if parts.headers.get(header::AUTHORIZATION) == Some(&expected) {
                    respond(StatusCode::OK, Bytes::from_static(b"{}"))
                } else {
                    let mut response = respond(StatusCode::UNAUTHORIZED, Bytes::new());
                    response.headers_mut().insert(
                        header::WWW_AUTHENTICATE,
                        HeaderValue::from_static("Basic realm=\"Registry Realm\""),
                    );
                    response
                }
            }
            Some(Route::Fail) => {
                let result: ResponseResult = Err(hyperdriver::client::Error::RequestTimeout);
                return Box::pin(std::future::ready(result));
            }
            Some(Route::Stall) => return Box::pin(std::future::pending::<ResponseResult>()),
        };

        let result: ResponseResult = Ok(response);
        Box::pin(std::future::ready(result))
    }
}

/// A resolver which only knows a fixed set of host names.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashSet<String>,
}

impl StaticResolver {
    /// Resolve exactly `hosts`
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str, _port: u16) -> io::Result<()> {
        if self.hosts.contains(host) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unknown host {host}"),
            ))
        }
    }
}
