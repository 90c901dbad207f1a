// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the Kubernetes API server.
//!
//! Stores objects by path, hands out resourceVersions, rejects stale updates
//! with 409 and counts the writes it accepted.

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// Namespace the test OLSConfig lives in
pub const NAMESPACE: &str = "openshift-lightspeed";

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Value>,
    next_version: u64,
    writes: usize,
    conflicts: usize,
    pending_conflicts: HashMap<String, usize>,
    failures: HashMap<(String, String), u16>,
    stalls: HashSet<(String, String)>,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

/// A fake API server that keeps state across requests.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `method` request to `path` with `status`
    pub fn fail(self, method: &str, path: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method.to_string(), path.to_string()), status);
        self
    }

    /// Never answer `method` requests to `path`
    pub fn stall(self, method: &str, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .stalls
            .insert((method.to_string(), path.to_string()));
        self
    }

    /// Store `object` at `path` as if it had been created by another client
    pub fn insert(&self, path: &str, mut object: Value) {
        let mut state = self.state.lock().unwrap();
        let version = state.bump_version();
        object["metadata"]["resourceVersion"] = Value::String(version);
        state.objects.insert(path.to_string(), object);
    }

    /// Stop failing `method` requests to `path`
    pub fn recover(&self, method: &str, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .remove(&(method.to_string(), path.to_string()));
    }

    /// Simulate another writer updating `path` right before our next PUT to it
    pub fn conflict_on_next_put(&self, path: &str) {
        *self
            .state
            .lock()
            .unwrap()
            .pending_conflicts
            .entry(path.to_string())
            .or_default() += 1;
    }

    /// Build a kube Client from this fake server
    pub fn into_client(self) -> Client {
        Client::new(self, NAMESPACE)
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    /// Change a stored object the way another client would, bumping its resourceVersion
    pub fn mutate(&self, path: &str, change: impl FnOnce(&mut Value)) {
        let mut state = self.state.lock().unwrap();
        let version = state.bump_version();
        let object = state.objects.get_mut(path).expect("object to mutate exists");
        change(object);
        object["metadata"]["resourceVersion"] = Value::String(version);
    }

    /// Paths of all stored objects
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    /// Number of creates, updates and patches accepted so far
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Number of updates rejected with 409
    pub fn conflicts(&self) -> usize {
        self.state.lock().unwrap().conflicts
    }

    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (u16, String) {
        let mut state = self.state.lock().unwrap();

        if let Some(status) = state.failures.get(&(method.to_string(), path.to_string())) {
            return (*status, status_json(*status, "InternalError", "injected failure"));
        }

        match *method {
            Method::GET => match state.objects.get(path) {
                Some(object) => (200, object.to_string()),
                None => (404, not_found_json(path)),
            },
            Method::POST => {
                let mut object: Value = match serde_json::from_slice(body) {
                    Ok(v) => v,
                    Err(e) => return (400, status_json(400, "BadRequest", &e.to_string())),
                };
                let Some(name) = object["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status_json(422, "Invalid", "metadata.name is required"));
                };
                let item_path = format!("{}/{}", path, name);
                if state.objects.contains_key(&item_path) {
                    return (409, status_json(409, "AlreadyExists", &format!("{} already exists", name)));
                }
                let version = state.bump_version();
                object["metadata"]["resourceVersion"] = Value::String(version.clone());
                object["metadata"]["uid"] = Value::String(format!("uid-{}", version));
                state.objects.insert(item_path, object.clone());
                state.writes += 1;
                (201, object.to_string())
            }
            Method::PUT => {
                let mut object: Value = match serde_json::from_slice(body) {
                    Ok(v) => v,
                    Err(e) => return (400, status_json(400, "BadRequest", &e.to_string())),
                };
                if let Some(pending) = state.pending_conflicts.get_mut(path).filter(|n| **n > 0) {
                    *pending -= 1;
                    let version = state.bump_version();
                    if let Some(stored) = state.objects.get_mut(path) {
                        stored["metadata"]["resourceVersion"] = Value::String(version);
                    }
                }
                let Some(stored) = state.objects.get(path) else {
                    return (404, not_found_json(path));
                };
                if stored["metadata"]["resourceVersion"] != object["metadata"]["resourceVersion"] {
                    state.conflicts += 1;
                    return (
                        409,
                        status_json(
                            409,
                            "Conflict",
                            "the object has been modified; please apply your changes to the latest version and try again",
                        ),
                    );
                }
                let version = state.bump_version();
                object["metadata"]["resourceVersion"] = Value::String(version);
                state.objects.insert(path.to_string(), object.clone());
                state.writes += 1;
                (200, object.to_string())
            }
            // Only merge patches of the status subresource are supported
            Method::PATCH => {
                let Some(object_path) = path.strip_suffix("/status") else {
                    return (405, status_json(405, "MethodNotAllowed", "only status can be patched"));
                };
                let patch: Value = match serde_json::from_slice(body) {
                    Ok(v) => v,
                    Err(e) => return (400, status_json(400, "BadRequest", &e.to_string())),
                };
                let version = state.bump_version();
                let Some(stored) = state.objects.get_mut(object_path) else {
                    return (404, not_found_json(object_path));
                };
                merge_patch(&mut stored["status"], &patch["status"]);
                stored["metadata"]["resourceVersion"] = Value::String(version);
                let response = stored.to_string();
                state.writes += 1;
                (200, response)
            }
            _ => (405, status_json(405, "MethodNotAllowed", "method not supported")),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let stalled = server
            .state
            .lock()
            .unwrap()
            .stalls
            .contains(&(method.to_string(), path.clone()));

        Box::pin(async move {
            if stalled {
                std::future::pending::<()>().await;
            }
            let body: Bytes = req.into_body().collect().await?.to_bytes();
            let (status, response) = server.handle(&method, &path, &body);
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(response.into_bytes()))?)
        })
    }
}

/// JSON merge patch (RFC 7386): objects merge per key, null deletes, anything else replaces
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(path: &str) -> String {
    status_json(404, "NotFound", &format!("{} not found", path))
}
