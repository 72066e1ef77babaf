//! Counting fakes for the collaborators of the auth core.

use crate::{
    cache::{APP_NAMESPACE, BlobCache, CacheError, MemoryBlobCache},
    http::{ExecutorError, RequestExecutor},
    issuer::{IssuerError, TokenIssuer},
    request::{OutgoingRequest, Response},
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

/// In-memory cache that counts writes and deletes per entry name
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryBlobCache,
    puts: Mutex<HashMap<String, usize>>,
    deletes: Mutex<HashMap<String, usize>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry without counting it as a write
    pub async fn seed(&self, name: &str, data: &[u8]) {
        self.inner.put(APP_NAMESPACE, name, data).await.unwrap();
    }

    pub fn puts(&self, name: &str) -> usize {
        self.puts.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn deletes(&self, name: &str) -> usize {
        self.deletes.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl BlobCache for RecordingCache {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(namespace, name).await
    }

    async fn put(&self, namespace: &str, name: &str, data: &[u8]) -> Result<(), CacheError> {
        *self.puts.lock().unwrap().entry(name.to_string()).or_default() += 1;
        self.inner.put(namespace, name, data).await
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CacheError> {
        *self.deletes.lock().unwrap().entry(name.to_string()).or_default() += 1;
        self.inner.delete(namespace, name).await
    }

    fn location(&self, namespace: &str, name: &str) -> String {
        self.inner.location(namespace, name)
    }
}

/// Hands out the given tokens in order, then fails
pub struct ScriptedIssuer {
    tokens: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedIssuer {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TokenIssuer for ScriptedIssuer {
    async fn issue(&self, _: &str, _: &str, _: &str) -> Result<String, IssuerError> {
        *self.calls.lock().unwrap() += 1;
        self.tokens
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(IssuerError::Rejected {
                status: 400,
                body: "invalid_grant".into(),
            })
    }
}

/// Answers with the given statuses in order and keeps a copy of every request
pub struct ScriptedExecutor {
    statuses: Mutex<VecDeque<u16>>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl ScriptedExecutor {
    pub fn new(statuses: &[u16]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn response_for(status: u16) -> Response {
        Response::new(status, Some(format!(r#"{{"status":{status}}}"#).into_bytes()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: &OutgoingRequest) -> Result<Response, ExecutorError> {
        self.requests.lock().unwrap().push(request.clone());
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("executor called more often than scripted");
        Ok(Self::response_for(status))
    }
}
