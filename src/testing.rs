//! In-memory doubles for unit tests.

use crate::{
    metadata::RequestMetadata,
    retry::Sleeper,
    transport::{Credentials, Transport},
    Error, Result,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A GET as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GetCall {
    pub base: String,
    pub endpoint: Option<String>,
    pub resource_id: Option<String>,
    pub params: Vec<(String, String)>,
    pub username: Option<String>,
}

/// A POST as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostCall {
    pub base: String,
    pub endpoint: String,
    pub body: Vec<u8>,
}

/// Answers GETs from a queue of scripted results first, then from routes
/// keyed by `(endpoint, resource_id)`. Anything else is a 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queued: Mutex<VecDeque<Result<Value>>>,
    routes: Mutex<HashMap<(Option<String>, Option<String>), Value>>,
    posts: Mutex<VecDeque<Result<String>>>,
    get_calls: Mutex<Vec<GetCall>>,
    post_calls: Mutex<Vec<PostCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<Value>) -> &Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub fn route(&self, endpoint: Option<&str>, resource_id: Option<&str>, body: Value) -> &Self {
        self.routes.lock().unwrap().insert(
            (endpoint.map(str::to_string), resource_id.map(str::to_string)),
            body,
        );
        self
    }

    pub fn push_post(&self, result: Result<String>) -> &Self {
        self.posts.lock().unwrap().push_back(result);
        self
    }

    pub fn get_calls(&self) -> Vec<GetCall> {
        self.get_calls.lock().unwrap().clone()
    }

    pub fn post_calls(&self) -> Vec<PostCall> {
        self.post_calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        base: &str,
        metadata: &RequestMetadata,
        credentials: Option<&Credentials>,
    ) -> Result<Value> {
        self.get_calls.lock().unwrap().push(GetCall {
            base: base.to_string(),
            endpoint: metadata.endpoint.clone(),
            resource_id: metadata.resource_id.clone(),
            params: metadata.query_params.sorted_pairs(),
            username: credentials.map(|c| c.username().to_string()),
        });

        if let Some(result) = self.queued.lock().unwrap().pop_front() {
            return result;
        }

        let key = (metadata.endpoint.clone(), metadata.resource_id.clone());
        self.routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no route for {:?}", key)))
    }

    fn post(
        &self,
        base: &str,
        endpoint: &str,
        body: Vec<u8>,
        _credentials: Option<&Credentials>,
    ) -> Result<String> {
        self.post_calls.lock().unwrap().push(PostCall {
            base: base.to_string(),
            endpoint: endpoint.to_string(),
            body,
        });

        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::MethodNotAllowed(String::new())))
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
