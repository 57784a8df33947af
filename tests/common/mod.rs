#![allow(dead_code)]

//! Shared test doubles: a scripted in-memory [`Endpoint`] and response
//! builders, so the import/export pipelines run without a live server.

use std::cell::RefCell;
use std::collections::VecDeque;

use eln_sync_sdk::endpoint::{ApiResponse, Endpoint, EndpointError, UploadBatch};
use serde_json::Value;

/// One request observed by the fake, in call order.
#[derive(Debug, Clone)]
pub enum Recorded {
    Get {
        path: String,
        query: Vec<(String, String)>,
    },
    Post {
        path: String,
        body: Value,
    },
    Patch {
        path: String,
        body: Value,
    },
    Upload {
        path: String,
        field: String,
        files: usize,
    },
}

struct Route {
    method: &'static str,
    path: String,
    responses: VecDeque<Result<ApiResponse, EndpointError>>,
}

/// Scripted endpoint: responses are registered per method and path with
/// [`FakeEndpoint::on`], consumed in order, and the last one repeats. A
/// request with no scripted route panics, naming the missing route.
#[derive(Default)]
pub struct FakeEndpoint {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<Recorded>>,
}

impl FakeEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method` + `path`.
    pub fn on(
        &self,
        method: &'static str,
        path: &str,
        response: Result<ApiResponse, EndpointError>,
    ) -> &Self {
        let mut routes = self.routes.borrow_mut();
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.responses.push_back(response);
        } else {
            routes.push(Route {
                method,
                path: path.to_string(),
                responses: VecDeque::from([response]),
            });
        }
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Bodies of all PATCH requests to `path`, in order.
    pub fn patch_bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Recorded::Patch { path: p, body } if p == path => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(field, file count)` of all uploads to `path`, in order.
    pub fn uploads(&self, path: &str) -> Vec<(String, usize)> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Recorded::Upload {
                    path: p,
                    field,
                    files,
                } if p == path => Some((field.clone(), *files)),
                _ => None,
            })
            .collect()
    }

    fn respond(&self, method: &'static str, path: &str) -> Result<ApiResponse, EndpointError> {
        let mut routes = self.routes.borrow_mut();
        let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        else {
            panic!("no scripted response for {} {}", method, path);
        };
        if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route.responses.front().cloned().unwrap()
        }
    }
}

impl Endpoint for FakeEndpoint {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, EndpointError> {
        self.requests.borrow_mut().push(Recorded::Get {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self.respond("GET", path)
    }

    fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError> {
        self.requests.borrow_mut().push(Recorded::Post {
            path: path.to_string(),
            body: body.clone(),
        });
        self.respond("POST", path)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError> {
        self.requests.borrow_mut().push(Recorded::Patch {
            path: path.to_string(),
            body: body.clone(),
        });
        self.respond("PATCH", path)
    }

    fn upload(&self, path: &str, batch: &UploadBatch) -> Result<ApiResponse, EndpointError> {
        self.requests.borrow_mut().push(Recorded::Upload {
            path: path.to_string(),
            field: batch.field.clone(),
            files: batch.files.len(),
        });
        self.respond("POST", path)
    }
}

/// A 200 response with a JSON body.
pub fn ok_json(value: Value) -> Result<ApiResponse, EndpointError> {
    Ok(ApiResponse {
        status: 200,
        body: value.to_string(),
        location: None,
    })
}

/// A 201 response carrying a Location header.
pub fn created(location: &str) -> Result<ApiResponse, EndpointError> {
    Ok(ApiResponse {
        status: 201,
        body: String::new(),
        location: Some(location.to_string()),
    })
}

/// A response with an arbitrary status code.
pub fn status(code: u16, body: &str) -> Result<ApiResponse, EndpointError> {
    Ok(ApiResponse {
        status: code,
        body: body.to_string(),
        location: None,
    })
}

/// A transport-level timeout.
pub fn timeout() -> Result<ApiResponse, EndpointError> {
    Err(EndpointError::Timeout("read timed out".to_string()))
}
