//! Networking: wire types, transports, and the request pipeline.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the transport-neutral request/response/error shapes,
//! `transport` moves them over HTTP, and `client` wraps every call with the
//! bearer-token and auth-invalidation middleware.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{ApiClient, AuthFailureHook, HookAlreadyInstalled};
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiError, ApiRequest, ApiResponse, ErrorCode, Method};

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::Value;

    use super::*;

    /// Transport that replays canned results in order and records every
    /// request it was handed.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, result: Result<ApiResponse, ApiError>) -> &Self {
            self.responses.lock().unwrap().push_back(result);
            self
        }

        pub fn ok(&self, status: u16, body: Value) -> &Self {
            self.push(Ok(ApiResponse { status, body }))
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last_request(&self) -> ApiRequest {
            self.requests.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
        }
    }

    /// Body the backend returns for an expired or forged JWT.
    #[must_use]
    pub fn token_not_valid_body() -> Value {
        serde_json::json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid",
            "messages": [{ "token_class": "AccessToken", "token_type": "access", "message": "Token is expired" }]
        })
    }
}
