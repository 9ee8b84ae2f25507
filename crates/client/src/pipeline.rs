//! Ordered request/response middleware around a [`Transport`].
//!
//! Request stages run in insertion order before the request is sent;
//! response stages run in insertion order on the outcome before it reaches the
//! caller. A [`Pipeline`] is itself a [`Transport`], so callers cannot tell a
//! wrapped transport from a bare one.

use std::sync::Arc;

use async_trait::async_trait;
use tricol_auth::AuthContext;

use crate::interceptors::{AttachCredential, HandleFault};
use crate::navigation::Navigator;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

pub type Outcome = Result<ApiResponse, TransportError>;

/// Transforms a request before it is sent.
pub trait RequestStage: Send + Sync {
    fn on_request(&self, request: ApiRequest) -> ApiRequest;
}

/// Observes (and may transform) the outcome of a request.
pub trait ResponseStage: Send + Sync {
    fn on_response(&self, request: &ApiRequest, outcome: Outcome) -> Outcome;
}

impl<F> RequestStage for F
where
    F: Fn(ApiRequest) -> ApiRequest + Send + Sync,
{
    fn on_request(&self, request: ApiRequest) -> ApiRequest {
        self(request)
    }
}

#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    /// Standard session pipeline: attach-credential, then handle-fault.
    pub fn authenticated(
        transport: Arc<dyn Transport>,
        ctx: AuthContext,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(transport)
            .with_request_stage(AttachCredential::new(ctx.tokens().clone()))
            .with_response_stage(HandleFault::new(ctx, navigator))
    }

    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Arc::new(stage));
        self
    }

    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response_stages.push(Arc::new(stage));
        self
    }
}

#[async_trait]
impl Transport for Pipeline {
    async fn send(&self, request: ApiRequest) -> Outcome {
        let request = self
            .request_stages
            .iter()
            .fold(request, |req, stage| stage.on_request(req));

        let outcome = self.transport.send(request.clone()).await;

        self.response_stages
            .iter()
            .fold(outcome, |out, stage| stage.on_response(&request, out))
    }
}
