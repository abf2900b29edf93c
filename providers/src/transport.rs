//! Collaborator seams: the network transport and request-parameter construction.
//!
//! Neither is implemented here. A session receives them at construction and only
//! ever sees the raw JSON chunk stream the transport yields.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use serde_json::{Map, Value};
use thiserror::Error;

use parley_types::Message;

/// Opaque vendor request parameters (model, temperature, `stream_options`, ...).
pub type RequestParams = Map<String, Value>;

/// Raw chunks as the vendor sent them, one JSON object per item.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, TransportError>> + Send>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("stream interrupted: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
#[error("failed to build request parameters: {0}")]
pub struct ParamsError(String);

impl ParamsError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Opens a streaming completion for a ledger snapshot.
pub trait Transport: Send + Sync {
    fn open(
        &self,
        messages: Vec<Message>,
        params: RequestParams,
    ) -> impl Future<Output = Result<ChunkStream, TransportError>> + Send;
}

/// Builds vendor request parameters for the next turn.
pub trait RequestParamsSource: Send + Sync {
    fn params(&self, messages: &[Message]) -> Result<RequestParams, ParamsError>;
}

impl<F> RequestParamsSource for F
where
    F: Fn(&[Message]) -> Result<RequestParams, ParamsError> + Send + Sync,
{
    fn params(&self, messages: &[Message]) -> Result<RequestParams, ParamsError> {
        self(messages)
    }
}

/// Fixed parameters, reused for every turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedParams(pub RequestParams);

impl From<RequestParams> for FixedParams {
    fn from(params: RequestParams) -> Self {
        Self(params)
    }
}

impl RequestParamsSource for FixedParams {
    fn params(&self, _messages: &[Message]) -> Result<RequestParams, ParamsError> {
        Ok(self.0.clone())
    }
}
