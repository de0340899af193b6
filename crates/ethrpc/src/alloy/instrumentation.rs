//! Transport layer that logs every JSON-RPC call a tool makes together with
//! its duration. Batches are logged per contained call.

use {
    alloy::{
        rpc::json_rpc::{RequestPacket, ResponsePacket},
        transports::TransportError,
    },
    std::{
        fmt::Debug,
        pin::Pin,
        sync::Arc,
        task::{Context, Poll},
        time::Instant,
    },
    tower::{Layer, Service},
};

pub(crate) struct RpcLogLayer {
    tool: Arc<str>,
}

impl RpcLogLayer {
    pub fn new(tool: &str) -> Self {
        Self { tool: tool.into() }
    }
}

impl<S> Layer<S> for RpcLogLayer {
    type Service = RpcLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcLog {
            inner,
            tool: self.tool.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RpcLog<S> {
    inner: S,
    tool: Arc<str>,
}

/// Method names of a packet in request order.
fn methods(packet: &RequestPacket) -> Vec<String> {
    match packet {
        RequestPacket::Single(request) => vec![request.method().to_string()],
        RequestPacket::Batch(requests) => requests
            .iter()
            .map(|request| request.method().to_string())
            .collect(),
    }
}

impl<S> Service<RequestPacket> for RpcLog<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let methods = methods(&request);
        let tool = self.tool.clone();
        let start = Instant::now();
        let response = self.inner.call(request);
        Box::pin(async move {
            let result = response.await;
            let elapsed = start.elapsed();
            for method in &methods {
                match &result {
                    Ok(_) => tracing::debug!(tool = %tool, method, ?elapsed, "rpc call"),
                    Err(err) => {
                        tracing::debug!(tool = %tool, method, ?elapsed, ?err, "rpc call failed")
                    }
                }
            }
            result
        })
    }
}
