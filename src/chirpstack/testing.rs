//! In-process `api.DeviceService` server for exercising the forwarder over a
//! real HTTP/2 connection. Only `Enqueue` is routed; every other method
//! answers `UNIMPLEMENTED`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codegen::{empty_body, http, Body, BoxFuture, Context, Poll, Service, StdError};

use super::proto::{
    DeviceServiceClient, EnqueueDeviceQueueItemRequest, EnqueueDeviceQueueItemResponse,
};

/// Queue item ID handed out on success
pub const QUEUE_ITEM_ID: &str = "6c1f0e2a-93b4-4d7e-a215-8f3c0b9d4e71";

/// One `Enqueue` call as the server saw it
#[derive(Debug, Clone)]
pub struct ReceivedEnqueue {
    pub authorization: Option<String>,
    pub request: EnqueueDeviceQueueItemRequest,
}

#[derive(Clone, Default)]
pub struct FakeDeviceService {
    received: Arc<Mutex<Vec<ReceivedEnqueue>>>,
    reject_with: Option<(tonic::Code, &'static str)>,
}

impl FakeDeviceService {
    pub fn rejecting(code: tonic::Code, message: &'static str) -> Self {
        Self {
            reject_with: Some((code, message)),
            ..Default::default()
        }
    }

    pub fn received(&self) -> Vec<ReceivedEnqueue> {
        self.received.lock().unwrap().clone()
    }

    /// Serve on an ephemeral loopback port and return its address
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = tonic::transport::Server::builder().add_service(self.clone());
        tokio::spawn(router.serve_with_incoming(TcpListenerStream::new(listener)));
        addr
    }
}

impl tonic::server::NamedService for FakeDeviceService {
    const NAME: &'static str = "api.DeviceService";
}

impl<B> Service<http::Request<B>> for FakeDeviceService
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        if req.uri().path() != DeviceServiceClient::ENQUEUE_PATH {
            return Box::pin(async {
                Ok(http::Response::builder()
                    .status(200)
                    .header("grpc-status", "12")
                    .header("content-type", "application/grpc")
                    .body(empty_body())
                    .unwrap())
            });
        }

        let handler = EnqueueHandler(self.clone());
        Box::pin(async move {
            let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
            Ok(grpc.unary(handler, req).await)
        })
    }
}

struct EnqueueHandler(FakeDeviceService);

impl tonic::server::UnaryService<EnqueueDeviceQueueItemRequest> for EnqueueHandler {
    type Response = EnqueueDeviceQueueItemResponse;
    type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<EnqueueDeviceQueueItemRequest>) -> Self::Future {
        let service = self.0.clone();
        Box::pin(async move {
            let authorization = request
                .metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            service.received.lock().unwrap().push(ReceivedEnqueue {
                authorization,
                request: request.into_inner(),
            });

            match service.reject_with {
                Some((code, message)) => Err(tonic::Status::new(code, message)),
                None => Ok(tonic::Response::new(EnqueueDeviceQueueItemResponse {
                    id: QUEUE_ITEM_ID.to_string(),
                })),
            }
        })
    }
}
