//! ChirpStack v4 `api.DeviceService` messages used for downlink enqueue
//!
//! Mirrors the subset of `api/device.proto` this bridge speaks. Field tags
//! must match the upstream definitions; unknown fields in responses are
//! skipped by prost.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceQueueItem {
    /// Queue item ID (assigned by the network server).
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    /// Device EUI (EUI64, hex).
    #[prost(string, tag = "2")]
    pub dev_eui: ::prost::alloc::string::String,
    /// Confirmed downlink.
    #[prost(bool, tag = "3")]
    pub confirmed: bool,
    /// FPort (must be > 0).
    #[prost(uint32, tag = "4")]
    pub f_port: u32,
    /// Raw application payload.
    #[prost(bytes = "vec", tag = "5")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnqueueDeviceQueueItemRequest {
    #[prost(message, optional, tag = "1")]
    pub queue_item: ::core::option::Option<DeviceQueueItem>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnqueueDeviceQueueItemResponse {
    /// ID of the queue item.
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

/// Unary client for the `api.DeviceService/Enqueue` method
#[derive(Debug, Clone)]
pub struct DeviceServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl DeviceServiceClient {
    pub const ENQUEUE_PATH: &'static str = "/api.DeviceService/Enqueue";

    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn enqueue(
        &mut self,
        request: tonic::Request<EnqueueDeviceQueueItemRequest>,
    ) -> Result<tonic::Response<EnqueueDeviceQueueItemResponse>, tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::new(
                tonic::Code::Unavailable,
                format!("service was not ready: {}", e),
            )
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static(Self::ENQUEUE_PATH);
        self.inner.unary(request, path, codec).await
    }
}
