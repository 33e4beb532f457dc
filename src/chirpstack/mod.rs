//! ChirpStack network server downlink forwarder
//!
//! Each downlink opens its own gRPC channel, sends a single
//! `DeviceService/Enqueue` call carrying the bearer token in call metadata,
//! and drops the channel before returning. The whole exchange is bounded
//! by the configured timeout.
//!
//! The payload travels as raw protobuf `bytes` (`DeviceQueueItem.data`);
//! base64 is only how ChirpStack's REST gateway renders that field.

pub mod proto;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{ClientTlsConfig, Endpoint};
use tracing::{debug, info, warn};

use crate::config::ChirpstackConfig;
use proto::{DeviceQueueItem, DeviceServiceClient, EnqueueDeviceQueueItemRequest};

/// Anything that can accept a downlink for a device
#[async_trait]
pub trait DeviceQueue: Send + Sync {
    /// Enqueue `data` for `dev_eui`, returning the queue item ID
    async fn enqueue(&self, dev_eui: &str, data: Vec<u8>) -> Result<String, ForwardError>;
}

/// Failure of a single enqueue attempt
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to connect to network server: {}", error_chain(.0))]
    Connect(#[source] tonic::transport::Error),

    #[error("network server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("{}", status_message(.0))]
    Rpc(#[from] tonic::Status),
}

impl ForwardError {
    /// gRPC status name reported to HTTP callers
    pub fn code(&self) -> &'static str {
        match self {
            ForwardError::Connect(_) => code_name(tonic::Code::Unavailable),
            ForwardError::Timeout(_) => code_name(tonic::Code::DeadlineExceeded),
            ForwardError::Rpc(status) => code_name(status.code()),
        }
    }
}

/// Forwards downlinks to a ChirpStack `DeviceService`
#[derive(Clone)]
pub struct Forwarder {
    endpoint: Endpoint,
    authorization: MetadataValue<Ascii>,
    f_port: u32,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(config: &ChirpstackConfig) -> anyhow::Result<Self> {
        let uri = config.endpoint_uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .with_context(|| format!("invalid network server address {}", uri))?
            .connect_timeout(connect_timeout(config.timeout()));

        if uri.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new())
                .context("failed to configure TLS for network server")?;
        }

        let authorization = format!("Bearer {}", config.api_token.trim())
            .parse::<MetadataValue<Ascii>>()
            .map_err(|_| anyhow::anyhow!("api token contains characters not allowed in metadata"))?;

        info!(
            "Forwarder configured for {} (f_port={}, timeout={:?})",
            uri,
            config.f_port,
            config.timeout()
        );

        Ok(Self {
            endpoint,
            authorization,
            f_port: config.f_port,
            timeout: config.timeout(),
        })
    }

    /// Build the enqueue call for one device
    pub fn build_request(
        &self,
        dev_eui: &str,
        data: Vec<u8>,
    ) -> tonic::Request<EnqueueDeviceQueueItemRequest> {
        let mut request = tonic::Request::new(EnqueueDeviceQueueItemRequest {
            queue_item: Some(DeviceQueueItem {
                dev_eui: dev_eui.to_string(),
                confirmed: false,
                f_port: self.f_port,
                data,
                ..Default::default()
            }),
        });
        request
            .metadata_mut()
            .insert("authorization", self.authorization.clone());
        request
    }

    async fn send(
        &self,
        request: tonic::Request<EnqueueDeviceQueueItemRequest>,
    ) -> Result<String, ForwardError> {
        let channel = self
            .endpoint
            .connect()
            .await
            .map_err(ForwardError::Connect)?;
        debug!("Connected to {}", self.endpoint.uri());

        let mut client = DeviceServiceClient::new(channel);
        let response = client.enqueue(request).await?;
        Ok(response.into_inner().id)
    }
}

#[async_trait]
impl DeviceQueue for Forwarder {
    async fn enqueue(&self, dev_eui: &str, data: Vec<u8>) -> Result<String, ForwardError> {
        let size = data.len();
        let request = self.build_request(dev_eui, data);

        let result = match tokio::time::timeout(self.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        };

        match &result {
            Ok(id) => info!(
                "Enqueued downlink {} for {} (f_port={}, {} bytes)",
                id, dev_eui, self.f_port, size
            ),
            Err(e) => warn!(
                "Enqueue for {} failed with {}: {}",
                dev_eui,
                e.code(),
                e
            ),
        }

        result
    }
}

/// TCP connect budget, kept below the overall timeout so a hung connect is
/// always reported as a connection failure
fn connect_timeout(total: Duration) -> Duration {
    total * 3 / 4
}

/// Canonical upper-case gRPC status name
pub fn code_name(code: tonic::Code) -> &'static str {
    use tonic::Code;

    match code {
        Code::Ok => "OK",
        Code::Cancelled => "CANCELLED",
        Code::Unknown => "UNKNOWN",
        Code::InvalidArgument => "INVALID_ARGUMENT",
        Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        Code::NotFound => "NOT_FOUND",
        Code::AlreadyExists => "ALREADY_EXISTS",
        Code::PermissionDenied => "PERMISSION_DENIED",
        Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
        Code::FailedPrecondition => "FAILED_PRECONDITION",
        Code::Aborted => "ABORTED",
        Code::OutOfRange => "OUT_OF_RANGE",
        Code::Unimplemented => "UNIMPLEMENTED",
        Code::Internal => "INTERNAL",
        Code::Unavailable => "UNAVAILABLE",
        Code::DataLoss => "DATA_LOSS",
        Code::Unauthenticated => "UNAUTHENTICATED",
    }
}

fn status_message(status: &tonic::Status) -> String {
    if status.message().is_empty() {
        status.code().description().to_string()
    } else {
        status.message().to_string()
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
