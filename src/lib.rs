//! HTTP to ChirpStack gRPC downlink bridge
//!
//! Accepts `POST /downlink` requests carrying a device EUI and a payload
//! (or an on/off command), normalizes the payload into raw bytes and
//! enqueues it on a ChirpStack v4 network server through
//! `api.DeviceService/Enqueue`.

pub mod chirpstack;
pub mod config;
pub mod http;
pub mod payload;
