//! Downlink sender
//!
//! Posts a single downlink to a running bridge and prints the response.
//! Useful for exercising a deployment without writing an HTTP client.
//!
//! Usage:
//!   cargo run --bin downlink-send -- --dev-eui 0102030405060708 --command on
//!   cargo run --bin downlink-send -- --dev-eui 0102030405060708 --bytes 1,2,255
//!   cargo run --bin downlink-send -- --dev-eui 0102030405060708 --payload AQID

use anyhow::Context;
use chirpstack_bridge::http::types::DownlinkRequest;
use clap::{ArgGroup, Parser};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "downlink-send")]
#[command(about = "Send one downlink through a running chirpstack-bridge")]
#[command(group(ArgGroup::new("data").required(true).args(["payload", "integer", "bytes", "command"])))]
struct Cli {
    /// Bridge base URL
    #[arg(long, default_value = "http://127.0.0.1:10000")]
    bridge: String,

    /// Device EUI (16 hex digits)
    #[arg(long)]
    dev_eui: String,

    /// Text payload (base64, "on"/"off" or plain ASCII)
    #[arg(long)]
    payload: Option<String>,

    /// Single byte value
    #[arg(long, allow_negative_numbers = true)]
    integer: Option<i64>,

    /// Comma-separated byte values, e.g. 1,2,255
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    bytes: Option<Vec<i64>>,

    /// Keyword command ("on" or "off")
    #[arg(long)]
    command: Option<String>,
}

impl Cli {
    fn request(&self) -> DownlinkRequest {
        let payload = if let Some(ref text) = self.payload {
            Some(json!(text))
        } else if let Some(n) = self.integer {
            Some(json!(n))
        } else {
            self.bytes.as_ref().map(|list| json!(list))
        };

        DownlinkRequest {
            dev_eui: Some(self.dev_eui.clone()),
            payload,
            command: self.command.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let url = format!("{}/downlink", cli.bridge.trim_end_matches('/'));
    let request = cli.request();

    println!("Sending downlink to {}", url);
    println!("  {}", serde_json::to_string(&request)?);

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("failed to reach bridge at {}", url))?;

    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .context("bridge returned a non-JSON response")?;

    println!("HTTP {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        anyhow::bail!("downlink rejected with HTTP {}", status.as_u16());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_become_json_list() {
        let cli = Cli::try_parse_from([
            "downlink-send",
            "--dev-eui",
            "0102030405060708",
            "--bytes",
            "1,2,255",
        ])
        .unwrap();
        let req = cli.request();
        assert_eq!(req.payload, Some(json!([1, 2, 255])));
        assert!(req.command.is_none());
    }

    #[test]
    fn test_command_only() {
        let cli = Cli::try_parse_from([
            "downlink-send",
            "--dev-eui",
            "0102030405060708",
            "--command",
            "on",
        ])
        .unwrap();
        let req = cli.request();
        assert!(req.payload.is_none());
        assert_eq!(req.command.as_deref(), Some("on"));
    }

    #[test]
    fn test_requires_exactly_one_data_source() {
        assert!(Cli::try_parse_from(["downlink-send", "--dev-eui", "0102030405060708"]).is_err());
        assert!(Cli::try_parse_from([
            "downlink-send",
            "--dev-eui",
            "0102030405060708",
            "--payload",
            "on",
            "--command",
            "on",
        ])
        .is_err());
    }
}
