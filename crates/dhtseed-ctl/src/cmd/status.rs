//! Daemon status command.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::get_json;

#[derive(Deserialize, Serialize)]
struct StatusResponse {
    version: String,
    peers: usize,
    live_peers: usize,
}

pub async fn cmd_status(base: &str, json: bool) -> Result<()> {
    let resp: StatusResponse =
        get_json(&format!("{}/status", base.trim_end_matches('/'))).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  dhtseedd {}", resp.version);
    println!("═══════════════════════════════════════");
    println!("  Registered peers : {}", resp.peers);
    println!("  Live peers       : {}", resp.live_peers);
    Ok(())
}
