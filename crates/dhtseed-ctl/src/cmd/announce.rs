//! announce, ping and stop commands.

use anyhow::{Result, bail};

use super::http::get_text;

#[derive(Debug, PartialEq, Eq)]
struct Node {
    cid: String,
    ip: String,
    port: String,
}

async fn send(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let (status, body) = get_text(base, params).await?;
    if !status.is_success() {
        bail!("{} ({})", body.trim(), status);
    }
    Ok(body)
}

pub async fn cmd_announce(base: &str, cid: &str, port: u16, gzip: bool) -> Result<()> {
    let port = port.to_string();
    let mut params = vec![("cid", cid), ("u4", port.as_str())];
    if gzip {
        params.push(("encryption", "1"));
    }
    let body = send(base, &params).await?;
    let nodes = parse_nodes(&body);

    if nodes.is_empty() {
        println!("Registered. No live peers to bootstrap from yet.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Bootstrap Peers ({})", nodes.len());
    println!("═══════════════════════════════════════");
    for n in &nodes {
        println!("  {}  {}:{}", n.cid, n.ip, n.port);
    }
    Ok(())
}

pub async fn cmd_ping(base: &str, cid: &str, port: u16) -> Result<()> {
    let port = port.to_string();
    let body = send(base, &[("cid", cid), ("u4", port.as_str()), ("live", "1")]).await?;
    println!("{}", body.trim());
    Ok(())
}

pub async fn cmd_stop(base: &str, cid: &str, port: u16) -> Result<()> {
    let port = port.to_string();
    let body = send(base, &[("cid", cid), ("u4", port.as_str()), ("stop", "1")]).await?;
    println!("{}", body.trim());
    Ok(())
}

/// Pull `<Node .../>` entries out of a reply, one per line.
fn parse_nodes(xml: &str) -> Vec<Node> {
    xml.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("<Node "))
        .filter_map(|line| {
            Some(Node {
                cid: attr(line, "CID")?,
                ip: attr(line, "I4")?,
                port: attr(line, "U4")?,
            })
        })
        .collect()
}

fn attr(line: &str, name: &str) -> Option<String> {
    let key = format!(" {}=\"", name);
    let start = line.find(&key)? + key.len();
    let len = line[start..].find('"')?;
    Some(unescape(&line[start..start + len]))
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#9;", "\t")
        .replace("&#10;", "\n")
        .replace("&#13;", "\r")
        .replace("&amp;", "&")
}
