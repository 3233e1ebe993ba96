//! dhtseed-ctl: command-line client for the dhtseed bootstrap endpoint.

mod cmd;

use anyhow::{Context, Result};

use cmd::http::DEFAULT_URL;

fn print_usage() {
    println!("Usage: dhtseed-ctl [--url <base>] <command>");
    println!();
    println!("Commands:");
    println!("  announce <cid> <port> [--gzip]   Register and list bootstrap peers");
    println!("  ping <cid> <port>                Mark a registered peer live");
    println!("  stop <cid> <port>                Remove a registered peer");
    println!("  status [--json]                  Show registry counters");
    println!();
    println!("Options:");
    println!("  --url <base>   Endpoint base URL (default: {})", DEFAULT_URL);
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.parse()
        .with_context(|| format!("port must be a number, got {:?}", raw))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --url option
    let mut base = DEFAULT_URL.to_string();
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--url" {
            i += 1;
            base = args.get(i).context("--url requires a value")?.clone();
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["announce", cid, port] => cmd::announce::cmd_announce(&base, cid, parse_port(port)?, false).await,
        ["announce", cid, port, "--gzip"] => {
            cmd::announce::cmd_announce(&base, cid, parse_port(port)?, true).await
        }
        ["ping", cid, port] => cmd::announce::cmd_ping(&base, cid, parse_port(port)?).await,
        ["stop", cid, port] => cmd::announce::cmd_stop(&base, cid, parse_port(port)?).await,
        ["status"] | [] => cmd::status::cmd_status(&base, false).await,
        ["status", "--json"] => cmd::status::cmd_status(&base, true).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
