use anyhow::Result;

use crate::*;

/// /status: JSON shape and counters.
#[tokio::test]
async fn test_status_counts_peers() -> Result<()> {
    let server = TestServer::start().await?;
    let url = format!("{}/status", server.base);

    let status: serde_json::Value = client().get(&url).send().await?.json().await?;
    assert!(status["version"].is_string(), "missing version: {}", status);
    assert_eq!(status["peers"], 0);
    assert_eq!(status["live_peers"], 0);

    let (a, b) = (cid('A'), cid('B'));
    get(&server, &[("cid", a.as_str()), ("u4", "6881")]).await?;
    get(&server, &[("cid", b.as_str()), ("u4", "6882")]).await?;
    get(&server, &[("cid", b.as_str()), ("u4", "6882"), ("live", "1")]).await?;

    let status: serde_json::Value = client().get(&url).send().await?.json().await?;
    assert_eq!(status["peers"], 2);
    assert_eq!(status["live_peers"], 1);

    server.stop().await
}
