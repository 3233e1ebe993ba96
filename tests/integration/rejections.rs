use anyhow::Result;

use dhtseed_core::request::{Denylist, RequestValidator};
use dhtseed_services::{RecordStore, StoreStats};

use crate::*;

async fn assert_rejected(
    server: &TestServer,
    params: &[(&str, &str)],
    code: u16,
    message: &str,
) -> Result<()> {
    let (status, body) = get(server, params).await?;
    assert_eq!(status.as_u16(), code, "params {:?}: {}", params, body);
    assert_eq!(body, format!("HTTP/1.1 {} {}", code, message));
    Ok(())
}

#[tokio::test]
async fn test_empty_query_is_server_error() -> Result<()> {
    let server = TestServer::start().await?;
    assert_rejected(&server, &[], 500, "Empty request").await?;
    server.stop().await
}

#[tokio::test]
async fn test_validation_order_and_messages() -> Result<()> {
    let server = TestServer::start().await?;
    let a = cid('A');

    assert_rejected(&server, &[("cid", "short"), ("u4", "6881")], 400, "Invalid CID").await?;
    // identifier is checked before the port
    assert_rejected(&server, &[("cid", "short")], 400, "Invalid CID").await?;
    assert_rejected(&server, &[("cid", a.as_str())], 400, "You client is in passive mode").await?;
    assert_rejected(
        &server,
        &[("cid", a.as_str()), ("u4", "1023")],
        400,
        "UDP port must be >= 1024",
    )
    .await?;
    assert_rejected(
        &server,
        &[("cid", a.as_str()), ("u4", "junk")],
        400,
        "UDP port must be >= 1024",
    )
    .await?;
    assert_rejected(
        &server,
        &[("cid", a.as_str()), ("u4", "70000")],
        400,
        "UDP port must be <= 65535",
    )
    .await?;

    assert_eq!(server.store.stats()?, StoreStats::default());
    server.stop().await
}

#[tokio::test]
async fn test_leading_digits_are_accepted_as_port() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, _) = get(&server, &[("cid", cid('A').as_str()), ("u4", "6881abc")]).await?;
    assert_eq!(status, 200);
    let id = dhtseed_core::peer::PeerId::parse(&cid('A'))?;
    assert_eq!(server.store.get(&id)?.expect("A stored").port, 6881);
    server.stop().await
}

#[tokio::test]
async fn test_register_without_cid_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    assert_rejected(&server, &[("u4", "6881")], 400, "Missing CID").await?;
    assert_eq!(server.store.stats()?.peers, 0);
    server.stop().await
}

#[tokio::test]
async fn test_denylisted_clients_are_rejected() -> Result<()> {
    let server = TestServer::start_with(RequestValidator::new(Denylist::with_extra([
        "BadClient/1.0".to_string(),
    ])))
    .await?;
    let url = server.dht_url(&[("cid", cid('A').as_str()), ("u4", "6881")]);

    for agent in ["FlylinkDC++ r502-beta7 build 9543", "BadClient/1.0"] {
        let resp = reqwest::Client::builder()
            .user_agent(agent)
            .build()?
            .get(url.clone())
            .send()
            .await?;
        assert_eq!(resp.status(), 400, "agent {}", agent);
        assert_eq!(
            resp.text().await?,
            "HTTP/1.1 400 Invalid user agent - update FlylinkDC -> r502 http://www.flylinkdc.ru"
        );
    }

    // near miss is fine
    let resp = reqwest::Client::builder()
        .user_agent("FlylinkDC++ r502-beta7 build 9544")
        .build()?
        .get(url)
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(server.store.stats()?.peers, 1);
    server.stop().await
}
