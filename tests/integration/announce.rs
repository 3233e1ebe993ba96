use anyhow::Result;
use reqwest::header;

use dhtseed_core::peer::PeerId;
use dhtseed_services::RecordStore;

use crate::*;

fn peer_id(c: char) -> PeerId {
    PeerId::parse(&cid(c)).unwrap()
}

/// A registers, pings, B registers and sees A, A stops, B sees nobody.
#[tokio::test]
async fn test_bootstrap_round_trip() -> Result<()> {
    let server = TestServer::start().await?;
    let (a, b) = (cid('A'), cid('B'));

    let (status, body) = get(&server, &[("cid", a.as_str()), ("u4", "6881")]).await?;
    assert_eq!(status, 200);
    assert!(body.contains("<Nodes>"), "body: {}", body);
    assert!(!body.contains("<Node "), "first peer got a sample: {}", body);
    let record = server.store.get(&peer_id('A'))?.expect("A stored");
    assert_eq!(record.connection_count, 1);
    assert!(!record.live);
    assert_eq!(record.address.to_string(), "127.0.0.1");

    let (status, body) = get(&server, &[("cid", a.as_str()), ("u4", "6881"), ("live", "1")]).await?;
    assert_eq!(status, 200);
    assert_eq!(body, "Live OK!");
    assert!(server.store.get(&peer_id('A'))?.expect("A stored").live);

    let (status, body) = get(&server, &[("cid", b.as_str()), ("u4", "6882")]).await?;
    assert_eq!(status, 200);
    assert!(
        body.contains(&format!("<Node CID=\"{}\" I4=\"127.0.0.1\" U4=\"6881\" />", a)),
        "A missing from sample: {}",
        body
    );
    assert!(!body.contains(&b), "requester in its own sample: {}", body);

    let (status, body) = get(&server, &[("cid", a.as_str()), ("u4", "6881"), ("stop", "1")]).await?;
    assert_eq!(status, 200);
    assert_eq!(body, "Shutdown OK!");
    assert!(server.store.get(&peer_id('A'))?.is_none());

    for _ in 0..5 {
        let (_, body) = get(&server, &[("cid", b.as_str()), ("u4", "6882")]).await?;
        assert!(!body.contains("<Node "), "removed peer sampled: {}", body);
    }

    server.stop().await
}

#[tokio::test]
async fn test_repeated_register_counts_connections() -> Result<()> {
    let server = TestServer::start().await?;
    let a = cid('A');
    for _ in 0..3 {
        get(&server, &[("cid", a.as_str()), ("u4", "6881")]).await?;
    }
    let record = server.store.get(&peer_id('A'))?.expect("A stored");
    assert_eq!(record.connection_count, 3);
    assert_eq!(record.user_agent.as_deref(), Some("FlylinkDC++ r600 build 18000"));
    assert_eq!(server.store.stats()?.peers, 1);
    server.stop().await
}

#[tokio::test]
async fn test_unknown_peer_ping_and_stop_confirm() -> Result<()> {
    let server = TestServer::start().await?;
    let q = cid('Q');

    let (status, body) = get(&server, &[("cid", q.as_str()), ("u4", "6881"), ("live", "")]).await?;
    assert_eq!((status.as_u16(), body.as_str()), (200, "Live OK!"));

    let (status, body) = get(&server, &[("cid", q.as_str()), ("u4", "6881"), ("stop", "")]).await?;
    assert_eq!((status.as_u16(), body.as_str()), (200, "Shutdown OK!"));

    assert_eq!(server.store.stats()?.peers, 0);
    server.stop().await
}

#[tokio::test]
async fn test_live_wins_over_stop() -> Result<()> {
    let server = TestServer::start().await?;
    let a = cid('A');
    get(&server, &[("cid", a.as_str()), ("u4", "6881")]).await?;

    let (_, body) = get(&server, &[("cid", a.as_str()), ("u4", "6881"), ("live", "1"), ("stop", "1")]).await?;
    assert_eq!(body, "Live OK!");
    let record = server.store.get(&peer_id('A'))?.expect("A kept");
    assert!(record.live);
    server.stop().await
}

#[tokio::test]
async fn test_root_path_serves_the_same_endpoint() -> Result<()> {
    let server = TestServer::start().await?;
    let url = reqwest::Url::parse_with_params(
        &format!("{}/", server.base),
        &[("cid", cid('A').as_str()), ("u4", "6881")],
    )?;
    let resp = client().get(url).send().await?;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await?.contains("<Nodes>"));
    assert!(server.store.get(&peer_id('A'))?.is_some());
    server.stop().await
}

#[tokio::test]
async fn test_replies_are_not_cacheable() -> Result<()> {
    let server = TestServer::start().await?;
    let resp = client()
        .get(server.dht_url(&[("cid", cid('A').as_str()), ("u4", "6881")]))
        .send()
        .await?;
    let headers = resp.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/xml");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-store, no-cache, must-revalidate, pre-check=0, post-check=0"
    );
    assert_eq!(headers[header::EXPIRES], "Mon, 26 Jul 1997 05:00:00 GMT");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    server.stop().await
}

#[tokio::test]
async fn test_gzip_only_when_requested() -> Result<()> {
    let server = TestServer::start().await?;
    let raw = reqwest::Client::builder()
        .user_agent("FlylinkDC++ r600 build 18000")
        .no_gzip()
        .build()?;

    let packed = raw
        .get(server.dht_url(&[("cid", cid('A').as_str()), ("u4", "6881"), ("encryption", "1")]))
        .header(header::ACCEPT_ENCODING, "gzip")
        .send()
        .await?;
    assert_eq!(packed.status(), 200);
    assert_eq!(packed.headers()[header::CONTENT_ENCODING], "gzip");
    let bytes = packed.bytes().await?;
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let plain = raw
        .get(server.dht_url(&[("cid", cid('B').as_str()), ("u4", "6882")]))
        .header(header::ACCEPT_ENCODING, "gzip")
        .send()
        .await?;
    assert!(plain.headers().get(header::CONTENT_ENCODING).is_none());

    let not_accepted = raw
        .get(server.dht_url(&[("cid", cid('C').as_str()), ("u4", "6883"), ("encryption", "1")]))
        .send()
        .await?;
    assert!(not_accepted.headers().get(header::CONTENT_ENCODING).is_none());
    assert!(not_accepted.text().await?.contains("<Nodes>"));

    // a decompressing client reads the same document
    let (_, body) = get(&server, &[("cid", cid('D').as_str()), ("u4", "6884"), ("encryption", "1")]).await?;
    assert!(body.starts_with("<?xml"));

    server.stop().await
}
