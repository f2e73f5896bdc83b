use crate::*;

async fn api_get(relay: &TestRelay, path: &str) -> Result<Value> {
    reqwest::get(relay.api_url(path))
        .await
        .with_context(|| format!("GET {path} failed"))?
        .json::<Value>()
        .await
        .context("failed to parse response")
}

/// /status reports configuration and live counts.
#[tokio::test]
async fn test_api_status() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let (_device, _console) = register_pair(&relay).await?;

    let status = api_get(&relay, "/status").await?;
    assert_eq!(status["port"], relay.signaling_addr.port());
    assert_eq!(status["strategy"], "addressed");
    assert_eq!(status["pairs"], 2);
    assert_eq!(status["peers_registered"], 2);
    assert_eq!(status["connections_open"], 2);
    assert!(status["uptime_secs"].is_number(), "missing uptime_secs");
    Ok(())
}

/// /peers lists identities with counterpart state.
#[tokio::test]
async fn test_api_peers() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let mut device = relay.register("device").await?;
    expect_type(&mut device, "remote-peer-offline").await?;

    let resp = api_get(&relay, "/peers").await?;
    let peers = resp["peers"].as_array().context("missing peers")?;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0]["identity"], "device");
    assert_eq!(peers[0]["counterpart"], "console");
    assert_eq!(peers[0]["counterpart_online"], false);

    let mut console = relay.register("console").await?;
    expect_type(&mut console, "remote-peer-online").await?;

    let resp = api_get(&relay, "/peers").await?;
    let peers = resp["peers"].as_array().context("missing peers")?;
    assert_eq!(peers.len(), 2);
    assert!(peers.iter().all(|p| p["counterpart_online"] == true));
    Ok(())
}

/// /connections includes connections that never registered.
#[tokio::test]
async fn test_api_connections() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let _anon = connect(&relay.ws_url("/ws")).await?;
    let mut device = relay.register("device").await?;
    expect_type(&mut device, "remote-peer-offline").await?;
    let r = &relay.relay;
    eventually(move || async move { r.connection_count() == 2 }).await?;

    let resp = api_get(&relay, "/connections").await?;
    let conns = resp["connections"].as_array().context("missing connections")?;
    assert_eq!(conns.len(), 2);

    let states: Vec<&str> = conns.iter().filter_map(|c| c["state"].as_str()).collect();
    assert!(states.contains(&"unregistered"), "states: {states:?}");
    assert!(states.contains(&"registered"), "states: {states:?}");
    assert!(conns
        .iter()
        .all(|c| c["remote"].as_str().is_some_and(|r| r.starts_with("127.0.0.1:"))));
    Ok(())
}

/// POST /daemon/shutdown stops both servers.
#[tokio::test]
async fn test_api_shutdown() -> Result<()> {
    let mut relay = start_relay(test_config()).await?;

    let resp: Value = {
        let client = reqwest::Client::new();
        client
            .post(relay.api_url("/daemon/shutdown"))
            .send()
            .await?
            .json()
            .await?
    };
    assert_eq!(resp["message"], "Shutdown initiated");

    tokio::time::timeout(Duration::from_secs(5), &mut relay.signaling_task)
        .await
        .context("signaling server did not stop")???;
    tokio::time::timeout(Duration::from_secs(5), &mut relay.api_task)
        .await
        .context("admin API did not stop")???;
    Ok(())
}

/// Unknown admin routes are 404.
#[tokio::test]
async fn test_api_unknown_route() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let resp = reqwest::get(relay.api_url("/nope")).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    relay.stop();
    Ok(())
}
