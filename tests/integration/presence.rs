use crate::*;

use serde_json::json;

/// Closing one side tells the other it went offline.
#[tokio::test]
async fn test_disconnect_notifies_counterpart() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let (device, mut console) = register_pair(&relay).await?;

    drop(device);

    expect_type(&mut console, "remote-peer-offline").await?;
    expect_silence(&mut console).await?;

    let r = &relay.relay;
    eventually(move || async move { !r.registry().is_registered("device").await }).await?;
    Ok(())
}

/// A clean close handshake behaves like a dropped socket.
#[tokio::test]
async fn test_close_frame_notifies_counterpart() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let (mut device, mut console) = register_pair(&relay).await?;

    device.close(None).await?;

    expect_type(&mut console, "remote-peer-offline").await?;
    Ok(())
}

/// Reconnecting after a drop brings the pair back online.
#[tokio::test]
async fn test_reconnect_restores_presence() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let (device, mut console) = register_pair(&relay).await?;

    drop(device);
    expect_type(&mut console, "remote-peer-offline").await?;

    let mut device = relay.register("device").await?;
    expect_type(&mut device, "remote-peer-online").await?;
    expect_type(&mut console, "remote-peer-online").await?;

    send_json(&mut device, &json!({"type": "signal", "data": {"type": "offer"}})).await?;
    let got = recv_json(&mut console).await?;
    assert_eq!(got["from"], "device");
    Ok(())
}

/// A connection re-registering under another identity releases the old one.
#[tokio::test]
async fn test_rebinding_releases_old_identity() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let (mut device, mut console) = register_pair(&relay).await?;

    send_json(&mut device, &json!({"type": "registration", "id": "poopush"})).await?;

    expect_type(&mut console, "remote-peer-offline").await?;
    expect_type(&mut device, "remote-peer-offline").await?;

    let registry = relay.relay.registry();
    assert!(!registry.is_registered("device").await);
    assert!(registry.is_registered("poopush").await);
    Ok(())
}

/// Unpaired identities still register and are told they are alone.
#[tokio::test]
async fn test_unpaired_identity_registers() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let mut stranger = relay.register("stranger").await?;

    expect_type(&mut stranger, "remote-peer-offline").await?;
    assert!(relay.relay.registry().is_registered("stranger").await);
    Ok(())
}
