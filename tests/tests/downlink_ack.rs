use gwmp::PacketType;
use lorasim_tests::framework::*;

#[async_std::test]
async fn downlink_is_acknowledged() -> anyhow::Result<()> {
    let (ns, sim, _logger) = init().await?;

    // Wait for a keepalive so the server knows where the forwarder is.
    ns.receive_type(PacketType::PullData).await?;

    // Unconfirmed data down to our device, FCnt 7, no FPort.
    let phy = [0x60, 0xda, 0x1b, 0x01, 0x26, 0x00, 0x07, 0x00, 0x01, 0x02, 0x03, 0x04];
    ns.send_pull_resp(0x1234, &phy).await?;

    let ack = ns.receive_type(PacketType::TxAck).await?;
    assert_eq!(ack[..4], [gwmp::PROTOCOL_VERSION, 0x12, 0x34, 0x05]);
    assert_eq!(hex::encode(&ack[4..]), GATEWAY_ID);

    // The next uplink folds the downlink counter into the session.
    ns.receive_uplink().await?;
    ns.receive_uplink().await?;
    let session = sim.graceful_shutdown().await;
    assert_eq!(session.fcnt_down(), 8);
    Ok(())
}
