use gwmp::PacketType;
use lorasim_tests::framework::*;

#[async_std::test]
async fn keepalives_and_stats_are_sent() -> anyhow::Result<()> {
    let (ns, sim, _logger) = init().await?;

    for _ in 0..3 {
        let keepalive = ns.receive_type(PacketType::PullData).await?;
        assert_eq!(keepalive.len(), 12);
        assert_eq!(keepalive[0], gwmp::PROTOCOL_VERSION);
        assert_eq!(hex::encode(&keepalive[4..]), GATEWAY_ID);
    }

    let stat = ns.receive_stat().await?;
    assert!(stat.time.ends_with(" GMT"));

    sim.graceful_shutdown().await;
    Ok(())
}

#[async_std::test]
async fn stat_reports_acknowledged_uplinks() -> anyhow::Result<()> {
    let (ns, sim, _logger) = init().await?;

    for _ in 0..2 {
        let uplink = ns.receive_uplink().await?;
        ns.send_push_ack(uplink.token).await?;
    }

    // The first stat goes out at start-up, before anything was forwarded.  Later ones count
    // the uplinks and, once the acks have been read, the ack ratio.
    let mut stat = ns.receive_stat().await?;
    for _ in 0..10 {
        if stat.rxfw >= 2 && stat.ackr > 0.0 {
            break;
        }
        stat = ns.receive_stat().await?;
    }
    assert!(stat.rxfw >= 2);
    assert!(stat.ackr > 0.0);
    assert!(stat.ackr <= 100.0);

    sim.graceful_shutdown().await;
    Ok(())
}
