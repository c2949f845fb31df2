use lorasim_tests::framework::*;
use phy::MType;
use security::{Direction, encrypt_frm_payload, mic::data_mic_1_0};

#[async_std::test]
async fn uplinks_are_valid_frames_with_consecutive_counters() -> anyhow::Result<()> {
    let (ns, sim, _logger) = init().await?;

    let first = ns.receive_uplink().await?;
    assert_eq!(first.header.fcnt, 0);
    assert_eq!(first.gateway_id, GATEWAY_ID);

    for expected_fcnt in 1..4u16 {
        let uplink = ns.receive_uplink().await?;
        let header = &uplink.header;
        assert_eq!(header.fcnt, expected_fcnt);
        assert_eq!(header.m_type, MType::UnconfirmedDataUp);
        assert_eq!(header.dev_addr, DEV_ADDR);
        assert_eq!(header.f_port, Some(2));

        // MHDR | FHDR | FPort | FRMPayload | MIC
        let phy = &uplink.phy_payload;
        let (msg, mic) = phy.split_at(phy.len() - 4);
        assert_eq!(
            mic,
            data_mic_1_0(&NWK_S_KEY, Direction::Uplink, &DEV_ADDR, expected_fcnt as u32, msg)
        );
        let mut payload = msg[9..].to_vec();
        encrypt_frm_payload(
            &APP_S_KEY,
            Direction::Uplink,
            &DEV_ADDR,
            expected_fcnt as u32,
            &mut payload,
        );
        assert_eq!(payload, [0xde, 0xad, 0xbe, 0xef]);

        let rxpk = &uplink.rxpk;
        assert_eq!(rxpk.size as usize, phy.len());
        assert_eq!(rxpk.datr, "SF7BW125");
        assert_eq!(rxpk.freq, 868.5);
        assert_eq!(rxpk.chan, 2);
        assert_eq!(rxpk.rssi, -57);
        assert!(rxpk.time.is_some());

        ns.send_push_ack(uplink.token).await?;
    }

    let session = sim.graceful_shutdown().await;
    assert!(session.fcnt_up() >= 4);
    Ok(())
}
