//! mic - message integrity codes for LoRaWAN data frames

use crate::{AesKey, DevAddr, Direction};
use aes::Aes128;
use cmac::{Cmac, Mac};

// LoRaWAN 1.0.4, 4.4: B0 = 0x49 | 4 x 0x00 | Dir | DevAddr | FCnt | 0x00 | len(msg)
fn b0(direction: Direction, dev_addr: &DevAddr, fcnt: u32, msg_len: usize) -> [u8; 16] {
    let mut b = [0u8; 16];
    b[0] = 0x49;
    b[5] = direction as u8;
    b[6..10].copy_from_slice(&little_endian(dev_addr));
    b[10..14].copy_from_slice(&fcnt.to_le_bytes());
    b[15] = msg_len as u8;
    b
}

// LoRaWAN 1.1, 4.4: B1 = 0x49 | ConfFCnt | TxDr | TxCh | Dir | DevAddr | FCntUp | 0x00 | len(msg)
fn b1(conf_fcnt: u16, tx_dr: u8, tx_ch: u8, dev_addr: &DevAddr, fcnt: u32, msg_len: usize) -> [u8; 16] {
    let mut b = [0u8; 16];
    b[0] = 0x49;
    b[1..3].copy_from_slice(&conf_fcnt.to_le_bytes());
    b[3] = tx_dr;
    b[4] = tx_ch;
    b[5] = Direction::Uplink as u8;
    b[6..10].copy_from_slice(&little_endian(dev_addr));
    b[10..14].copy_from_slice(&fcnt.to_le_bytes());
    b[15] = msg_len as u8;
    b
}

fn cmac(key: &AesKey, block: &[u8; 16], msg: &[u8]) -> [u8; 16] {
    let mut mac = Cmac::<Aes128>::new_from_slice(key).expect("AES-128 key is 16 bytes");
    mac.update(block);
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

pub(crate) fn little_endian(dev_addr: &DevAddr) -> [u8; 4] {
    let mut le = *dev_addr;
    le.reverse();
    le
}

/// LoRaWAN 1.0 data frame MIC, computed with the single network session key over
/// msg = MHDR | FHDR | FPort | FRMPayload.
pub fn data_mic_1_0(
    nwk_s_key: &AesKey,
    direction: Direction,
    dev_addr: &DevAddr,
    fcnt: u32,
    msg: &[u8],
) -> [u8; 4] {
    let cmac = cmac(nwk_s_key, &b0(direction, dev_addr, fcnt, msg.len()), msg);
    [cmac[0], cmac[1], cmac[2], cmac[3]]
}

/// LoRaWAN 1.1 uplink MIC.  The first half comes from the serving network integrity key
/// (over B1), the second half from the forwarding network integrity key (over B0).
#[allow(clippy::too_many_arguments)]
pub fn uplink_mic_1_1(
    s_nwk_s_int_key: &AesKey,
    f_nwk_s_int_key: &AesKey,
    conf_fcnt: u16,
    tx_dr: u8,
    tx_ch: u8,
    dev_addr: &DevAddr,
    fcnt: u32,
    msg: &[u8],
) -> [u8; 4] {
    let cmac_s = cmac(
        s_nwk_s_int_key,
        &b1(conf_fcnt, tx_dr, tx_ch, dev_addr, fcnt, msg.len()),
        msg,
    );
    let cmac_f = cmac(
        f_nwk_s_int_key,
        &b0(Direction::Uplink, dev_addr, fcnt, msg.len()),
        msg,
    );
    [cmac_s[0], cmac_s[1], cmac_f[0], cmac_f[1]]
}
