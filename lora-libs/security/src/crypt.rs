use crate::mic::little_endian;
use crate::{AesKey, DevAddr, Direction};
use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit};

/// Encrypt (or, equivalently, decrypt) a FRMPayload in place.
///
/// LoRaWAN 1.0.4, 4.3.3.1: the payload is XORed with the keystream S = aes128(K, A_1) | aes128(K, A_2) | ...
/// where A_i = 0x01 | 4 x 0x00 | Dir | DevAddr | FCnt | 0x00 | i.
pub fn encrypt_frm_payload(
    key: &AesKey,
    direction: Direction,
    dev_addr: &DevAddr,
    fcnt: u32,
    data: &mut [u8],
) {
    let cipher = Aes128::new(key.into());
    let mut a = [0u8; 16];
    a[0] = 0x01;
    a[5] = direction as u8;
    a[6..10].copy_from_slice(&little_endian(dev_addr));
    a[10..14].copy_from_slice(&fcnt.to_le_bytes());

    for (i, chunk) in data.chunks_mut(16).enumerate() {
        a[15] = (i + 1) as u8;
        let mut s = aes::Block::from(a);
        cipher.encrypt_block(&mut s);
        chunk.iter_mut().zip(s.iter()).for_each(|(b, k)| *b ^= k);
    }
}
