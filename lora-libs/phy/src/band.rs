//! band - regional data rate tables
//!
//! Only the LoRa-modulated data rates are listed.  Each entry is (SF, bandwidth kHz, N),
//! with N the largest FRMPayload when no FOpts are present and dwell time limits are off.

type DataRateEntry = (u8, u32, usize);

const EU_LIKE: &[DataRateEntry] = &[
    (12, 125, 51),
    (11, 125, 51),
    (10, 125, 51),
    (9, 125, 115),
    (8, 125, 242),
    (7, 125, 242),
    (7, 250, 242),
];

const US_902_928: &[DataRateEntry] = &[
    (10, 125, 11),
    (9, 125, 53),
    (8, 125, 125),
    (7, 125, 242),
    (8, 500, 242),
];

const AU_915_928: &[DataRateEntry] = &[
    (12, 125, 51),
    (11, 125, 51),
    (10, 125, 51),
    (9, 125, 115),
    (8, 125, 242),
    (7, 125, 242),
    (8, 500, 242),
];

const SIX_RATES: &[DataRateEntry] = &[
    (12, 125, 51),
    (11, 125, 51),
    (10, 125, 51),
    (9, 125, 115),
    (8, 125, 242),
    (7, 125, 242),
];

fn table(band: &str) -> Option<&'static [DataRateEntry]> {
    match band {
        "EU_863_870" | "EU_433" | "CN_779_787" | "AS_923" | "RU_864_870" => Some(EU_LIKE),
        "US_902_928" => Some(US_902_928),
        "AU_915_928" => Some(AU_915_928),
        "CN_470_510" | "KR_920_923" | "IN_865_867" => Some(SIX_RATES),
        _ => None,
    }
}

/// The data rate index the band assigns to a spreading factor / bandwidth pair.
pub fn data_rate_index(band: &str, spreading_factor: u8, bandwidth_khz: u32) -> Option<u8> {
    table(band)?
        .iter()
        .position(|(sf, bw, _)| *sf == spreading_factor && *bw == bandwidth_khz)
        .map(|dr| dr as u8)
}

pub fn max_payload_size(band: &str, data_rate_index: u8) -> Option<usize> {
    table(band)?
        .get(data_rate_index as usize)
        .map(|(_, _, n)| *n)
}
