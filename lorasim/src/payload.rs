//! payload - application payloads from a raw hex string or from configured numeric values

use crate::{DefaultDataConfig, Error, RawPayloadConfig};
use rand::Rng;

enum Source {
    Raw(Vec<u8>),
    Generated { entries: Vec<[f64; 3]>, random: bool },
}

pub struct PayloadGenerator {
    source: Source,
    // Direction of the random jitter.  Flips at random so generated values wander both ways.
    sign: f64,
}

impl PayloadGenerator {
    pub fn from_config(
        default_data: &DefaultDataConfig,
        raw_payload: &RawPayloadConfig,
    ) -> Result<Self, Error> {
        let source = if raw_payload.use_raw {
            let bytes = hex::decode(raw_payload.payload.trim())
                .map_err(|e| Error::Payload(format!("raw payload is not hex - {e}")))?;
            Source::Raw(bytes)
        } else {
            for [_, max, width] in &default_data.data {
                check_entry(*max, *width)?;
            }
            Source::Generated {
                entries: default_data.data.clone(),
                random: default_data.random,
            }
        };
        Ok(PayloadGenerator { source, sign: 1.0 })
    }

    pub fn next_payload(&mut self) -> Result<Vec<u8>, Error> {
        match &self.source {
            Source::Raw(bytes) => Ok(bytes.clone()),
            Source::Generated { entries, random } => {
                let mut rng = rand::rng();
                let mut payload = Vec::new();
                for [value, max, width] in entries {
                    if rng.random_bool(0.5) {
                        self.sign = -self.sign;
                    }
                    let value = if *random {
                        value + self.sign * rng.random::<f64>() / 100.0
                    } else {
                        *value
                    };
                    payload.extend(encode_scaled(value, *max, *width as u8)?);
                }
                Ok(payload)
            }
        }
    }
}

fn check_entry(max: f64, width: f64) -> Result<(), Error> {
    if max == 0.0 || !max.is_finite() {
        return Err(Error::Payload(format!("max value {max} must be finite and non-zero")));
    }
    if width.fract() != 0.0 || !(1.0..=8.0).contains(&width) {
        return Err(Error::Payload(format!("byte width {width} must be 1 to 8")));
    }
    Ok(())
}

/// Encode `value` as a big endian two's complement integer of `width` bytes, scaled so that
/// `max` maps onto the largest positive value the width can hold.  Out of range values saturate.
pub fn encode_scaled(value: f64, max: f64, width: u8) -> Result<Vec<u8>, Error> {
    check_entry(max, width as f64)?;
    let full_scale = ((1u64 << (8 * width as u32 - 1)) - 1) as f64;
    let scaled = (value / max * full_scale)
        .round()
        .clamp(-full_scale - 1.0, full_scale) as i64;
    Ok(scaled.to_be_bytes()[8 - width as usize..].to_vec())
}
