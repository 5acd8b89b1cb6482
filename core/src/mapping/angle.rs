use sha2::{Digest, Sha256};
use std::f64::consts::TAU;

/// Deterministically maps an identity to a bearing in [0, 2π) radians.
///
/// The bearing is a uniformly distributed fingerprint of the identity
/// string, stable across restarts. It carries no directional measurement.
pub fn bearing_from_id(id: &str) -> f64 {
    let digest = Sha256::digest(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let fraction = u64::from_be_bytes(head) as f64 / (u64::MAX as f64 + 1.0);
    fraction * TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearing_is_deterministic() {
        let bearing = bearing_from_id("device-123");
        assert_eq!(bearing_from_id("device-123"), bearing);
    }

    #[test]
    fn bearings_generally_differ_for_distinct_ids() {
        assert_ne!(bearing_from_id("alpha"), bearing_from_id("beta"));
    }

    #[test]
    fn bearing_stays_within_full_circle() {
        for id in ["a", "sim-move", "aa:bb:cc:dd:ee:ff", ""] {
            let bearing = bearing_from_id(id);
            assert!((0.0..TAU).contains(&bearing), "bearing {} for {:?}", bearing, id);
        }
    }
}
