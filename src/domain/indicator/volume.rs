//! Rolling volume baseline and z-score.

use crate::domain::indicator::moving_average::sma;

pub struct VolumeColumns {
    pub average: Vec<Option<f64>>,
    pub z_score: Vec<Option<f64>>,
}

/// Rolling mean of volume plus the z-score of the current bar's volume
/// against that window. Zero dispersion leaves the z-score undefined.
pub fn volume_profile(volumes: &[f64], period: usize) -> VolumeColumns {
    let n = volumes.len();
    let average = sma(volumes, period);
    let mut z_score = vec![None; n];

    if period >= 2 {
        for i in (period - 1)..n {
            let Some(mean) = average[i] else { continue };
            let window = &volumes[i + 1 - period..=i];
            let variance = window
                .iter()
                .map(|v| {
                    let d = v - mean;
                    d * d
                })
                .sum::<f64>()
                / (period - 1) as f64;
            let stddev = variance.sqrt();
            if stddev > 0.0 {
                z_score[i] = Some((volumes[i] - mean) / stddev);
            }
        }
    }

    VolumeColumns { average, z_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn average_matches_sma() {
        let vols = [10.0, 20.0, 30.0, 40.0];
        let cols = volume_profile(&vols, 3);
        assert_relative_eq!(cols.average[2].unwrap(), 20.0);
        assert_relative_eq!(cols.average[3].unwrap(), 30.0);
    }

    #[test]
    fn spike_has_positive_z() {
        let vols = [10.0, 10.0, 10.0, 10.0, 100.0];
        let cols = volume_profile(&vols, 5);
        assert!(cols.z_score[4].unwrap() > 1.0);
    }

    #[test]
    fn constant_volume_z_is_undefined() {
        let vols = [10.0; 6];
        let cols = volume_profile(&vols, 3);
        assert!(cols.z_score.iter().all(Option::is_none));
    }

    #[test]
    fn warmup_is_none() {
        let vols = [10.0, 20.0, 30.0];
        let cols = volume_profile(&vols, 3);
        assert!(cols.average[0].is_none());
        assert!(cols.z_score[1].is_none());
    }
}
