use crate::config::RadarConfig;

/// Locates a signal value in the configured band table.
///
/// The signal is clamped into `[rssi_min, rssi_max]` first, so values below
/// the lowest floor land in the first band and values above the highest
/// ceiling land in the last. The result is a step function of the clamped
/// value, never interpolated. Returns the band index and its fixed radius.
pub fn band_for_signal(signal: f64, config: &RadarConfig) -> (usize, f64) {
    let clamped = signal.clamp(config.rssi_min as f64, config.rssi_max as f64);
    let idx = config
        .bands
        .iter()
        .rposition(|band| band.floor as f64 <= clamped)
        .unwrap_or(0);
    (idx, config.bands[idx].radius)
}
