//! Block decibel estimation.
//!
//! The level is the DC-removed signal power (sample variance) relative to
//! 16-bit full scale, expressed in dB with an empirical calibration offset:
//!
//! ```text
//! power = (Σx² − (Σx)²/n) / n / 32768²
//! level = trunc(10 · log10(power) + 0.6)
//! ```

/// Maximum magnitude of a 16-bit sample.
pub const FULL_SCALE: f64 = 32768.0;

/// Empirical calibration offset added to the raw power level.
pub const CALIBRATION_OFFSET_DB: f64 = 0.6;

/// Level reported for silence and for any block quieter than this floor.
///
/// The quietest non-silent 16-bit block (a single ±1 sample in a million)
/// sits just above this value, so clamping keeps the estimate monotonic.
pub const SILENCE_DB: i32 = -150;

/// Normalized DC-removed power of `samples`, in `[0.0, ~1.0]`.
///
/// Sums are accumulated exactly in integers, so a constant (DC-only) or
/// all-zero block yields exactly `0.0`.
pub fn normalized_power(samples: &[i16]) -> f64 {
    let count = samples.len() as i128;
    if count == 0 {
        return 0.0;
    }

    let (sum, sum_squares) = samples.iter().fold((0i128, 0i128), |(sum, sq), &s| {
        let v = i128::from(s);
        (sum + v, sq + v * v)
    });

    // count² · variance, never negative in exact arithmetic
    let spread = count * sum_squares - sum * sum;
    if spread <= 0 {
        return 0.0;
    }

    spread as f64 / (count * count) as f64 / (FULL_SCALE * FULL_SCALE)
}

/// Integer decibel estimate of a whole block.
///
/// Returns [`SILENCE_DB`] for empty input, silence and DC-only blocks.
pub fn estimate(samples: &[i16]) -> i32 {
    let power = normalized_power(samples);
    if power <= 0.0 {
        return SILENCE_DB;
    }
    let level = 10.0 * power.log10() + CALIBRATION_OFFSET_DB;
    (level.trunc() as i32).max(SILENCE_DB)
}

/// Estimate over `count` samples starting at `offset`.
///
/// A window reaching past the end of `samples` is cut at the end.
pub fn estimate_window(samples: &[i16], offset: usize, count: usize) -> i32 {
    let end = offset.saturating_add(count).min(samples.len());
    let start = offset.min(end);
    estimate(&samples[start..end])
}
