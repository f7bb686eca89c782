//! Linear-interpolation resampling between the sample rates the bridge
//! actually needs (8k/16k/24k). Good enough for narrowband telephony
//! speech; a production deployment wanting broadcast-quality resampling
//! would reach for a windowed-sinc resampler instead.

/// Resample a sequence of 16-bit linear PCM samples from `from_hz` to
/// `to_hz`. Returns the input unchanged when the rates already match.
#[must_use]
pub fn resample_linear(input: &[i16], from_hz: u32, to_hz: u32) -> Vec<i16> {
    if from_hz == to_hz || input.is_empty() {
        return input.to_vec();
    }

    let ratio = f64::from(to_hz) / f64::from(from_hz);
    let out_len = ((input.len() as f64) * ratio).round().max(0.0) as usize;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            let frac = src_pos - idx as f64;
            let a = f64::from(input[idx.min(last)]);
            let b = f64::from(input[(idx + 1).min(last)]);
            (a + (b - a) * frac).round() as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rates_are_a_no_op() {
        let input = vec![1, 2, 3, 4];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn upsampling_doubles_length() {
        let input = vec![0i16; 160]; // 20ms @ 8kHz
        let output = resample_linear(&input, 8_000, 16_000);
        assert_eq!(output.len(), 320); // 20ms @ 16kHz
    }

    #[test]
    fn downsampling_halves_length() {
        let input = vec![0i16; 480]; // 20ms @ 24kHz
        let output = resample_linear(&input, 24_000, 8_000);
        assert_eq!(output.len(), 160); // 20ms @ 8kHz
    }

    #[test]
    fn constant_signal_stays_constant() {
        let input = vec![1000i16; 100];
        let output = resample_linear(&input, 8_000, 16_000);
        assert!(output.iter().all(|&s| s == 1000));
    }
}
