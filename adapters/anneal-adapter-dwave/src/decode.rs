//! Decoding of packed SAPI answers.
//!
//! `solutions` is base64 of all samples back to back. Each sample takes
//! `ceil(n / 8)` bytes for `n` active variables; bits are read MSB first
//! and the trailing pad bits of every sample are dropped.
//!
//! ```text
//! active_variables = [0, 1, 2, 4, 5]        n = 5, padded width = 8
//! byte 0b1011_0000 → sample 0 = 1 0 1 1 0   (000 dropped)
//! ```

use anneal_hal::{AnnealBuffer, HalError, HalResult, Sample};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::api::Answer;

/// Bytes one sample occupies for `active_count` variables.
pub fn bytes_per_sample(active_count: usize) -> usize {
    active_count.div_ceil(8)
}

/// Expand bytes into bits, MSB first.
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// Decode a completed answer into a buffer for `solver`.
///
/// Fails without producing partial output when the arrays disagree in
/// length, the bitstream is short or long, or an occurrence count is not
/// positive.
pub fn decode_answer(answer: &Answer, solver: &str) -> HalResult<AnnealBuffer> {
    let sample_count = answer.energies.len();
    if answer.num_occurrences.len() != sample_count {
        return Err(HalError::Decode(format!(
            "{} energies but {} occurrence counts",
            sample_count,
            answer.num_occurrences.len()
        )));
    }

    let bytes = BASE64
        .decode(answer.solutions.trim())
        .map_err(|e| HalError::Decode(format!("invalid base64 in solutions: {e}")))?;

    let active_count = answer.active_variables.len();
    let width = bytes_per_sample(active_count);
    let expected = width * sample_count;
    if bytes.len() < expected {
        return Err(HalError::Decode(format!(
            "truncated solutions: {} samples of {} bits need {} bytes, got {}",
            sample_count,
            active_count,
            expected,
            bytes.len()
        )));
    }
    if bytes.len() > expected {
        return Err(HalError::Decode(format!(
            "solutions carry {} bytes beyond {} samples",
            bytes.len() - expected,
            sample_count
        )));
    }

    let mut buffer = AnnealBuffer::new(solver, answer.active_variables.clone());
    for i in 0..sample_count {
        let occurrences = u32::try_from(answer.num_occurrences[i])
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                HalError::Decode(format!(
                    "sample {i} has occurrence count {}",
                    answer.num_occurrences[i]
                ))
            })?;
        let mut bits = unpack_bits(&bytes[i * width..(i + 1) * width]);
        bits.truncate(active_count);
        buffer.add_sample(Sample::new(bits, answer.energies[i], occurrences));
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn answer(bytes: &[u8], energies: Vec<f64>, occurrences: Vec<i64>, active: Vec<u32>) -> Answer {
        Answer {
            solutions: BASE64.encode(bytes),
            energies,
            num_occurrences: occurrences,
            active_variables: active,
        }
    }

    #[test]
    fn test_two_samples_of_five_bits() {
        let a = answer(
            &[0b1011_0000, 0b0100_1111],
            vec![-3.0, -1.0],
            vec![7, 3],
            vec![0, 1, 2, 4, 5],
        );
        let buffer = decode_answer(&a, "DW_2000Q_VFYC_1").unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.samples[0].bits, vec![1, 0, 1, 1, 0]);
        assert_eq!(buffer.samples[1].bits, vec![0, 1, 0, 0, 1]);
        assert_eq!(buffer.samples[0].energy, -3.0);
        assert_eq!(buffer.samples[1].occurrences, 3);
        assert_eq!(buffer.active_variables, vec![0, 1, 2, 4, 5]);
        assert_eq!(buffer.lowest_energy().unwrap().bitstring(), "10110");
    }

    #[test]
    fn test_multi_byte_samples() {
        let a = answer(&[0xFF, 0b1000_0000], vec![0.0], vec![1], (0..9).collect());
        let buffer = decode_answer(&a, "s").unwrap();
        assert_eq!(buffer.samples[0].bits, vec![1; 9]);
    }

    #[test]
    fn test_truncated() {
        let a = answer(&[0xFF], vec![0.0, 1.0], vec![1, 1], vec![0, 1, 2]);
        assert!(matches!(decode_answer(&a, "s"), Err(HalError::Decode(msg)) if msg.contains("truncated")));
    }

    #[test]
    fn test_surplus_bytes() {
        let a = answer(&[0xFF, 0x00], vec![0.0], vec![1], vec![0, 1, 2]);
        assert!(decode_answer(&a, "s").is_err());
    }

    #[test]
    fn test_mismatched_arrays() {
        let a = answer(&[0xFF], vec![0.0], vec![1, 2], vec![0]);
        assert!(decode_answer(&a, "s").is_err());
    }

    #[test]
    fn test_non_positive_occurrences() {
        let a = answer(&[0x80], vec![0.0], vec![0], vec![0]);
        assert!(decode_answer(&a, "s").is_err());
        let a = answer(&[0x80], vec![0.0], vec![-2], vec![0]);
        assert!(decode_answer(&a, "s").is_err());
    }

    #[test]
    fn test_bad_base64() {
        let a = Answer {
            solutions: "not base64!".into(),
            energies: vec![],
            num_occurrences: vec![],
            active_variables: vec![],
        };
        assert!(matches!(decode_answer(&a, "s"), Err(HalError::Decode(_))));
    }

    #[test]
    fn test_empty_answer() {
        let a = answer(&[], vec![], vec![], vec![0, 1]);
        assert!(decode_answer(&a, "s").unwrap().is_empty());
    }

    proptest! {
        /// Packing samples MSB first with zero padding decodes back to the same bits.
        #[test]
        fn test_decode_recovers_packed_samples(
            active in 1usize..40,
            samples in prop::collection::vec(prop::collection::vec(0u8..2, 40), 1..8),
        ) {
            let width = bytes_per_sample(active);
            let mut bytes = vec![0u8; width * samples.len()];
            for (s, bits) in samples.iter().enumerate() {
                for (i, &bit) in bits[..active].iter().enumerate() {
                    bytes[s * width + i / 8] |= bit << (7 - i % 8);
                }
            }

            let a = answer(
                &bytes,
                (0..samples.len()).map(|i| i as f64).collect(),
                vec![1; samples.len()],
                (0..active as u32).collect(),
            );
            let buffer = decode_answer(&a, "s").unwrap();
            prop_assert_eq!(buffer.len(), samples.len());
            for (sample, bits) in buffer.samples.iter().zip(&samples) {
                prop_assert_eq!(&sample.bits[..], &bits[..active]);
            }
        }
    }
}
