// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shannon entropy of byte sequences.
//!
//! Observational signal only: a well-behaved cipher produces output close to
//! 8 bits/byte, text plaintext sits around 4-5.

/// Upper bound of byte entropy in bits.
pub const MAX_BITS_PER_BYTE: f64 = 8.0;

/// Shannon entropy of `data` in bits per byte, `0.0` for empty input.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut histogram = [0u64; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let entropy: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum();

    // Float accumulation can land a hair outside the closed interval.
    entropy.clamp(0.0, MAX_BITS_PER_BYTE)
}
