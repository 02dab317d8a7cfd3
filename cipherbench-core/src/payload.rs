// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Synthetic text payloads and size labels.

use crate::error::HardValidationError;
use crate::types::Label;

/// Line repeated to fill a generated payload.
pub const FILL_LINE: &str = "This is a sample line of text to fill the file.\n";

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Largest payload that can be generated or named by a size label (1 GiB).
pub const MAX_PAYLOAD_BYTES: u64 = 1024 * MB;

/// The standard payload ladder: `(label, size in bytes)`.
pub const STANDARD_SIZES: [(&str, u64); 7] = [
    ("100KB file", 100 * KB),
    ("500KB file", 500 * KB),
    ("1MB file", MB),
    ("2MB file", 2 * MB),
    ("3MB file", 3 * MB),
    ("4MB file", 4 * MB),
    ("5MB file", 5 * MB),
];

/// Text payload of whole [`FILL_LINE`]s, at least `size_bytes` long.
///
/// `size_bytes` is capped at [`MAX_PAYLOAD_BYTES`].
pub fn generate_text_payload(size_bytes: u64) -> Vec<u8> {
    let line_len = FILL_LINE.len() as u64;
    let lines = size_bytes.min(MAX_PAYLOAD_BYTES).div_ceil(line_len) as usize;
    FILL_LINE.repeat(lines).into_bytes()
}

/// Standard labels paired with freshly generated payloads.
pub fn standard_payloads() -> Vec<(Label, Vec<u8>)> {
    STANDARD_SIZES
        .iter()
        .filter_map(|(label, size)| {
            Label::new(*label)
                .ok()
                .map(|label| (label, generate_text_payload(*size)))
        })
        .collect()
}

/// Parse the size out of a label like `"1MB file"` or `"500KB"`.
///
/// Units are binary (KB = 1024). A bare number is bytes. Sizes above
/// [`MAX_PAYLOAD_BYTES`] are rejected.
pub fn parse_size_label(label: &str) -> Result<u64, HardValidationError> {
    let invalid = |reason: &str| HardValidationError::InvalidFieldValue {
        field: "label",
        value: label.to_string(),
        reason: reason.to_string(),
    };

    let token = label
        .split_whitespace()
        .next()
        .ok_or_else(|| invalid("Label is blank"))?
        .to_ascii_uppercase();

    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, unit) = token.split_at(digits_end);

    let value: u64 = digits
        .parse()
        .map_err(|_| invalid("Label must start with a number"))?;

    let multiplier = match unit {
        "" | "B" => 1,
        "KB" | "K" => KB,
        "MB" | "M" => MB,
        "GB" | "G" => 1024 * MB,
        _ => return Err(invalid("Unknown size unit")),
    };

    match value.checked_mul(multiplier) {
        Some(size) if size <= MAX_PAYLOAD_BYTES => Ok(size),
        _ => Err(invalid("Size exceeds the 1GB payload limit")),
    }
}
