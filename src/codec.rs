//! Fixed-width integer packing shared by both broadcast channels.
//!
//! Fields are packed most significant first: the first value in `widths`
//! occupies the highest bits of the message.

use crate::error::EncodingError;

/// Widest single field. Values are `i64`, so a 64th bit would turn negative.
pub const MAX_FIELD_WIDTH: u32 = 63;

/// Packs `values` into a single integer. Every value must be non-negative and
/// fit in its width; nothing is ever silently truncated on encode.
pub fn encode(values: &[i64], widths: &[u32]) -> Result<u64, EncodingError> {
    if values.len() != widths.len() {
        return Err(EncodingError::LengthMismatch {
            values: values.len(),
            widths: widths.len(),
        });
    }

    if let Some((index, width)) = widths.iter().enumerate().find(|(_, w)| **w > MAX_FIELD_WIDTH) {
        return Err(EncodingError::FieldTooWide { index, width: *width });
    }

    let total: u32 = widths.iter().sum();

    if total > 64 {
        return Err(EncodingError::TooWide { total });
    }

    let mut message: u64 = 0;

    for (index, (value, width)) in values.iter().zip(widths.iter()).enumerate() {
        let (value, width) = (*value, *width);

        if value < 0 {
            return Err(EncodingError::Negative { index, value });
        }

        if (value as u64) > max_value(width) {
            return Err(EncodingError::Overflow { index, value, width });
        }

        message = shift_left(message, width) | value as u64;
    }

    Ok(message)
}

/// Unpacks `message` into one value per width, in the same order as
/// `widths`. Bits above the summed width are discarded without error, as are
/// the bits of a field above `MAX_FIELD_WIDTH`.
pub fn decode(message: u64, widths: &[u32]) -> Vec<i64> {
    let mut remaining = message;
    let mut values = vec![0i64; widths.len()];

    for (slot, width) in values.iter_mut().zip(widths.iter()).rev() {
        *slot = (remaining & max_value((*width).min(MAX_FIELD_WIDTH))) as i64;
        remaining = shift_right(remaining, *width);
    }

    values
}

fn max_value(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn shift_left(value: u64, width: u32) -> u64 {
    value.checked_shl(width).unwrap_or(0)
}

fn shift_right(value: u64, width: u32) -> u64 {
    value.checked_shr(width).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn packs_most_significant_first() {
        assert_eq!(encode(&[1, 0, 3], &[1, 2, 2]), Ok(0b1_00_11));
        assert_eq!(decode(0b1_00_11, &[1, 2, 2]), vec![1, 0, 3]);
    }

    #[test]
    fn rejects_values_that_do_not_fit() {
        assert_eq!(
            encode(&[3], &[1]),
            Err(EncodingError::Overflow { index: 0, value: 3, width: 1 })
        );
        assert_eq!(encode(&[-1], &[4]), Err(EncodingError::Negative { index: 0, value: -1 }));
        assert_eq!(
            encode(&[1, 2], &[4]),
            Err(EncodingError::LengthMismatch { values: 2, widths: 1 })
        );
        assert_eq!(encode(&[0, 0], &[40, 40]), Err(EncodingError::TooWide { total: 80 }));
    }

    #[test]
    fn decode_drops_bits_beyond_layout() {
        // Top bit is outside the 4-bit layout.
        assert_eq!(decode(0b1_01_10, &[2, 2]), vec![1, 2]);
    }

    #[test]
    fn fields_stay_non_negative() {
        assert_eq!(encode(&[0], &[64]), Err(EncodingError::FieldTooWide { index: 0, width: 64 }));
        assert_eq!(encode(&[i64::MAX], &[63]), Ok(i64::MAX as u64));
        assert_eq!(decode(u64::MAX, &[64]), vec![i64::MAX]);
        assert_eq!(decode(u64::MAX, &[63]), vec![i64::MAX]);
    }

    #[test]
    fn zero_width_fields_round_trip() {
        assert_eq!(encode(&[0, 5], &[0, 3]), Ok(5));
        assert_eq!(decode(5, &[0, 3]), vec![0, 5]);
    }

    fn layout() -> impl Strategy<Value = (Vec<i64>, Vec<u32>)> {
        prop::collection::vec(1u32..=16, 1..=4).prop_flat_map(|widths| {
            let values = widths
                .iter()
                .map(|w| (0i64..(1i64 << w)).boxed())
                .collect::<Vec<_>>();

            (values, Just(widths))
        })
    }

    proptest! {
        #[test]
        fn round_trips_within_width_bounds((values, widths) in layout()) {
            let message = encode(&values, &widths).unwrap();

            prop_assert_eq!(decode(message, &widths), values);
        }
    }
}
