//! Grouping of flat bit assignments into named multi-bit fields.
//!
//! Consecutive input bits form one field; the first bit of a field is its
//! most significant bit. Values are rendered as lowercase hexadecimal without
//! leading zeros (`"0"` for zero).

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{BddError, Result};
use crate::sample::Assignment;
use crate::types::Var;

/// A named field of `width` consecutive bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub width: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// The value of one field in one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedField {
    pub name: String,
    pub value: BigUint,
}

impl EncodedField {
    /// Big-endian lowercase hex without leading zeros.
    pub fn to_hex(&self) -> String {
        self.value.to_str_radix(16)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentEncoder {
    fields: Vec<Field>,
}

impl AssignmentEncoder {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Fields named `v0`, `v1`, ... with the given widths.
    pub fn from_widths(widths: &[usize]) -> Self {
        Self::new(
            widths
                .iter()
                .enumerate()
                .map(|(i, &w)| Field::new(format!("v{}", i), w))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn total_width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Splits `bits` into the declared fields.
    ///
    /// Bits beyond `total_width()` are ignored. Fails with
    /// [`BddError::LayoutMismatch`] if there are fewer.
    pub fn encode(&self, bits: &[bool]) -> Result<Vec<EncodedField>> {
        let expected = self.total_width();
        if bits.len() < expected {
            return Err(BddError::LayoutMismatch {
                expected,
                actual: bits.len(),
            });
        }

        let mut offset = 0;
        let mut result = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let mut value = BigUint::zero();
            for &bit in &bits[offset..offset + field.width] {
                value <<= 1;
                if bit {
                    value += 1u32;
                }
            }
            offset += field.width;
            result.push(EncodedField {
                name: field.name.clone(),
                value,
            });
        }
        Ok(result)
    }

    /// Encodes the values of `inputs` (in order) taken from `assignment`.
    pub fn encode_assignment(&self, assignment: &Assignment, inputs: &[Var]) -> Result<Vec<EncodedField>> {
        self.encode(&assignment.bits(inputs))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn hex(fields: &[EncodedField]) -> Vec<String> {
        fields.iter().map(|f| f.to_hex()).collect()
    }

    #[test]
    fn test_msb_first() {
        let encoder = AssignmentEncoder::from_widths(&[4, 3]);
        let bits = [true, false, true, true, false, false, true];

        let fields = encoder.encode(&bits).unwrap();
        assert_eq!(fields[0].name, "v0");
        assert_eq!(fields[0].value, BigUint::from(0b1011u32));
        assert_eq!(fields[1].value, BigUint::from(0b001u32));
        assert_eq!(hex(&fields), vec!["b", "1"]);
    }

    #[test]
    fn test_leading_zeros_stripped() {
        let encoder = AssignmentEncoder::from_widths(&[12, 8]);
        let mut bits = vec![false; 20];
        bits[11] = true; // lowest bit of the first field

        let fields = encoder.encode(&bits).unwrap();
        assert_eq!(hex(&fields), vec!["1", "0"]);
    }

    #[test]
    fn test_partial_nibble_is_numeric() {
        let encoder = AssignmentEncoder::from_widths(&[3, 5]);
        let bits = [false, false, true, true, false, false, false, true];

        let fields = encoder.encode(&bits).unwrap();
        assert_eq!(fields[0].value, BigUint::from(1u32));
        assert_eq!(hex(&fields), vec!["1", "11"]);
    }

    #[test]
    fn test_wide_field() {
        let encoder = AssignmentEncoder::new(vec![Field::new("wide", 100)]);
        let bits = vec![true; 100];

        let fields = encoder.encode(&bits).unwrap();
        assert_eq!(fields[0].to_hex(), format!("f{}", "f".repeat(24)));
        assert_eq!(encoder.total_width(), 100);
    }

    #[test]
    fn test_layout_mismatch() {
        let encoder = AssignmentEncoder::from_widths(&[4, 4]);

        assert_eq!(
            encoder.encode(&[true; 5]),
            Err(BddError::LayoutMismatch { expected: 8, actual: 5 })
        );
        // Surplus bits are ignored.
        assert_eq!(encoder.encode(&[true; 9]).unwrap().len(), 2);
    }
}
