//! Byte encoding of field elements for commitments and proofs.

use ark_ff::{BigInteger, PrimeField};

use crate::error::{Result, StarkError};

/// Number of bytes in the canonical encoding of an element of `F`.
pub fn element_size<F: PrimeField>() -> usize {
    F::zero().into_bigint().to_bytes_be().len()
}

pub fn encode_element<F: PrimeField>(value: &F) -> Vec<u8> {
    value.into_bigint().to_bytes_be()
}

pub fn encode_elements<F: PrimeField>(values: &[F]) -> Vec<Vec<u8>> {
    values.iter().map(encode_element).collect()
}

/// Decodes a canonical big-endian encoding, rejecting wrong lengths and
/// values at or above the modulus.
pub fn decode_element<F: PrimeField>(bytes: &[u8]) -> Result<F> {
    if bytes.len() != element_size::<F>() {
        return Err(StarkError::InvalidElement("unexpected byte length"));
    }
    let value = F::from_be_bytes_mod_order(bytes);
    if value.into_bigint().to_bytes_be() != bytes {
        return Err(StarkError::InvalidElement("value is not reduced"));
    }
    Ok(value)
}

pub fn decode_elements<F: PrimeField>(encoded: &[Vec<u8>]) -> Result<Vec<F>> {
    encoded.iter().map(|bytes| decode_element(bytes)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn element_round_trip() {
        assert_eq!(element_size::<Fr>(), 32);
        let value = Fr::from(123456789u64);
        let bytes = encode_element(&value);
        assert_eq!(bytes.len(), 32);
        assert_eq!(decode_element::<Fr>(&bytes).unwrap(), value);
    }

    #[test]
    fn rejects_non_canonical_bytes() {
        assert!(decode_element::<Fr>(&[0xff; 32]).is_err());
        assert!(decode_element::<Fr>(&[0u8; 31]).is_err());
    }
}
