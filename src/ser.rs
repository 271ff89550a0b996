//! Binary encoding of [`StarkProof`].
//!
//! Layout, in order: `ev_root`, `ev_proof`, component count (1 byte),
//! `lc_root`, `lc_proof`, each component as `column_root`, `column_proof`,
//! `poly_proof`, and finally the remainder array. Digests are written raw.
//! An array is `len - 1` (1 byte) followed by its elements, a matrix is its
//! column count (1 byte, 256 written as 0) followed by every column as a
//! length byte and its digests, and a Merkle proof is an array of values, a
//! matrix of nodes and a depth byte.
//!
//! The encoded length always equals [`crate::sizeof::size_of`].

use crate::error::{Result, StarkError};
use crate::hash::{DIGEST_SIZE, Digest};
use crate::merkle::BatchMerkleProof;
use crate::proof::{FriComponent, LowDegreeProof, StarkProof};
use crate::sizeof::{MAX_MATRIX_COLUMN_LENGTH, size_of};

/// Encodes `proof`. Shape bounds are checked before anything is written.
pub fn serialize_proof(proof: &StarkProof) -> Result<Vec<u8>> {
    let size = size_of(proof, DIGEST_SIZE)?;
    let component_count = u8::try_from(proof.ld_proof.components.len()).map_err(|_| {
        StarkError::MalformedProof(format!(
            "{} FRI components cannot be encoded",
            proof.ld_proof.components.len()
        ))
    })?;

    let mut out = Vec::with_capacity(size.total);
    out.extend_from_slice(&proof.ev_root);
    write_merkle_proof(&mut out, &proof.ev_proof)?;
    out.push(component_count);
    out.extend_from_slice(&proof.lc_root);
    write_merkle_proof(&mut out, &proof.lc_proof)?;
    for component in &proof.ld_proof.components {
        out.extend_from_slice(&component.column_root);
        write_merkle_proof(&mut out, &component.column_proof)?;
        write_merkle_proof(&mut out, &component.poly_proof)?;
    }
    write_array(&mut out, &proof.ld_proof.remainder);

    debug_assert_eq!(out.len(), size.total);
    Ok(out)
}

/// Decodes a proof whose trace leaves are `ev_value_size` bytes and whose
/// other values are `value_size` bytes. Trailing bytes are rejected.
pub fn parse_proof(bytes: &[u8], ev_value_size: usize, value_size: usize) -> Result<StarkProof> {
    let mut reader = ByteReader::new(bytes);

    let ev_root = reader.read_digest("ev_root")?;
    let ev_proof = reader.read_merkle_proof(ev_value_size, "ev_proof")?;
    let component_count = reader.read_u8("component count")? as usize;
    let lc_root = reader.read_digest("lc_root")?;
    let lc_proof = reader.read_merkle_proof(value_size, "lc_proof")?;

    let mut components = Vec::with_capacity(component_count);
    for _ in 0..component_count {
        components.push(FriComponent {
            column_root: reader.read_digest("column_root")?,
            column_proof: reader.read_merkle_proof(value_size, "column_proof")?,
            poly_proof: reader.read_merkle_proof(value_size, "poly_proof")?,
        });
    }
    let remainder = reader.read_array(value_size, "remainder")?;

    if reader.remaining() != 0 {
        return Err(StarkError::MalformedProof(format!(
            "{} unexpected trailing bytes",
            reader.remaining()
        )));
    }

    Ok(StarkProof {
        ev_root,
        ev_proof,
        lc_root,
        lc_proof,
        ld_proof: LowDegreeProof {
            components,
            remainder,
        },
    })
}

fn write_array(out: &mut Vec<u8>, values: &[Vec<u8>]) {
    // length bounds are enforced by size_of
    out.push((values.len() - 1) as u8);
    for value in values {
        out.extend_from_slice(value);
    }
}

fn write_matrix(out: &mut Vec<u8>, columns: &[Vec<Digest>]) {
    out.push(columns.len() as u8);
    for column in columns {
        out.push(column.len() as u8);
        for node in column {
            out.extend_from_slice(node);
        }
    }
}

fn write_merkle_proof(out: &mut Vec<u8>, proof: &BatchMerkleProof) -> Result<()> {
    if proof.nodes.len() != proof.values.len() {
        return Err(StarkError::MalformedProof(
            "Merkle proof must carry one node column per value".into(),
        ));
    }
    write_array(out, &proof.values);
    write_matrix(out, &proof.nodes);
    out.push(proof.depth);
    Ok(())
}

/// Cursor over an encoded proof.
#[derive(Debug, Clone, Copy)]
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn read_exact(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(StarkError::MalformedProof(format!(
                "unexpected end of input while reading {field} at offset {}",
                self.offset
            )));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..start + len])
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.read_exact(1, field)?[0])
    }

    fn read_digest(&mut self, field: &'static str) -> Result<Digest> {
        let bytes = self.read_exact(DIGEST_SIZE, field)?;
        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(bytes);
        Ok(digest)
    }

    fn read_array(&mut self, value_size: usize, field: &'static str) -> Result<Vec<Vec<u8>>> {
        let len = self.read_u8(field)? as usize + 1;
        (0..len)
            .map(|_| self.read_exact(value_size, field).map(<[u8]>::to_vec))
            .collect()
    }

    fn read_matrix(&mut self, field: &'static str) -> Result<Vec<Vec<Digest>>> {
        let count = match self.read_u8(field)? {
            0 => 256,
            n => n as usize,
        };
        let mut columns = Vec::with_capacity(count);
        for _ in 0..count {
            let len = self.read_u8(field)? as usize;
            if len >= MAX_MATRIX_COLUMN_LENGTH {
                return Err(StarkError::MalformedProof(format!(
                    "{field} column length {len} is out of range"
                )));
            }
            let column = (0..len)
                .map(|_| self.read_digest(field))
                .collect::<Result<Vec<_>>>()?;
            columns.push(column);
        }
        Ok(columns)
    }

    fn read_merkle_proof(
        &mut self,
        value_size: usize,
        field: &'static str,
    ) -> Result<BatchMerkleProof> {
        let values = self.read_array(value_size, field)?;
        let nodes = self.read_matrix(field)?;
        let depth = self.read_u8(field)?;
        Ok(BatchMerkleProof {
            values,
            nodes,
            depth,
        })
    }
}
