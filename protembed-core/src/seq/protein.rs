use crate::alphabets::protein;
use crate::error::{ProtError, ProtResult};
use std::sync::LazyLock;

/// Validated amino-acid sequence, stored uppercase.
///
/// Construction accepts the full IUPAC protein alphabet (including the
/// ambiguity codes B, J, Z, the rare residues O and U, the wildcard X and
/// the stop marker `*`). Residues outside the 20 canonical amino acids can
/// be masked to `X` before handing the sequence to an encoder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProteinSeq {
    bytes: Vec<u8>,
}

impl ProteinSeq {
    pub fn new(mut bytes: Vec<u8>) -> ProtResult<Self> {
        let alphabet = protein::iupac_alphabet();
        for (pos, &b) in bytes.iter().enumerate() {
            if !alphabet.contains(b) {
                return Err(ProtError::InvalidResidue { ch: b as char, pos });
            }
        }
        bytes.make_ascii_uppercase();
        Ok(Self { bytes })
    }

    #[inline]
    pub(crate) fn from_bytes_unchecked(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str(&self) -> &str {
        // Validated at construction: ASCII letters and '*' only.
        std::str::from_utf8(&self.bytes).expect("protein bytes are ascii")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if any residue falls outside the 20 canonical amino acids.
    pub fn has_nonstandard(&self) -> bool {
        self.bytes.iter().any(|&b| AA20_INDEX[b as usize] < 0)
    }

    pub fn nonstandard_positions(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (i, &b) in self.bytes.iter().enumerate() {
            if AA20_INDEX[b as usize] < 0 {
                out.push(i);
            }
        }
        out
    }

    pub fn validate_strict_20(&self) -> ProtResult<()> {
        for (pos, &b) in self.bytes.iter().enumerate() {
            if AA20_INDEX[b as usize] < 0 {
                return Err(ProtError::InvalidResidue { ch: b as char, pos });
            }
        }
        Ok(())
    }

    /// Copy with every non-canonical residue replaced by `X`, the
    /// substitution protein language models are trained to expect.
    pub fn masked(&self) -> Self {
        let bytes = self
            .bytes
            .iter()
            .map(|&b| if AA20_INDEX[b as usize] < 0 { b'X' } else { b })
            .collect();
        Self::from_bytes_unchecked(bytes)
    }

    /// Residues joined by single spaces (`"M K T A"`), the input format
    /// pretrained protein tokenizers split on.
    pub fn spaced(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len().saturating_mul(2));
        for (i, &b) in self.bytes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push(b as char);
        }
        out
    }
}

static AA20_INDEX: LazyLock<[i8; 256]> = LazyLock::new(|| {
    let mut map = [-1i8; 256];
    for (idx, &b) in AA20.iter().enumerate() {
        map[b as usize] = idx as i8;
        let lower = b.to_ascii_lowercase();
        map[lower as usize] = idx as i8;
    }
    map
});

const AA20: [u8; 20] = *b"ARNDCEQGHILKMFPSTWYV";
