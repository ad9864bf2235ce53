/// Input guard for the embedding pipeline.
///
/// Every nucleotide letter is also a valid amino-acid code, so a DNA file
/// passes protein validation and silently embeds garbage. A sequence made
/// up entirely of nucleotide codes is almost certainly not a protein.
const NUCLEOTIDE: &[u8] = b"ACGTUNacgtun";

pub fn looks_like_nucleotide(seq: &[u8]) -> bool {
    !seq.is_empty() && seq.iter().all(|b| NUCLEOTIDE.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dna_and_rna_flagged() {
        assert!(looks_like_nucleotide(b"ACGTACGT"));
        assert!(looks_like_nucleotide(b"acgu"));
        assert!(looks_like_nucleotide(b"ACGTN"));
    }

    #[test]
    fn proteins_pass() {
        assert!(!looks_like_nucleotide(b"MFVFLVLLPLVSS"));
        // A single non-nucleotide residue is enough
        assert!(!looks_like_nucleotide(b"ACGTM"));
    }

    #[test]
    fn empty_is_not_flagged() {
        assert!(!looks_like_nucleotide(b""));
    }
}
