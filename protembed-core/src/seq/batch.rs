use crate::error::{ProtError, ProtResult};
use crate::seq::protein::ProteinSeq;
use crate::seq::record::FastaRecord;

/// Column-oriented batch of protein records, the unit handed to the embedder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordBatch {
    ids: Vec<Box<str>>,
    descs: Vec<Option<Box<str>>>,
    seqs: Vec<ProteinSeq>,
}

impl RecordBatch {
    pub fn new(
        ids: Vec<Box<str>>,
        descs: Vec<Option<Box<str>>>,
        seqs: Vec<ProteinSeq>,
    ) -> ProtResult<Self> {
        if ids.len() != seqs.len() || descs.len() != seqs.len() {
            return Err(ProtError::BatchLenMismatch {
                ids: ids.len(),
                descs: descs.len(),
                seqs: seqs.len(),
            });
        }
        Ok(Self { ids, descs, seqs })
    }

    pub fn from_records(records: Vec<FastaRecord>) -> Self {
        let mut ids = Vec::with_capacity(records.len());
        let mut descs = Vec::with_capacity(records.len());
        let mut seqs = Vec::with_capacity(records.len());

        for record in records {
            ids.push(record.id);
            descs.push(record.desc);
            seqs.push(record.seq);
        }

        Self { ids, descs, seqs }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn ids(&self) -> &[Box<str>] {
        &self.ids
    }

    pub fn descs(&self) -> &[Option<Box<str>>] {
        &self.descs
    }

    pub fn seqs(&self) -> &[ProteinSeq] {
        &self.seqs
    }

    pub fn id(&self, i: usize) -> Option<&str> {
        self.ids.get(i).map(|s| s.as_ref())
    }

    pub fn desc(&self, i: usize) -> Option<Option<&str>> {
        self.descs.get(i).map(|d| d.as_deref())
    }

    pub fn seq(&self, i: usize) -> Option<&ProteinSeq> {
        self.seqs.get(i)
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.seqs.iter().map(|seq| seq.len()).collect()
    }

    /// Batch-wide copy with non-canonical residues masked to `X`.
    pub fn masked(&self) -> Self {
        let seqs = par_map!(&self.seqs, |seq: &ProteinSeq| seq.masked());
        Self {
            ids: self.ids.clone(),
            descs: self.descs.clone(),
            seqs,
        }
    }

    /// Space-separated residue strings for the tokenizer.
    pub fn spaced(&self) -> Vec<String> {
        par_map!(&self.seqs, |seq: &ProteinSeq| seq.spaced())
    }

    /// Raw residue strings, one per record.
    pub fn strings(&self) -> Vec<String> {
        par_map!(&self.seqs, |seq: &ProteinSeq| seq.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> RecordBatch {
        RecordBatch::from_records(vec![
            FastaRecord::new("p1", ProteinSeq::new(b"MKU".to_vec()).unwrap()),
            FastaRecord::new("p2", ProteinSeq::new(b"GA".to_vec()).unwrap())
                .with_desc("second protein"),
        ])
    }

    #[test]
    fn construction_checks_lengths() {
        let err = RecordBatch::new(
            vec!["a".into()],
            vec![None, None],
            vec![ProteinSeq::new(b"M".to_vec()).unwrap()],
        )
        .unwrap_err();
        match err {
            ProtError::BatchLenMismatch { ids, descs, seqs } => {
                assert_eq!((ids, descs, seqs), (1, 2, 1));
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
    }

    #[test]
    fn accessors() {
        let batch = batch();
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
        assert_eq!(batch.id(0), Some("p1"));
        assert_eq!(batch.desc(1), Some(Some("second protein")));
        assert_eq!(batch.desc(0), Some(None));
        assert_eq!(batch.seq(1).unwrap().as_bytes(), b"GA");
        assert_eq!(batch.lengths(), vec![3, 2]);
        assert!(batch.seq(2).is_none());
    }

    #[test]
    fn masked_and_spaced() {
        let batch = batch();
        let masked = batch.masked();
        assert_eq!(masked.seq(0).unwrap().as_bytes(), b"MKX");
        assert_eq!(masked.seq(1).unwrap().as_bytes(), b"GA");
        assert_eq!(masked.ids(), batch.ids());

        assert_eq!(batch.spaced(), vec!["M K U".to_string(), "G A".to_string()]);
        assert_eq!(batch.strings(), vec!["MKU".to_string(), "GA".to_string()]);
    }
}
