pub mod encoder;
pub mod tokenizer;

pub use encoder::SeqEncoder;
pub use tokenizer::{SeqTokenizer, TokenBatch};

use crate::error::{ProtError, ProtResult};
use crate::io::detect::looks_like_nucleotide;
use crate::seq::batch::RecordBatch;
use ndarray::{s, Array2, Array3, ArrayView2};
use std::path::PathBuf;

/// Where to find the pretrained artifacts and how to prepare sequences
/// before tokenization.
#[derive(Clone, Debug)]
pub struct EmbedderConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Replace non-canonical residues with `X` before tokenizing.
    pub mask_nonstandard: bool,
    /// Join residues with spaces, the form protein tokenizers split on.
    pub space_residues: bool,
    /// Tokens the tokenizer appends after the residues (1 for T5-style
    /// encoders: a single `</s>`). Used to trim per-residue views.
    pub trailing_special_tokens: usize,
}

impl EmbedderConfig {
    pub fn new(model_path: impl Into<PathBuf>, tokenizer_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            tokenizer_path: tokenizer_path.into(),
            mask_nonstandard: true,
            space_residues: true,
            trailing_special_tokens: 1,
        }
    }
}

/// Tokenizer + encoder pipeline producing per-residue embeddings for a
/// batch of protein records.
pub struct Embedder {
    tokenizer: SeqTokenizer,
    encoder: SeqEncoder,
    mask_nonstandard: bool,
    space_residues: bool,
    trailing_special_tokens: usize,
}

impl Embedder {
    pub fn open(config: EmbedderConfig) -> ProtResult<Self> {
        let tokenizer = SeqTokenizer::from_file(&config.tokenizer_path)?;
        let encoder = SeqEncoder::from_file(&config.model_path)?;
        Ok(Self {
            tokenizer,
            encoder,
            mask_nonstandard: config.mask_nonstandard,
            space_residues: config.space_residues,
            trailing_special_tokens: config.trailing_special_tokens,
        })
    }

    /// Embed every record of the batch in one encoder pass.
    ///
    /// Row order of the result matches record order of the input.
    pub fn embed_batch(&mut self, batch: &RecordBatch) -> ProtResult<EmbeddingBatch> {
        if batch.is_empty() {
            return Err(ProtError::EmptyBatch);
        }

        for (id, seq) in batch.ids().iter().zip(batch.seqs()) {
            if looks_like_nucleotide(seq.as_bytes()) {
                tracing::warn!(id = %id, "sequence looks like nucleotide data, embedding anyway");
            }
        }

        let prepared = prepare_inputs(batch, self.mask_nonstandard, self.space_residues);
        let tokens = self.tokenizer.encode_batch(&prepared)?;
        tracing::debug!(
            sequences = tokens.n_sequences(),
            padded_len = tokens.seq_len(),
            "running encoder"
        );
        let hidden = self.encoder.encode(&tokens)?;

        Ok(EmbeddingBatch {
            ids: batch.ids().to_vec(),
            hidden,
            tokens,
            trailing_special_tokens: self.trailing_special_tokens,
        })
    }
}

fn prepare_inputs(batch: &RecordBatch, mask: bool, space: bool) -> Vec<String> {
    let masked;
    let batch = if mask {
        masked = batch.masked();
        &masked
    } else {
        batch
    };
    if space {
        batch.spaced()
    } else {
        batch.strings()
    }
}

/// Final hidden state for a batch, `[batch, tokens, hidden]`, plus the
/// token matrices it was produced from.
pub struct EmbeddingBatch {
    ids: Vec<Box<str>>,
    hidden: Array3<f32>,
    tokens: TokenBatch,
    trailing_special_tokens: usize,
}

impl EmbeddingBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[Box<str>] {
        &self.ids
    }

    /// Raw final hidden state, padding positions included.
    pub fn hidden(&self) -> &Array3<f32> {
        &self.hidden
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden.shape()[2]
    }

    /// Number of residue positions for sequence `i`, with padding and
    /// trailing special tokens excluded.
    pub fn residue_count(&self, i: usize) -> usize {
        self.tokens
            .token_count(i)
            .saturating_sub(self.trailing_special_tokens)
    }

    /// Per-residue embedding rows for sequence `i`.
    pub fn per_residue(&self, i: usize) -> Option<ArrayView2<'_, f32>> {
        if i >= self.len() {
            return None;
        }
        let n = self.residue_count(i);
        Some(self.hidden.slice(s![i, ..n, ..]))
    }

    /// Mean over residue positions, one vector per sequence.
    pub fn mean_pooled(&self) -> PooledEmbeddings {
        let dim = self.hidden_dim();
        let mut vectors = Array2::<f32>::zeros((self.len(), dim));
        let mut lengths = Vec::with_capacity(self.len());

        for i in 0..self.len() {
            let n = self.residue_count(i);
            lengths.push(n);
            if n == 0 {
                continue;
            }
            let rows = self.hidden.slice(s![i, ..n, ..]);
            let inv = 1.0 / n as f32;
            for (j, col) in rows.axis_iter(ndarray::Axis(1)).enumerate() {
                vectors[[i, j]] = col.sum() * inv;
            }
        }

        PooledEmbeddings {
            ids: self.ids.clone(),
            vectors,
            lengths,
        }
    }
}

/// One vector per sequence, `[batch, hidden]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PooledEmbeddings {
    ids: Vec<Box<str>>,
    vectors: Array2<f32>,
    lengths: Vec<usize>,
}

impl PooledEmbeddings {
    pub fn new(
        ids: Vec<Box<str>>,
        vectors: Array2<f32>,
        lengths: Vec<usize>,
    ) -> ProtResult<Self> {
        if ids.len() != vectors.nrows() || lengths.len() != vectors.nrows() {
            return Err(ProtError::PooledLenMismatch {
                ids: ids.len(),
                lengths: lengths.len(),
                rows: vectors.nrows(),
            });
        }
        Ok(Self {
            ids,
            vectors,
            lengths,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[Box<str>] {
        &self.ids
    }

    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::tokenizer::tests::test_tokenizer;
    use crate::seq::protein::ProteinSeq;
    use crate::seq::record::FastaRecord;
    use ndarray::{array, Array3};

    fn batch() -> RecordBatch {
        RecordBatch::from_records(vec![
            FastaRecord::new("p1", ProteinSeq::new(b"MKV".to_vec()).unwrap()),
            FastaRecord::new("p2", ProteinSeq::new(b"MU".to_vec()).unwrap()),
        ])
    }

    // Tokenize the prepared batch with the in-memory tokenizer and pair it
    // with a synthetic hidden state, exercising everything downstream of
    // the session.
    fn embedding_batch() -> EmbeddingBatch {
        let batch = batch();
        let prepared = prepare_inputs(&batch, true, true);
        assert_eq!(prepared, vec!["M K V".to_string(), "M X".to_string()]);

        let tokens = test_tokenizer().encode_batch(&prepared).unwrap();
        assert_eq!(tokens.n_sequences(), 2);
        assert_eq!(tokens.seq_len(), 4);

        // [2, 4, 2] hidden state with recognizable values
        let hidden = Array3::from_shape_fn((2, 4, 2), |(i, j, k)| {
            (i * 100 + j * 10 + k) as f32
        });

        EmbeddingBatch {
            ids: batch.ids().to_vec(),
            hidden,
            tokens,
            trailing_special_tokens: 1,
        }
    }

    #[test]
    fn prepare_inputs_respects_flags() {
        let batch = batch();
        assert_eq!(
            prepare_inputs(&batch, false, true),
            vec!["M K V".to_string(), "M U".to_string()]
        );
        assert_eq!(
            prepare_inputs(&batch, true, false),
            vec!["MKV".to_string(), "MX".to_string()]
        );
        assert_eq!(
            prepare_inputs(&batch, false, false),
            vec!["MKV".to_string(), "MU".to_string()]
        );
    }

    #[test]
    fn per_residue_trims_padding_and_eos() {
        let emb = embedding_batch();
        assert_eq!(emb.len(), 2);
        assert_eq!(emb.hidden_dim(), 2);

        // p1: 3 residues + </s> -> 3 residue rows
        assert_eq!(emb.residue_count(0), 3);
        let rows = emb.per_residue(0).unwrap();
        assert_eq!(rows.shape(), &[3, 2]);
        assert_eq!(rows[[2, 1]], 21.0);

        // p2: 2 residues + </s> + <pad> -> 2 residue rows
        assert_eq!(emb.residue_count(1), 2);
        let rows = emb.per_residue(1).unwrap();
        assert_eq!(rows.shape(), &[2, 2]);
        assert_eq!(rows[[0, 0]], 100.0);

        assert!(emb.per_residue(2).is_none());
    }

    #[test]
    fn mean_pooling_uses_residue_rows_only() {
        let emb = embedding_batch();
        let pooled = emb.mean_pooled();

        assert_eq!(pooled.len(), 2);
        assert_eq!(pooled.dim(), 2);
        assert_eq!(pooled.lengths(), &[3, 2]);
        assert_eq!(pooled.ids()[0].as_ref(), "p1");

        // p1 rows: [0,1], [10,11], [20,21] -> mean [10, 11]
        // p2 rows: [100,101], [110,111] -> mean [105, 106]
        assert_eq!(pooled.vectors(), &array![[10.0f32, 11.0], [105.0, 106.0]]);
    }

    #[test]
    fn config_defaults() {
        let config = EmbedderConfig::new("encoder.onnx", "tokenizer.json");
        assert!(config.mask_nonstandard);
        assert!(config.space_residues);
        assert_eq!(config.trailing_special_tokens, 1);
    }
}
