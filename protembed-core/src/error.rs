use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtError {
    #[error("invalid residue '{ch}' at position {pos}")]
    InvalidResidue { ch: char, pos: usize },

    #[error("fasta format error at line {line}: {msg}")]
    FastaFormat { msg: &'static str, line: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("record batch length mismatch (ids={ids}, descs={descs}, seqs={seqs})")]
    BatchLenMismatch {
        ids: usize,
        descs: usize,
        seqs: usize,
    },

    #[error("empty batch: nothing to embed")]
    EmptyBatch,

    #[error("pooled embeddings length mismatch (ids={ids}, lengths={lengths}, rows={rows})")]
    PooledLenMismatch {
        ids: usize,
        lengths: usize,
        rows: usize,
    },

    #[error("token batch shape mismatch (ids={ids_shape:?}, mask={mask_shape:?})")]
    TokenShapeMismatch {
        ids_shape: [usize; 2],
        mask_shape: [usize; 2],
    },

    #[error("tokenizer error: {msg}")]
    Tokenizer { msg: String },

    #[error("inference error: {0}")]
    Inference(#[from] ort::Error),

    #[error("unexpected encoder output: {msg}")]
    EncoderOutput { msg: String },

    #[error("csv write error in {path}: {source}")]
    CsvWrite {
        path: String,
        #[source]
        source: csv::Error,
    },
}

pub type ProtResult<T> = Result<T, ProtError>;
