pub mod csv;
pub mod detect;
pub mod fasta;

pub use fasta::{read_fasta, read_fasta_limited, read_fasta_sequences};
