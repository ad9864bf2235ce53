pub mod batch;
pub mod protein;
pub mod record;

pub use batch::RecordBatch;
pub use protein::ProteinSeq;
pub use record::FastaRecord;
