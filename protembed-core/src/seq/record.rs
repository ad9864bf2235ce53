use crate::seq::protein::ProteinSeq;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: Box<str>,
    pub desc: Option<Box<str>>,
    pub seq: ProteinSeq,
}

impl FastaRecord {
    pub fn new(id: impl Into<Box<str>>, seq: ProteinSeq) -> Self {
        Self {
            id: id.into(),
            desc: None,
            seq,
        }
    }

    pub fn with_desc(mut self, desc: impl Into<Box<str>>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn seq(&self) -> &ProteinSeq {
        &self.seq
    }

    pub fn into_seq(self) -> ProteinSeq {
        self.seq
    }
}
