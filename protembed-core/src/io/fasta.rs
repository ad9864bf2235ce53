use crate::error::{ProtError, ProtResult};
use crate::seq::protein::ProteinSeq;
use crate::seq::record::FastaRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Streaming FASTA reader yielding one protein record per `>` header.
///
/// Sequence lines between headers are concatenated with all ASCII whitespace
/// stripped. Blank lines are skipped. Sequence data before the first header
/// is a format error.
pub struct FastaRecords<R> {
    reader: R,
    line_no: usize,
    pending_header: Option<(String, usize)>,
    buf_line: String,
    seq_buf: Vec<u8>,
}

impl<R: BufRead> FastaRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            pending_header: None,
            buf_line: String::new(),
            seq_buf: Vec::new(),
        }
    }

    fn next_header(&mut self) -> Option<ProtResult<(String, usize)>> {
        if let Some(pending) = self.pending_header.take() {
            return Some(Ok(pending));
        }

        loop {
            self.buf_line.clear();
            match self.reader.read_line(&mut self.buf_line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let line_no = self.line_no;
                    if self.buf_line.starts_with('>') {
                        return Some(Ok((self.buf_line.clone(), line_no)));
                    }
                    if self.buf_line.trim().is_empty() {
                        continue;
                    }
                    return Some(Err(ProtError::FastaFormat {
                        msg: "expected header line starting with '>'",
                        line: line_no,
                    }));
                }
                Err(err) => return Some(Err(ProtError::Io(err))),
            }
        }
    }
}

impl<R: BufRead> Iterator for FastaRecords<R> {
    type Item = ProtResult<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let (header_line, header_line_no) = match self.next_header()? {
            Ok(header) => header,
            Err(err) => return Some(Err(err)),
        };

        let (id, desc) = match parse_header(&header_line, header_line_no) {
            Ok(parsed) => parsed,
            Err(err) => return Some(Err(err)),
        };

        self.seq_buf.clear();

        loop {
            self.buf_line.clear();
            match self.reader.read_line(&mut self.buf_line) {
                Ok(0) => break,
                Ok(_) => {
                    self.line_no += 1;
                    let line_no = self.line_no;
                    if self.buf_line.starts_with('>') {
                        self.pending_header = Some((self.buf_line.clone(), line_no));
                        break;
                    }
                    for b in self.buf_line.bytes() {
                        if !b.is_ascii_whitespace() {
                            self.seq_buf.push(b);
                        }
                    }
                }
                Err(err) => return Some(Err(ProtError::Io(err))),
            }
        }

        let capacity = self.seq_buf.capacity();
        let bytes = std::mem::take(&mut self.seq_buf);
        let seq = match ProteinSeq::new(bytes) {
            Ok(seq) => seq,
            Err(err) => return Some(Err(err)),
        };
        self.seq_buf = Vec::with_capacity(capacity);

        Some(Ok(FastaRecord { id, desc, seq }))
    }
}

pub fn records_from_reader<R: BufRead>(reader: R) -> FastaRecords<R> {
    FastaRecords::new(reader)
}

pub fn read_fasta_from_reader<R: BufRead>(reader: R) -> ProtResult<Vec<FastaRecord>> {
    let mut out = Vec::new();
    for record in records_from_reader(reader) {
        out.push(record?);
    }
    Ok(out)
}

pub fn read_fasta(path: impl AsRef<Path>) -> ProtResult<Vec<FastaRecord>> {
    let file = File::open(path)?;
    read_fasta_from_reader(BufReader::new(file))
}

pub fn read_fasta_from_bytes(data: &[u8]) -> ProtResult<Vec<FastaRecord>> {
    read_fasta_from_reader(BufReader::new(Cursor::new(data)))
}

/// Bounded read: collect at most `max_records` records, then stop consuming
/// the file. `max_records == 0` returns an empty list.
pub fn read_fasta_limited(
    path: impl AsRef<Path>,
    max_records: usize,
) -> ProtResult<Vec<FastaRecord>> {
    let file = File::open(path)?;
    read_fasta_limited_from_reader(BufReader::new(file), max_records)
}

pub fn read_fasta_limited_from_reader<R: BufRead>(
    reader: R,
    max_records: usize,
) -> ProtResult<Vec<FastaRecord>> {
    let mut out = Vec::with_capacity(max_records.min(1024));
    for record in records_from_reader(reader).take(max_records) {
        out.push(record?);
    }
    Ok(out)
}

/// Bounded read returning sequence strings only, in file order.
pub fn read_fasta_sequences(
    path: impl AsRef<Path>,
    max_records: usize,
) -> ProtResult<Vec<String>> {
    let records = read_fasta_limited(path, max_records)?;
    Ok(records
        .into_iter()
        .map(|record| record.into_seq().as_str().to_string())
        .collect())
}

fn parse_header(header_line: &str, line_no: usize) -> ProtResult<(Box<str>, Option<Box<str>>)> {
    let header = header_line.strip_prefix('>').ok_or(ProtError::FastaFormat {
        msg: "expected header line starting with '>'",
        line: line_no,
    })?;

    let header = header.trim_end_matches(&['\n', '\r'][..]).trim_start();
    if header.is_empty() {
        return Err(ProtError::FastaFormat {
            msg: "empty header",
            line: line_no,
        });
    }

    let (id, desc) = match header.find(|c: char| c.is_whitespace()) {
        Some(idx) => {
            let id = &header[..idx];
            let desc = header[idx..].trim();
            let desc = if desc.is_empty() { None } else { Some(desc) };
            (id, desc)
        }
        None => (header, None),
    };

    Ok((id.into(), desc.map(|s| s.into())))
}
