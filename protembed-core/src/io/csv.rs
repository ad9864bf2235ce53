use crate::embed::PooledEmbeddings;
use crate::error::{ProtError, ProtResult};
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

/// Write pooled embeddings as CSV: one row per sequence, columns
/// `id,length,e0..e{dim-1}`.
pub fn write_pooled_csv(path: impl AsRef<Path>, pooled: &PooledEmbeddings) -> ProtResult<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.display().to_string();
    let writer = WriterBuilder::new()
        .from_path(path_ref)
        .map_err(|e| csv_err(&path_str, e))?;
    write_pooled(writer, pooled).map_err(|e| csv_err(&path_str, e))
}

pub fn write_pooled_csv_to_writer<W: Write>(
    writer: W,
    pooled: &PooledEmbeddings,
) -> ProtResult<()> {
    write_pooled(csv::Writer::from_writer(writer), pooled)
        .map_err(|e| csv_err("<writer>", e))
}

fn write_pooled<W: Write>(
    mut writer: csv::Writer<W>,
    pooled: &PooledEmbeddings,
) -> Result<(), csv::Error> {
    let mut header = Vec::with_capacity(pooled.dim() + 2);
    header.push("id".to_string());
    header.push("length".to_string());
    for j in 0..pooled.dim() {
        header.push(format!("e{j}"));
    }
    writer.write_record(&header)?;

    let mut row = Vec::with_capacity(pooled.dim() + 2);
    for (i, id) in pooled.ids().iter().enumerate() {
        row.clear();
        row.push(id.to_string());
        row.push(pooled.lengths()[i].to_string());
        for v in pooled.vectors().row(i).iter() {
            row.push(v.to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn csv_err(path: &str, source: csv::Error) -> ProtError {
    ProtError::CsvWrite {
        path: path.to_string(),
        source,
    }
}
