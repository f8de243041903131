//! Parquet edge-list persistence
//!
//! # Format
//!
//! A single Parquet file with columns `(source: u32, target: u32, weight: u32)`, one row
//! per edge in CSR order. Columns are looked up by name. The vertex and edge counts are
//! kept in the file's key/value metadata under `num_nodes` and `num_edges` so trailing
//! isolated vertices survive a round trip and truncated files are detected.

use super::{CsrGraph, NodeId};
use crate::error::GraphError;
use anyhow::{Context, Result};
use arrow::array::UInt32Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const NUM_NODES_KEY: &str = "num_nodes";
const NUM_EDGES_KEY: &str = "num_edges";

impl CsrGraph {
    /// Write the edge list to a Parquet file
    ///
    /// # Errors
    ///
    /// Returns error if file I/O fails or Arrow conversion fails
    #[allow(clippy::unused_async)] // Async API matches the other loaders
    pub async fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let mut sources = Vec::with_capacity(self.num_edges());
        let mut targets = Vec::with_capacity(self.num_edges());
        let mut weights = Vec::with_capacity(self.num_edges());
        for (src, dst, weight) in self.iter_edges() {
            sources.push(src);
            targets.push(dst);
            weights.push(weight);
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("source", DataType::UInt32, false),
            Field::new("target", DataType::UInt32, false),
            Field::new("weight", DataType::UInt32, false),
        ]));

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(UInt32Array::from(sources)),
                Arc::new(UInt32Array::from(targets)),
                Arc::new(UInt32Array::from(weights)),
            ],
        )
        .context("Failed to create RecordBatch")?;

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let props = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::ZSTD(
                parquet::basic::ZstdLevel::try_new(3)?,
            ))
            .set_key_value_metadata(Some(vec![
                KeyValue::new(NUM_NODES_KEY.to_string(), self.num_nodes().to_string()),
                KeyValue::new(NUM_EDGES_KEY.to_string(), self.num_edges().to_string()),
            ]))
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    /// Read a graph written by [`CsrGraph::write_parquet`]
    ///
    /// Files without `num_nodes` metadata size the graph as `max id + 1`.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, a column is missing or has the wrong type,
    /// or the metadata disagrees with the edges
    #[allow(clippy::unused_async)] // Async API matches the other loaders
    pub async fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let declared_nodes = metadata_count(&builder, NUM_NODES_KEY)?;
        let declared_edges = metadata_count(&builder, NUM_EDGES_KEY)?;
        let reader = builder.build()?;

        let mut edges = Vec::new();
        let mut id_bound = 0_usize;
        for batch_result in reader {
            let batch: RecordBatch = batch_result?;
            let sources = u32_column(&batch, "source")?;
            let targets = u32_column(&batch, "target")?;
            let weights = u32_column(&batch, "weight")?;

            for i in 0..batch.num_rows() {
                let (src, dst) = (sources.value(i), targets.value(i));
                id_bound = id_bound.max(src.max(dst) as usize + 1);
                edges.push((NodeId(src), NodeId(dst), weights.value(i)));
            }
        }

        if let Some(m) = declared_edges {
            if m != edges.len() {
                return Err(GraphError::InvalidCsr(format!(
                    "{NUM_EDGES_KEY} metadata is {m} but the file holds {} edges",
                    edges.len()
                ))
                .into());
            }
        }

        match declared_nodes {
            Some(n) if n < id_bound => Err(GraphError::InvalidCsr(format!(
                "{NUM_NODES_KEY} metadata is {n} but edges reference vertex {}",
                id_bound - 1
            ))
            .into()),
            Some(n) => Self::from_edge_list_with_nodes(n, &edges),
            None => Self::from_edge_list(&edges),
        }
    }
}

fn metadata_count(
    builder: &ParquetRecordBatchReaderBuilder<File>,
    key: &str,
) -> Result<Option<usize>> {
    let Some(value) = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .and_then(|kvs| kvs.iter().find(|kv| kv.key == key))
        .and_then(|kv| kv.value.as_deref())
    else {
        return Ok(None);
    };
    let count: usize = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key} metadata {value:?}"))?;
    if u32::try_from(count).is_err() {
        return Err(GraphError::TooLarge(count).into());
    }
    Ok(Some(count))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| GraphError::InvalidCsr(format!("missing {name} column")))?;
    column
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| {
            GraphError::InvalidCsr(format!(
                "{name} column is {}, expected UInt32",
                column.data_type()
            ))
            .into()
        })
}
