//! Writes the pipeline's output to disk: `nodes.jsonl`, `edges.jsonl`, one
//! JSON value per line, plus `symbol_tables.json` as a single
//! document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::assembler::AssembledGraph;
use crate::index::SymbolTableDump;

pub fn write_all(out_dir: &Path, graph: &AssembledGraph, symbol_table: &SymbolTableDump) -> Result<()> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating output dir {}", out_dir.display()))?;

    write_jsonl(&out_dir.join("nodes.jsonl"), &graph.nodes)?;
    write_jsonl(&out_dir.join("edges.jsonl"), &graph.edges)?;

    let symbol_table_path = out_dir.join("symbol_tables.json");
    let file = File::create(&symbol_table_path)
        .with_context(|| format!("creating {}", symbol_table_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), symbol_table)
        .with_context(|| format!("writing {}", symbol_table_path.display()))?;

    Ok(())
}

fn write_jsonl<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut writer, item).with_context(|| format!("serializing into {}", path.display()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
