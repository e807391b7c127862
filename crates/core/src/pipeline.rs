//! Orchestrates Stages A through G end to end.

use std::fs;
use std::path::Path;

use java_harness::{ExprSite, FileImports, JavaHarness};
use protocol::{AnalyzerError, Diagnostic, Edge, Node};
use rayon::prelude::*;

use crate::assembler::{self, AssembledGraph};
use crate::hierarchy;
use crate::index::{SymbolIndex, SymbolTableDump};
use crate::scope::ScopeTable;
use crate::typeusage;
use crate::calls;
use crate::walker::FileWalker;

pub struct PipelineOutput {
    pub graph: AssembledGraph,
    pub symbol_table: SymbolTableDump,
    pub diagnostics: Vec<Diagnostic>,
    pub files_scanned: usize,
}

struct FileResult {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    expr_sites: Vec<ExprSite>,
    imports: Option<FileImports>,
    diagnostics: Vec<Diagnostic>,
}

pub fn run(root: &Path) -> Result<PipelineOutput, AnalyzerError> {
    let files = FileWalker::new(root).find_java_files();

    // Stages A+B, one file at a time, fanned out across threads. A
    // malformed span is a programmer error in the harness, not a
    // per-file parse failure, and aborts the whole scan.
    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| parse_one_file(root, path))
        .collect::<Result<Vec<_>, AnalyzerError>>()?;

    let mut nodes = Vec::new();
    let mut containment_edges = Vec::new();
    let mut expr_sites = Vec::new();
    let mut all_imports = Vec::new();
    let mut diagnostics = Vec::new();

    for result in results {
        nodes.extend(result.nodes);
        containment_edges.extend(result.edges);
        expr_sites.extend(result.expr_sites);
        if let Some(imports) = result.imports {
            all_imports.push(imports);
        }
        diagnostics.extend(result.diagnostics);
    }

    // Stage C.
    let (index, diag_c) = SymbolIndex::build(nodes);
    diagnostics.extend(diag_c);
    let scopes = ScopeTable::build(all_imports);

    // Stage D.
    let (hierarchy_edges, diag_d, class_hierarchy) = hierarchy::resolve(&index, &scopes);
    diagnostics.extend(diag_d);

    // Stage E.
    let (call_edges, diag_e) = calls::resolve(&expr_sites, &index, &scopes, &class_hierarchy, &hierarchy_edges);
    diagnostics.extend(diag_e);

    // Stage F.
    let (usage_edges, diag_f) = typeusage::resolve(&index, &scopes);
    diagnostics.extend(diag_f);

    let symbol_table = index.dump();
    let all_nodes = index.into_nodes();

    let mut all_edges = containment_edges;
    all_edges.extend(hierarchy_edges);
    all_edges.extend(call_edges);
    all_edges.extend(usage_edges);

    // Stage G.
    let graph = assembler::assemble(all_nodes, all_edges);

    Ok(PipelineOutput {
        graph,
        symbol_table,
        diagnostics,
        files_scanned: files.len(),
    })
}

fn parse_one_file(root: &Path, path: &Path) -> Result<FileResult, AnalyzerError> {
    let file_path = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return Ok(FileResult {
                nodes: Vec::new(),
                edges: Vec::new(),
                expr_sites: Vec::new(),
                imports: None,
                diagnostics: vec![Diagnostic::ParseError {
                    file_path,
                    message: e.to_string(),
                }],
            });
        }
    };

    let mut harness = JavaHarness::new();
    let outcome = harness.parse(&source, &file_path)?;
    Ok(FileResult {
        nodes: outcome.nodes,
        edges: outcome.edges,
        expr_sites: outcome.expr_sites,
        imports: outcome.imports,
        diagnostics: outcome.diagnostics,
    })
}
