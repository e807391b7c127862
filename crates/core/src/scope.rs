//! Per-file package/import context, assembled once from every harness's
//! [`java_harness::FileImports`] output and consulted by Stages D–F whenever
//! they need to turn a raw name back into a [`crate::resolve::Scope`].

use java_harness::{FileImports, ImportDecl};
use protocol::id::SENTINEL_PACKAGE;
use rustc_hash::FxHashMap;

use crate::resolve::Scope;

#[derive(Debug, Clone, Default)]
pub struct FileScope {
    pub package: String,
    pub imports: Vec<ImportDecl>,
}

pub struct ScopeTable {
    by_file: FxHashMap<String, FileScope>,
}

impl ScopeTable {
    pub fn build(all_imports: Vec<FileImports>) -> Self {
        let mut by_file = FxHashMap::default();
        for fi in all_imports {
            by_file.insert(
                fi.file_path,
                FileScope {
                    package: fi.package,
                    imports: fi.imports,
                },
            );
        }
        Self { by_file }
    }

    pub fn scope_for<'a>(&'a self, file_path: &str, enclosing_fqn: &'a str) -> Scope<'a> {
        match self.by_file.get(file_path) {
            Some(fs) => Scope {
                package: &fs.package,
                imports: &fs.imports,
                enclosing_fqn,
            },
            None => Scope {
                package: SENTINEL_PACKAGE,
                imports: &[],
                enclosing_fqn,
            },
        }
    }
}
