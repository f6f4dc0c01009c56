//! 不可变扫描配置：一次构建，按引用传入扫描器
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::options::{FileSelection, ScanOptions};
use crate::pattern::KeywordMatcher;
use crate::resolver::{resolve_files, ResolvedFileSet};

#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    source_dir: PathBuf,
    selection: FileSelection,
    files: ResolvedFileSet,
    matcher: KeywordMatcher,
    destination: PathBuf,
    keyword_report: bool,
    max_file_size: Option<u64>,
    threads: usize,
}

impl ScanConfiguration {
    /// 校验源目录、编译关键字、解析文件列表
    pub fn build(opts: ScanOptions) -> Result<Self, ConfigError> {
        let matcher = KeywordMatcher::compile(&opts.keywords)?;

        match fs::metadata(&opts.source_dir) {
            Ok(md) if md.is_dir() => {}
            Ok(_) => return Err(ConfigError::SourceNotDirectory(opts.source_dir)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::SourceMissing(opts.source_dir)),
            Err(source) => return Err(ConfigError::SourceUnreadable { path: opts.source_dir, source }),
        }
        if opts.destination.exists() && !opts.destination.is_dir() {
            return Err(ConfigError::DestinationNotDirectory(opts.destination));
        }

        let files = resolve_files(&opts.source_dir, &opts.selection);
        let threads = opts.threads.unwrap_or_else(num_cpus::get).max(1);

        Ok(Self {
            source_dir: opts.source_dir,
            selection: opts.selection,
            files,
            matcher,
            destination: opts.destination,
            keyword_report: opts.keyword_report,
            max_file_size: opts.max_file_size,
            threads,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    pub fn files(&self) -> &ResolvedFileSet {
        &self.files
    }

    pub fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn keyword_report(&self) -> bool {
        self.keyword_report
    }

    pub fn max_file_size(&self) -> Option<u64> {
        self.max_file_size
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}
