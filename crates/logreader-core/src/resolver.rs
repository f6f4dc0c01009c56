//! 路径解析：源目录 + 文件选择 → 去重后的现存普通文件绝对路径
use std::fs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::options::{FileSelection, DEFAULT_FILE_NAMES};

/// 被丢弃的请求项（非致命，仅提示）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryMiss {
    pub requested: String,
    pub reason: &'static str,
}

/// 解析结果：有序文件列表 + 未命中项
#[derive(Debug, Clone, Default)]
pub struct ResolvedFileSet {
    pub files: Vec<PathBuf>,
    pub misses: Vec<DiscoveryMiss>,
}

impl ResolvedFileSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// 按选择方式解析候选文件
///
/// 结果保留请求时的路径（符号链接不展开），产物名由此推导；规范化路径仅作去重键。
pub fn resolve_files(source_dir: &Path, selection: &FileSelection) -> ResolvedFileSet {
    let names: Vec<OsString> = match selection {
        FileSelection::Default => DEFAULT_FILE_NAMES.iter().map(OsString::from).collect(),
        FileSelection::Names(names) => names.iter().map(OsString::from).collect(),
        FileSelection::Suffixes(suffixes) => enumerate_by_suffix(source_dir, suffixes),
    };

    let mut seen: IndexMap<PathBuf, PathBuf> = IndexMap::new();
    let mut misses = Vec::new();
    for name in names {
        let requested_name = name.to_string_lossy().into_owned();
        let candidate = absolute(&source_dir.join(&name));
        match fs::metadata(&candidate) {
            Ok(md) if md.is_file() => {
                // "./auth.log" 与 "auth.log" 视为同一文件，保留先出现的请求路径
                let key = fs::canonicalize(&candidate).unwrap_or_else(|_| candidate.clone());
                match seen.entry(key) {
                    Entry::Occupied(_) => debug!(name = %requested_name, "duplicate file request dropped"),
                    Entry::Vacant(slot) => {
                        slot.insert(candidate);
                    }
                }
            }
            Ok(_) => {
                warn!(name = %requested_name, "skipping: not a regular file");
                misses.push(DiscoveryMiss { requested: requested_name, reason: "not a regular file" });
            }
            Err(_) => {
                warn!(name = %requested_name, "skipping: file does not exist");
                misses.push(DiscoveryMiss { requested: requested_name, reason: "does not exist" });
            }
        }
    }

    ResolvedFileSet { files: seen.into_values().collect(), misses }
}

/// 相对路径基于当前工作目录补全；不解析符号链接
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// 枚举源目录（单层）中后缀匹配的文件名，按文件名排序保证稳定
///
/// 文件名按原始字节保留，非 UTF-8 名称同样参与扫描。
fn enumerate_by_suffix(source_dir: &Path, suffixes: &[String]) -> Vec<OsString> {
    let mut names: Vec<OsString> = WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir())
        .map(|e| e.file_name().to_os_string())
        .filter(|name| {
            let lossy = name.to_string_lossy();
            suffixes.iter().any(|s| lossy.ends_with(s.as_str()))
        })
        .inspect(|name| {
            if name.to_str().is_none() {
                warn!(name = %name.to_string_lossy(), "file name is not valid UTF-8, scanning it as-is");
            }
        })
        .collect();
    names.sort();
    names
}
