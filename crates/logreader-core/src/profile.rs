//! 扫描配置文件加载（TOML）
//!
//! 所有键均可省略；省略项沿用内置默认值，命令行参数优先于配置文件。
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::options::{FileSelection, KeywordSpec, ScanOptions};

/// 配置文件结构
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// 显式文件名列表；与 suffixes 同时出现时以 files 为准
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub suffixes: Option<Vec<String>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub keyword_report: Option<bool>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ProfileRead { path: path.to_path_buf(), source })?;
        Self::parse(&txt).map_err(|source| ConfigError::ProfileParse { path: path.to_path_buf(), source })
    }

    pub fn parse(txt: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(txt)
    }

    /// 将配置文件中出现的键覆盖到选项上
    pub fn apply(&self, opts: &mut ScanOptions) {
        if let Some(dir) = &self.source_dir {
            opts.source_dir = dir.clone();
        }
        if let Some(dest) = &self.destination {
            opts.destination = dest.clone();
        }
        match (&self.files, &self.suffixes) {
            (Some(files), _) => opts.selection = FileSelection::Names(files.clone()),
            (None, Some(suffixes)) => opts.selection = FileSelection::Suffixes(suffixes.clone()),
            (None, None) => {}
        }
        if let Some(keywords) = &self.keywords {
            opts.keywords = KeywordSpec::List(keywords.join(","));
        }
        if let Some(kr) = self.keyword_report {
            opts.keyword_report = kr;
        }
        if self.max_file_size.is_some() {
            opts.max_file_size = self.max_file_size;
        }
        if let Some(t) = self.threads {
            // 0 表示自动
            opts.threads = if t == 0 { None } else { Some(t) };
        }
    }
}
