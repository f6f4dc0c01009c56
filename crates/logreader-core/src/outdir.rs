//! 产物目录生命周期：扫描前按需创建，扫描后若无任何文件则整体删除
use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::ConfigError;

/// 确保目录（含父目录）存在；已存在时为空操作。返回是否由本次调用创建
pub fn ensure_exists(path: &Path) -> Result<bool, ConfigError> {
    match fs::metadata(path) {
        Ok(md) if md.is_dir() => Ok(false),
        Ok(_) => Err(ConfigError::DestinationNotDirectory(path.to_path_buf())),
        Err(_) => {
            fs::create_dir_all(path)
                .map_err(|source| ConfigError::DestinationCreate { path: path.to_path_buf(), source })?;
            info!(path = %path.display(), "created destination directory");
            Ok(true)
        }
    }
}

/// 递归检查目录；任意深度都没有文件时删除整个目录（含空子目录）。返回是否删除
pub fn remove_if_empty(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    // 遍历出错（无权限等）按“非空”处理，宁可保留
    let mut holds_files = false;
    for entry in WalkDir::new(path).min_depth(1) {
        match entry {
            Ok(e) if e.file_type().is_dir() => continue,
            _ => {
                holds_files = true;
                break;
            }
        }
    }
    if holds_files {
        debug!(path = %path.display(), "destination holds artifacts, kept");
        return false;
    }
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!(path = %path.display(), "no issues found, removed empty destination directory");
            true
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not remove empty destination");
            false
        }
    }
}
