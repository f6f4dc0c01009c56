use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logreader_core::{
    run_batch, FileSelection, KeywordSpec, Profile, ScanConfiguration, ScanOptions, DEFAULT_SUFFIXES,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "logreader", version, about = "Copy log files that contain errors and report their issue lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描日志文件，为有问题的文件生成副本与报告
    Scan {
        /// 源目录（默认系统日志目录）
        #[arg(long)]
        dir: Option<PathBuf>,

        /// 逗号分隔的文件名列表（相对源目录）
        #[arg(long, conflicts_with = "all")]
        files: Option<String>,

        /// 扫描源目录下所有带指定后缀的文件
        #[arg(long)]
        all: bool,

        /// 与 --all 配合的后缀列表，默认 .log,.txt
        #[arg(long, requires = "all")]
        suffixes: Option<String>,

        /// 逗号分隔的关键字，默认 error,failed,warning
        #[arg(long)]
        keywords: Option<String>,

        /// 产物目录（默认 ./logs）
        #[arg(long)]
        dest: Option<PathBuf>,

        /// 额外生成仅含关键字的统计报告
        #[arg(long)]
        keyword_report: bool,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 线程数（"auto" 或 0 = CPU 核心数，默认 1 即串行）
        #[arg(long)]
        threads: Option<String>,

        /// TOML 配置文件；命令行参数优先
        #[arg(long)]
        profile: Option<PathBuf>,

        /// 将逐文件结果写为 JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            dir,
            files,
            all,
            suffixes,
            keywords,
            dest,
            keyword_report,
            max_file_size,
            threads,
            profile,
            json,
        } => {
            // 默认值 → 配置文件 → 命令行参数，逐层覆盖
            let mut opts = ScanOptions::default();
            if let Some(path) = &profile {
                Profile::load(path).context("load profile")?.apply(&mut opts);
            }
            if let Some(dir) = dir {
                opts.source_dir = dir;
            }
            if let Some(files) = files {
                opts.selection = FileSelection::from_csv(&files);
            } else if all {
                opts.selection = FileSelection::Suffixes(parse_suffixes(suffixes.as_deref()));
            }
            if let Some(k) = keywords {
                opts.keywords = KeywordSpec::List(k);
            }
            if let Some(dest) = dest {
                opts.destination = dest;
            }
            if keyword_report {
                opts.keyword_report = true;
            }
            if max_file_size.is_some() {
                opts.max_file_size = max_file_size;
            }
            if let Some(t) = threads {
                opts.threads = parse_threads(&t);
            }

            info!(source = ?opts.source_dir, destination = ?opts.destination, "starting scan");
            let cfg = ScanConfiguration::build(opts).context("invalid scan configuration")?;
            let report = run_batch(&cfg).context("scan failed")?;

            if let Some(path) = json {
                let mut out = BufWriter::new(File::create(&path).context("create json output")?);
                report.write_json(&mut out).context("write json output")?;
                out.flush().context("flush json output")?;
            }

            for (path, err) in report.failures() {
                warn!(file = %path.display(), kind = err.kind(), "not scanned");
            }
            let stats = report.stats();
            info!(
                resolved = stats.files_resolved,
                missing = stats.files_missing,
                flagged = stats.files_flagged,
                clean = stats.files_clean,
                failed = stats.files_failed,
                "scan finished"
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" 或 0 表示自动（与配置文件一致）；非法值回退为串行
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => Some(1),
    }
}

fn parse_suffixes(s: Option<&str>) -> Vec<String> {
    match s {
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| if s.starts_with('.') { s.to_string() } else { format!(".{s}") })
            .collect(),
        None => DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_parse() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("many"), Some(1));
    }

    #[test]
    fn suffixes_get_a_leading_dot() {
        assert_eq!(parse_suffixes(Some("log, .txt,,")), vec![".log", ".txt"]);
        assert_eq!(parse_suffixes(None), vec![".log", ".txt"]);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
