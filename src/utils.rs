use std::path::Path;

use indicatif::ProgressStyle;
use log::{info, warn};
use regex::Regex;
use walkdir::WalkDir;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{wide_bar}] {pos:>7}/{len:7} {msg}")
        .expect("invalid progress bar template")
        .progress_chars("=>-")
}

/// 根据逗号分隔的后缀列表构建大小写无关的正则
pub fn suffix_regex(suffix: &str) -> Result<Regex, regex::Error> {
    let alternatives = suffix
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)^({})$", alternatives))
}

/// 递归扫描目录中所有符合后缀的文件，按路径排序
///
/// 路径不是合法 UTF-8 的文件会被跳过
pub fn scan_images(path: impl AsRef<Path>, re_suf: &Regex) -> Vec<String> {
    info!("开始扫描目录: {}", path.as_ref().display());
    let mut entries = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                return None;
            }
            let ext = path.extension()?;
            if !re_suf.is_match(&ext.to_string_lossy()) {
                return None;
            }
            match path.to_str() {
                Some(path) => Some(path.to_string()),
                None => {
                    warn!("跳过非 UTF-8 路径: {}", path.display());
                    None
                }
            }
        })
        .collect::<Vec<_>>();
    entries.sort();
    info!("扫描完成，共 {} 张图片", entries.len());
    entries
}
