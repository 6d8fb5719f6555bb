use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::hash::HashAlgorithm;
use crate::types::{DEFAULT_K, Page};

static CONF_DIR: LazyLock<String> = LazyLock::new(|| {
    ProjectDirs::from("", "", "imsimilar")
        .map(|dirs| dirs.config_dir().to_string_lossy().into_owned())
        .unwrap_or_else(|| ".imsimilar".to_string())
});

fn default_config_dir() -> &'static str {
    CONF_DIR.as_str()
}

#[derive(Parser, Debug, Clone)]
pub struct HashOptions {
    /// 感知哈希算法，搜索时必须与添加图片时一致
    #[arg(short = 'H', long, value_enum, default_value_t = HashAlgorithm::Average)]
    pub hash: HashAlgorithm,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 显示的结果数量
    #[arg(short, long, value_name = "K", default_value_t = DEFAULT_K)]
    pub count: usize,
    /// 跳过的结果数量
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: usize,
    /// 单次数据库操作的超时时间，单位为毫秒，不填则不限制
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,
}

impl SearchOptions {
    pub fn page(&self) -> Page {
        Page { k: self.count, offset: self.offset }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imsimilar", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// imsimilar 配置文件目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 计算图片哈希并添加到数据库
    Add(AddCommand),
    /// 使用外部图片搜索相似图片
    Search(SearchCommand),
    /// 使用数据库中已有的图片搜索相似图片
    Similar(SimilarCommand),
    /// 列出数据库中的图片
    List(ListCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("imsimilar.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
