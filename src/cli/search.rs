use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::{SubCommandExtend, check_hash_algorithm};
use crate::config::{HashOptions, Opts, SearchOptions};
use crate::engine::{EngineBuilder, RetrievalEngine};
use crate::presenter::{ItemCommand, OutputFormat, render};
use crate::store::{SimilarityStore, SqliteStore};
use crate::types::{Query, QueryResult};

#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
    /// 对每条结果执行的操作，指定后不再按格式输出
    #[arg(long, value_name = "COMMAND", value_enum)]
    pub exec: Option<ItemCommand>,
}

impl OutputOptions {
    fn print(&self, result: &QueryResult) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match self.exec {
            Some(command) => {
                for item in result {
                    command.execute(item, &mut out)?;
                }
            }
            None => render(result, self.output_format, &mut out)?,
        }
        out.flush()?;
        Ok(())
    }
}

async fn open_engine(
    opts: &Opts,
    hash: &HashOptions,
    search: &SearchOptions,
) -> Result<RetrievalEngine<SqliteStore>> {
    let engine = EngineBuilder::new(opts.conf_dir.clone())
        .algorithm(hash.hash)
        .timeout(search.timeout())
        .open()
        .await?;
    check_hash_algorithm(engine.store(), hash.hash, false).await?;
    Ok(engine)
}

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub hash: HashOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    #[command(flatten)]
    pub output: OutputOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let data = tokio::fs::read(&self.image).await?;
        let engine = open_engine(opts, &self.hash, &self.search).await?;
        let result = engine.run(Query::Probe(data), self.search.page()).await?;
        self.output.print(&result)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SimilarCommand {
    #[command(flatten)]
    pub hash: HashOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    #[command(flatten)]
    pub output: OutputOptions,
    /// 数据库中的图片标识
    pub identifier: String,
}

impl SubCommandExtend for SimilarCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let engine = open_engine(opts, &self.hash, &self.search).await?;
        let result =
            engine.run(Query::Existing(self.identifier.clone()), self.search.page()).await?;
        self.output.print(&result)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    #[command(flatten)]
    pub output: OutputOptions,
}

impl SubCommandExtend for ListCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let engine = EngineBuilder::new(opts.conf_dir.clone())
            .timeout(self.search.timeout())
            .open()
            .await?;
        let total = engine.store().count().await?;
        log::info!("共 {} 张图片", total);
        let result = engine.run(Query::Unfiltered, self.search.page()).await?;
        self.output.print(&result)
    }
}
