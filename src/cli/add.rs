use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{info, warn};
use rayon::prelude::*;
use tokio::sync::mpsc::channel;
use tokio::task::spawn_blocking;

use crate::cli::{SubCommandExtend, check_hash_algorithm};
use crate::config::{HashOptions, Opts};
use crate::engine::EngineBuilder;
use crate::hash::compute_hash;
use crate::store::SimilarityStore;
use crate::types::{ImageRecord, InsertMode};
use crate::utils::{pb_style, scan_images, suffix_regex};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub hash: HashOptions,
    /// 图片所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp,bmp")]
    pub suffix: String,
    /// 如果图片已添加，不覆盖旧的记录而是报错
    #[arg(long)]
    pub strict: bool,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let re_suf = suffix_regex(&self.suffix)?;
        let mode = if self.strict { InsertMode::Strict } else { InsertMode::Upsert };
        let engine = EngineBuilder::new(opts.conf_dir.clone())
            .insert_mode(mode)
            .algorithm(self.hash.hash)
            .open()
            .await?;
        check_hash_algorithm(engine.store(), self.hash.hash, true).await?;

        // 标识符使用规范化后的绝对路径
        let path = tokio::fs::canonicalize(&self.path)
            .await
            .with_context(|| format!("无法访问目录: {}", self.path.display()))?;
        let entries = spawn_blocking(move || scan_images(path, &re_suf)).await?;
        let pb = ProgressBar::new(entries.len() as u64).with_style(pb_style());

        // task1: 哈希计算
        let (hash_tx, mut hash_rx) = channel(num_cpus::get() * 2);
        let task1_hash = spawn_blocking({
            let algorithm = self.hash.hash;
            let pb = pb.clone();
            move || {
                entries.into_par_iter().progress_with(pb.clone()).try_for_each_with(
                    hash_tx,
                    |tx, entry| {
                        let hash = std::fs::read(&entry)
                            .map_err(anyhow::Error::from)
                            .and_then(|data| Ok(compute_hash(&data, algorithm)?));
                        match hash {
                            // 接收端关闭时说明写入已经失败，停止剩余的哈希计算
                            Ok(hash) => tx.blocking_send(ImageRecord::new(entry, hash)).map_err(|_| ()),
                            Err(e) => {
                                pb.println(format!("计算哈希失败: {}: {}", entry, e));
                                Ok(())
                            }
                        }
                    },
                )
            }
        });

        // task2: 写入数据库
        let (mut added, mut updated) = (0usize, 0usize);
        while let Some(record) = hash_rx.recv().await {
            let identifier = record.identifier.clone();
            if engine.store().insert(record).await? {
                added += 1;
            } else {
                updated += 1;
            }
            pb.set_message(identifier);
        }
        if task1_hash.await?.is_err() {
            bail!("哈希计算提前终止");
        }

        pb.finish_with_message("图片添加完成");
        let failed = pb.length().unwrap_or(0) as usize - added - updated;
        if failed > 0 {
            warn!("{} 张图片处理失败", failed);
        }
        info!("新增 {} 张，更新 {} 张，数据库中共 {} 张图片", added, updated, engine.store().count().await?);

        Ok(())
    }
}
