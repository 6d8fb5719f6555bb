use std::io::Write;

use clap::ValueEnum;

use crate::types::{Match, QueryResult};

/// 结果输出格式
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// 将检索结果写入 `out`
///
/// 表格格式每行一条结果，距离与路径以制表符分隔，无距离时只输出路径
pub fn render(result: &QueryResult, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            for m in result {
                match m.distance {
                    Some(d) => writeln!(out, "{}\t{}", d, m.identifier)?,
                    None => writeln!(out, "{}", m.identifier)?,
                }
            }
        }
    }
    Ok(())
}

/// 对单条结果执行的操作
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCommand {
    /// 输出图片路径
    CopyPath,
}

impl ItemCommand {
    pub const ALL: &'static [ItemCommand] = &[ItemCommand::CopyPath];

    /// 菜单中显示的名称
    pub fn label(self) -> &'static str {
        match self {
            Self::CopyPath => "Copy file path",
        }
    }

    pub fn execute(self, item: &Match, out: &mut impl Write) -> std::io::Result<()> {
        match self {
            Self::CopyPath => writeln!(out, "{}", item.identifier),
        }
    }
}
