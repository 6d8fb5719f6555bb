use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use opencv::core::{Mat, Size, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};
use crate::hamming;

/// 哈希位数
pub const HASH_BITS: u32 = 64;

/// 感知哈希计算方式
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// 均值哈希，8x8 灰度图中每个像素与均值比较
    #[default]
    Average,
    /// 差异哈希，9x8 灰度图中每个像素与右侧像素比较
    Difference,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Difference => "difference",
        }
    }

    /// 缩放后的图片尺寸 (宽, 高)
    fn grid(self) -> (i32, i32) {
        match self {
            Self::Average => (8, 8),
            Self::Difference => (9, 8),
        }
    }
}

/// 64 位感知哈希
///
/// 位序：按行展开缩放后的采样点，第一个采样点对应最高位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HashVector(u64);

impl HashVector {
    /// 两个哈希的汉明距离
    #[inline]
    pub fn distance(&self, other: &HashVector) -> u32 {
        hamming::hamming_u64(self.0, other.0)
    }

    /// 转换为用于存储的整数
    pub fn to_storage_integer(self) -> u64 {
        self.0
    }

    /// 从存储的整数恢复，超过 64 位时返回错误
    pub fn from_storage_integer(value: u128) -> Result<Self> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| RetrievalError::Format(format!("{value} exceeds {HASH_BITS} bits")))
    }

    /// SQLite 只有有符号整数，按位重解释
    pub(crate) fn to_sql(self) -> i64 {
        self.0 as i64
    }

    pub(crate) fn from_sql(value: i64) -> Self {
        Self(value as u64)
    }
}

impl From<u64> for HashVector {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for HashVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for HashVector {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > (HASH_BITS / 4) as usize {
            return Err(RetrievalError::Format(format!("invalid hash length: {s:?}")));
        }
        // from_str_radix 允许前导的 '+'
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RetrievalError::Format(format!("invalid hex digits: {s:?}")));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| RetrievalError::Format(format!("{s:?}: {e}")))
    }
}

/// 计算图片的感知哈希
///
/// 相同的输入总是得到相同的结果，输入不是有效图片时返回 [`RetrievalError::Decode`]
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> Result<HashVector> {
    if data.is_empty() {
        return Err(RetrievalError::Decode("empty input".to_string()));
    }
    let buf = Vector::<u8>::from_slice(data);
    let img = imgcodecs::imdecode(&buf, imgcodecs::IMREAD_GRAYSCALE)?;
    if img.empty() {
        return Err(RetrievalError::Decode("unrecognized image data".to_string()));
    }

    let (width, height) = algorithm.grid();
    let mut small = Mat::default();
    imgproc::resize(
        &img,
        &mut small,
        Size::new(width, height),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;

    hash_luma(small.data_bytes()?, algorithm)
}

/// 根据缩放后的灰度采样点计算哈希
///
/// `pixels` 按行排列，长度与 `algorithm` 的网格大小不一致时返回 [`RetrievalError::Format`]
pub fn hash_luma(pixels: &[u8], algorithm: HashAlgorithm) -> Result<HashVector> {
    let (width, height) = algorithm.grid();
    let expected = (width * height) as usize;
    if pixels.len() != expected {
        return Err(RetrievalError::Format(format!(
            "expected {expected} samples, got {}",
            pixels.len()
        )));
    }

    let mut hash = 0u64;
    match algorithm {
        HashAlgorithm::Average => {
            let total = pixels.iter().map(|&p| p as u32).sum::<u32>();
            // p > total / 64 等价于 p * 64 > total，避免浮点误差
            for &p in pixels {
                hash <<= 1;
                hash |= ((p as u32) * (pixels.len() as u32) > total) as u64;
            }
        }
        HashAlgorithm::Difference => {
            for row in pixels.chunks_exact(width as usize) {
                for j in 0..row.len() - 1 {
                    hash <<= 1;
                    hash |= (row[j] < row[j + 1]) as u64;
                }
            }
        }
    }
    Ok(HashVector(hash))
}
