#![allow(dead_code)]

use std::path::Path;

use opencv::core::{self, Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;

/// 生成 32x32 灰度图并编码为 PNG
pub fn encode_png(f: impl Fn(i32, i32) -> u8) -> Vec<u8> {
    let mut mat =
        Mat::new_rows_cols_with_default(32, 32, core::CV_8UC1, core::Scalar::all(0.)).unwrap();
    for r in 0..32 {
        for c in 0..32 {
            *mat.at_2d_mut::<u8>(r, c).unwrap() = f(r, c);
        }
    }
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode(".png", &mat, &mut buf, &Vector::new()).unwrap();
    buf.to_vec()
}

/// 几张互不相同的测试图片
pub fn samples() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("horizontal.png", encode_png(|_, c| (c * 8) as u8)),
        ("vertical.png", encode_png(|r, _| (r * 8) as u8)),
        ("diagonal.png", encode_png(|r, c| ((r + c) * 4) as u8)),
        ("checker.png", encode_png(|r, c| if (r / 8 + c / 8) % 2 == 0 { 0 } else { 255 })),
    ]
}

/// 将测试图片写入目录
pub fn write_samples(dir: &Path) {
    for (name, data) in samples() {
        std::fs::write(dir.join(name), data).unwrap();
    }
}
