// 该文件是 Chima （尺码） 项目的一部分。
// src/compose/filter.rs - 服装图像滤镜与混合
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{GrayImage, Rgb, RgbImage, imageops};
use imageproc::{edges::canny, filter::gaussian_blur_f32};

use super::style::PostFilter;

const SHARPEN_KERNEL: [f32; 9] = [-0.1, -0.1, -0.1, -0.1, 1.8, -0.1, -0.1, -0.1, -0.1];

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// 边缘高亮强度
const EDGE_GAIN: f32 = 0.3;

const SHADOW_SIGMA: f32 = 2.0;
const SHADOW_DARKEN: f32 = 0.3;
/// 阴影预混合时阴影所占权重
pub const SHADOW_WEIGHT: f32 = 0.1;

pub fn apply_post_filter(image: &RgbImage, filter: PostFilter) -> RgbImage {
  match filter {
    PostFilter::Sharpen => convolve3x3(image, &SHARPEN_KERNEL),
    PostFilter::GaussianBlur { sigma } => gaussian_blur_f32(image, sigma),
    PostFilter::None => image.clone(),
  }
}

// 边界按 101 反射取值：-1 -> 1, n -> n - 2
fn reflect101(i: i64, n: i64) -> u32 {
  if n == 1 {
    return 0;
  }
  let i = if i < 0 { -i } else { i };
  let i = if i >= n { 2 * (n - 1) - i } else { i };
  i as u32
}

/// 3x3 卷积，结果四舍五入并截断到 [0, 255]
///
/// 边界按 101 反射取值；imageproc 的 `filter3x3` 只做边缘复制，结果不同。
pub fn convolve3x3(image: &RgbImage, kernel: &[f32; 9]) -> RgbImage {
  let (width, height) = image.dimensions();
  let (w, h) = (width as i64, height as i64);

  RgbImage::from_fn(width, height, |x, y| {
    let mut acc = [0f32; 3];
    for ky in 0..3i64 {
      for kx in 0..3i64 {
        let sx = reflect101(x as i64 + kx - 1, w);
        let sy = reflect101(y as i64 + ky - 1, h);
        let weight = kernel[(ky * 3 + kx) as usize];
        let pixel = image.get_pixel(sx, sy);
        for (a, v) in acc.iter_mut().zip(pixel.0) {
          *a += v as f32 * weight;
        }
      }
    }
    Rgb(acc.map(saturate))
  })
}

/// 服装边缘图，用于偏紧时表现布料张力
pub fn tension_edges(garment: &RgbImage) -> GrayImage {
  canny(&imageops::grayscale(garment), CANNY_LOW, CANNY_HIGH)
}

/// 高斯模糊并压暗的服装副本，用于偏松时表现垂坠阴影
pub fn drape_shadow(garment: &RgbImage) -> RgbImage {
  let mut shadow = gaussian_blur_f32(garment, SHADOW_SIGMA);
  for pixel in shadow.pixels_mut() {
    pixel.0 = pixel.0.map(|v| (v as f32 * SHADOW_DARKEN) as u8);
  }
  shadow
}

/// 边缘像素叠加到已混合结果上的增量
pub fn edge_highlight(edge: u8) -> u8 {
  (edge as f32 * EDGE_GAIN) as u8
}

/// `a * alpha + b * beta`，四舍五入并饱和
pub fn add_weighted(a: Rgb<u8>, alpha: f32, b: Rgb<u8>, beta: f32) -> Rgb<u8> {
  Rgb([0, 1, 2].map(|c| saturate(a[c] as f32 * alpha + b[c] as f32 * beta)))
}

fn saturate(v: f32) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}
