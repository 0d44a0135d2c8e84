// 该文件是 Chima （尺码） 项目的一部分。
// src/compose/style.rs - 按合身类型选择的合成参数
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

use image::Rgb;

use crate::{fit::FitAnalysis, size::FitType};

/// 缩放系数下限，偏紧时胸围差过大也不会把服装缩成一个点
pub const MIN_SCALE_FACTOR: f64 = 0.3;

/// 缩放后的服装图像滤镜
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostFilter {
  /// 中心权重 1.8，周围权重 -0.1
  Sharpen,
  GaussianBlur { sigma: f32 },
  None,
}

/// 单个合身类型对应的一组合成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitStyle {
  pub fit_type: FitType,
  pub scale_factor: f64,
  pub alpha: f32,
  pub width_adjustment: f64,
  pub height_adjustment: f64,
  pub filter: PostFilter,
  /// 有肩部关键点时，从肩线向上的偏移（像素）
  pub shoulder_lift: i64,
  /// 无关键点时，相对人物高度四分之一处的偏移（像素，向下为正）
  pub fallback_shift: i64,
  pub label_color: Rgb<u8>,
}

impl FitStyle {
  pub fn for_analysis(analysis: &FitAnalysis) -> Self {
    let chest_diff = analysis.chest_difference_cm as f64;
    match analysis.fit_type {
      FitType::Tight => Self {
        fit_type: FitType::Tight,
        scale_factor: (0.75 + chest_diff / 20.0).max(MIN_SCALE_FACTOR),
        alpha: 0.95,
        width_adjustment: 0.9,
        height_adjustment: 1.05,
        filter: PostFilter::Sharpen,
        shoulder_lift: 10,
        fallback_shift: 20,
        label_color: Rgb([255, 0, 0]),
      },
      FitType::Loose => Self {
        fit_type: FitType::Loose,
        scale_factor: (1.0 + chest_diff / 15.0).max(MIN_SCALE_FACTOR),
        alpha: 0.65,
        width_adjustment: 1.2,
        height_adjustment: 1.1,
        filter: PostFilter::GaussianBlur { sigma: 0.5 },
        shoulder_lift: 30,
        fallback_shift: -20,
        label_color: Rgb([255, 165, 0]),
      },
      FitType::Perfect => Self {
        fit_type: FitType::Perfect,
        scale_factor: 1.0,
        alpha: 0.8,
        width_adjustment: 1.0,
        height_adjustment: 1.0,
        filter: PostFilter::None,
        shoulder_lift: 20,
        fallback_shift: 0,
        label_color: Rgb([0, 255, 0]),
      },
    }
  }

  /// 缩放后的服装尺寸，向零取整
  pub fn garment_size(&self, width: u32, height: u32) -> (u32, u32) {
    let w = width as f64 * self.scale_factor * self.width_adjustment;
    let h = height as f64 * self.scale_factor * self.height_adjustment;
    (w.max(0.0) as u32, h.max(0.0) as u32)
  }
}
