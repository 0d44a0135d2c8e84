// 该文件是 Chima （尺码） 项目的一部分。
// src/compose/label.rs - 合身标识文字绘制
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};

use crate::fit::FitAnalysis;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 22.0;
const SIZE_FONT_SIZE: f32 = 19.0;
const LABEL_X: i32 = 10;
/// 第一行文字基线
const LABEL_BASELINE_Y: i32 = 30;
const LINE_SPACING: i32 = 30;
const BOX_PADDING: i32 = 5;
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const SIZE_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub fn fit_label(analysis: &FitAnalysis) -> String {
  format!(
    "{} Fit (Score: {})",
    analysis.fit_type.title(),
    analysis.fit_score.round() as i32
  )
}

pub fn size_label(analysis: &FitAnalysis) -> String {
  format!(
    "Size: {} (Recommended: {})",
    analysis.selected_size, analysis.recommended_size
  )
}

pub struct FitIndicator {
  font: FontArc,
  label_scale: PxScale,
  size_scale: PxScale,
}

impl FitIndicator {
  pub fn new(font: FontArc) -> Self {
    Self {
      font,
      label_scale: PxScale::from(LABEL_FONT_SIZE),
      size_scale: PxScale::from(SIZE_FONT_SIZE),
    }
  }

  /// 在左上角绘制合身类型与评分（带底色），下一行绘制所选与推荐尺码
  pub fn draw(&self, image: &mut RgbImage, analysis: &FitAnalysis, color: Rgb<u8>) {
    let label = fit_label(analysis);
    let (text_width, text_height) = text_size(self.label_scale, &self.font, &label);
    let (text_width, text_height) = (text_width as i32, text_height as i32);

    let top = LABEL_BASELINE_Y - text_height;
    let rect = Rect::at(LABEL_X - BOX_PADDING, top - BOX_PADDING).of_size(
      (text_width + 2 * BOX_PADDING) as u32,
      (text_height + 2 * BOX_PADDING) as u32,
    );
    draw_filled_rect_mut(image, rect, BOX_COLOR);
    draw_text_mut(
      image,
      color,
      LABEL_X,
      top,
      self.label_scale,
      &self.font,
      &label,
    );

    let sizes = size_label(analysis);
    let (_, size_height) = text_size(self.size_scale, &self.font, &sizes);
    draw_text_mut(
      image,
      SIZE_TEXT_COLOR,
      LABEL_X,
      LABEL_BASELINE_Y + LINE_SPACING - size_height as i32,
      self.size_scale,
      &self.font,
      &sizes,
    );
  }
}
