// 该文件是 Chima （尺码） 项目的一部分。
// src/task.rs - 单次试穿任务
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

use std::sync::Arc;

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
  catalog::SizingConfig,
  compose::{ComposeError, Compositor, decode_rgb_image},
  fit::{FitAnalysis, FitError, SizeComparison},
  pose::PoseLandmarks,
  size::{GarmentSize, Gender},
};

#[derive(Error, Debug)]
pub enum TryOnError {
  #[error("合成错误: {0}")]
  ComposeError(#[from] ComposeError),
  #[error("合身分析错误: {0}")]
  FitError(#[from] FitError),
}

/// 一次试穿请求中除图像以外的部分
#[derive(Debug, Clone, PartialEq)]
pub struct TryOnRequest {
  pub person_chest_cm: f32,
  pub person_height_cm: f32,
  /// 尺码标签，无法识别时按 `M` 处理
  pub size_label: String,
  pub gender: Gender,
  pub landmarks: Option<PoseLandmarks>,
}

impl TryOnRequest {
  pub fn new(person_chest_cm: f32, person_height_cm: f32) -> Self {
    Self {
      person_chest_cm,
      person_height_cm,
      size_label: GarmentSize::FALLBACK.to_string(),
      gender: Gender::Unspecified,
      landmarks: None,
    }
  }

  pub fn with_size(mut self, label: impl Into<String>) -> Self {
    self.size_label = label.into();
    self
  }

  pub fn with_gender(mut self, gender: Gender) -> Self {
    self.gender = gender;
    self
  }

  pub fn with_landmarks(mut self, landmarks: Option<PoseLandmarks>) -> Self {
    self.landmarks = landmarks;
    self
  }
}

/// 返回给展示层的结构化结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TryOnReport {
  pub success: bool,
  pub fit_analysis: FitAnalysis,
  pub size_data: SizeComparison,
}

#[derive(Debug, Clone)]
pub struct TryOnResult {
  pub preview: RgbImage,
  pub comparison_grid: RgbImage,
  pub report: TryOnReport,
}

pub struct TryOnTask {
  compositor: Compositor,
}

impl TryOnTask {
  pub fn new(config: Arc<SizingConfig>) -> Result<Self, TryOnError> {
    Ok(Self {
      compositor: Compositor::new(config)?,
    })
  }

  pub fn compositor(&self) -> &Compositor {
    &self.compositor
  }

  /// 分析所选尺码，生成试穿预览、尺码对比图和全部尺码的对比数据
  pub fn run(
    &self,
    person: &RgbImage,
    garment: &RgbImage,
    request: &TryOnRequest,
  ) -> Result<TryOnResult, TryOnError> {
    let engine = self.compositor.engine();
    let selected = GarmentSize::parse_lenient(&request.size_label);
    let landmarks = request.landmarks.as_ref();

    info!(
      "开始试穿任务: 胸围 {:.1}cm, 身高 {:.1}cm, 尺码 {}, 性别 {}",
      request.person_chest_cm, request.person_height_cm, selected, request.gender
    );

    let analysis = engine.analyze_fit(
      request.person_chest_cm,
      request.person_height_cm,
      selected,
      request.gender,
    )?;

    // 预览与对比图互不依赖
    let (preview, comparison_grid) = rayon::join(
      || {
        self
          .compositor
          .composite(person, garment, &analysis, landmarks)
      },
      || {
        self.compositor.comparison_grid(
          person,
          garment,
          request.person_chest_cm,
          request.person_height_cm,
          request.gender,
          landmarks,
        )
      },
    );
    let (preview, comparison_grid) = (preview?, comparison_grid?);

    let size_data = engine.size_comparison(
      request.person_chest_cm,
      request.person_height_cm,
      request.gender,
    )?;

    info!(
      "试穿任务完成: 推荐尺码 {}, 所选尺码 {} ({}, 评分 {:.0})",
      analysis.recommended_size, analysis.selected_size, analysis.fit_type, analysis.fit_score
    );

    Ok(TryOnResult {
      preview,
      comparison_grid,
      report: TryOnReport {
        success: true,
        fit_analysis: analysis,
        size_data,
      },
    })
  }

  /// 与 [`TryOnTask::run`] 相同，但图像为编码后的数据（PNG、JPEG）
  pub fn run_encoded(
    &self,
    person: &[u8],
    garment: &[u8],
    request: &TryOnRequest,
  ) -> Result<TryOnResult, TryOnError> {
    let person = decode_rgb_image(person)?;
    let garment = decode_rgb_image(garment)?;
    self.run(&person, &garment, request)
  }
}
