// 该文件是 Chima （尺码） 项目的一部分。
// src/fit.rs - 尺码推荐与合身度评分
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

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
  catalog::{GarmentMeasurements, SizingConfig},
  size::{FitType, GarmentSize, Gender},
};

/// 典型衣长与身高之比
pub const LENGTH_TO_HEIGHT_RATIO: f32 = 0.40;

const CHEST_PENALTY_PER_CM: f32 = 10.0;
const CHEST_PENALTY_CAP: f32 = 50.0;
const LENGTH_PENALTY_PER_CM: f32 = 5.0;
const LENGTH_PENALTY_CAP: f32 = 20.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
  #[error("尺码表中不存在尺码: {0}")]
  UnknownSize(GarmentSize),
}

/// 某个尺码穿在某人身上的合身分析
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitAnalysis {
  pub recommended_size: GarmentSize,
  pub selected_size: GarmentSize,
  pub fit_type: FitType,
  /// 成衣胸围减人体胸围（厘米）
  pub chest_difference_cm: f32,
  pub length_difference_cm: f32,
  /// 0 - 100，100 为完全合身
  pub fit_score: f32,
  pub fit_description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonMeasurements {
  pub chest: f32,
  pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogMeasurements {
  pub chest: f32,
  pub length: f32,
  pub shoulder_width: f32,
  pub sleeve_length: f32,
}

impl From<&GarmentMeasurements> for CatalogMeasurements {
  fn from(m: &GarmentMeasurements) -> Self {
    Self {
      chest: m.chest_cm,
      length: m.length_cm,
      shoulder_width: m.shoulder_width_cm,
      sleeve_length: m.sleeve_length_cm,
    }
  }
}

/// 尺码对比中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeEntry {
  pub size: GarmentSize,
  pub is_recommended: bool,
  pub fit_type: FitType,
  pub fit_score: f32,
  pub fit_description: &'static str,
  pub chest_difference: f32,
  pub length_difference: f32,
  pub measurements: CatalogMeasurements,
}

/// 全部尺码的对比结果，按尺码表顺序排列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeComparison {
  pub recommended_size: GarmentSize,
  pub person_measurements: PersonMeasurements,
  pub size_analysis: Vec<SizeEntry>,
}

impl SizeComparison {
  pub fn get(&self, size: GarmentSize) -> Option<&SizeEntry> {
    self.size_analysis.iter().find(|e| e.size == size)
  }
}

/// 评分引擎，只读取注入的尺码配置
#[derive(Debug, Clone)]
pub struct FitEngine {
  config: Arc<SizingConfig>,
}

impl Default for FitEngine {
  fn default() -> Self {
    Self::new(Arc::new(SizingConfig::default()))
  }
}

impl FitEngine {
  pub fn new(config: Arc<SizingConfig>) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &SizingConfig {
    &self.config
  }

  /// 按胸围加上性别舒适余量后，取胸围最接近的尺码；距离相同时靠前的尺码优先
  pub fn recommend_size(&self, chest_measurement_cm: f32, gender: Gender) -> GarmentSize {
    let target_chest = chest_measurement_cm + gender.chest_allowance_cm();

    let mut best = None;
    for entry in self.config.catalog.iter() {
      let distance = (entry.chest_cm - target_chest).abs();
      match best {
        Some((_, min)) if distance >= min => {}
        _ => best = Some((entry.size, distance)),
      }
    }

    // 尺码表非空（构造时已校验）
    best.map(|(size, _)| size).unwrap_or(GarmentSize::FALLBACK)
  }

  pub fn analyze_fit(
    &self,
    person_chest_cm: f32,
    person_height_cm: f32,
    selected_size: GarmentSize,
    gender: Gender,
  ) -> Result<FitAnalysis, FitError> {
    let recommended_size = self.recommend_size(person_chest_cm, gender);
    let garment = self
      .config
      .catalog
      .get(selected_size)
      .ok_or(FitError::UnknownSize(selected_size))?;

    let chest_difference_cm = garment.chest_cm - person_chest_cm;
    let length_difference_cm = garment.length_cm - person_height_cm * LENGTH_TO_HEIGHT_RATIO;

    let (fit_type, fit_description) = self.classify(chest_difference_cm);
    let fit_score = fit_score(chest_difference_cm, length_difference_cm);

    debug!(
      "尺码 {} 分析: {} (胸围差 {:+.1}cm, 衣长差 {:+.1}cm, 评分 {:.0})",
      selected_size, fit_type, chest_difference_cm, length_difference_cm, fit_score
    );

    Ok(FitAnalysis {
      recommended_size,
      selected_size,
      fit_type,
      chest_difference_cm,
      length_difference_cm,
      fit_score,
      fit_description,
    })
  }

  fn classify(&self, chest_difference: f32) -> (FitType, &'static str) {
    let tolerance = &self.config.tolerance;
    if chest_difference <= tolerance.tight_threshold {
      (FitType::Tight, "This size will be tight and may restrict movement")
    } else if chest_difference >= tolerance.loose_threshold {
      (FitType::Loose, "This size will be loose and may look oversized")
    } else if chest_difference.abs() <= tolerance.perfect_range {
      (FitType::Perfect, "This size provides an excellent fit")
    } else if chest_difference > 0.0 {
      (FitType::Loose, "This size will be somewhat loose but comfortable")
    } else {
      (FitType::Tight, "This size will be somewhat snug but wearable")
    }
  }

  /// 对尺码表中的每个尺码分别评分，各尺码之间互不依赖
  pub fn size_comparison(
    &self,
    person_chest_cm: f32,
    person_height_cm: f32,
    gender: Gender,
  ) -> Result<SizeComparison, FitError> {
    let recommended_size = self.recommend_size(person_chest_cm, gender);

    let size_analysis = self
      .config
      .catalog
      .entries()
      .par_iter()
      .map(|garment| {
        let analysis = self.analyze_fit(person_chest_cm, person_height_cm, garment.size, gender)?;
        Ok(SizeEntry {
          size: garment.size,
          is_recommended: garment.size == recommended_size,
          fit_type: analysis.fit_type,
          fit_score: analysis.fit_score,
          fit_description: analysis.fit_description,
          chest_difference: analysis.chest_difference_cm,
          length_difference: analysis.length_difference_cm,
          measurements: CatalogMeasurements::from(garment),
        })
      })
      .collect::<Result<Vec<_>, FitError>>()?;

    Ok(SizeComparison {
      recommended_size,
      person_measurements: PersonMeasurements {
        chest: person_chest_cm,
        height: person_height_cm,
      },
      size_analysis,
    })
  }
}

/// 两项扣分各有上限，因此仅凭这两项最低为 30 分
pub fn fit_score(chest_difference: f32, length_difference: f32) -> f32 {
  let chest_penalty = (chest_difference.abs() * CHEST_PENALTY_PER_CM).min(CHEST_PENALTY_CAP);
  let length_penalty = (length_difference.abs() * LENGTH_PENALTY_PER_CM).min(LENGTH_PENALTY_CAP);
  (100.0 - chest_penalty - length_penalty).clamp(0.0, 100.0)
}
