// 该文件是 Chima （尺码） 项目的一部分。
// src/catalog.rs - 尺码表与合身容差配置
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

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::size::GarmentSize;

/// 单个尺码的成衣尺寸（厘米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarmentMeasurements {
  pub size: GarmentSize,
  pub chest_cm: f32,
  pub length_cm: f32,
  pub shoulder_width_cm: f32,
  pub sleeve_length_cm: f32,
}

impl GarmentMeasurements {
  pub const fn new(
    size: GarmentSize,
    chest_cm: f32,
    length_cm: f32,
    shoulder_width_cm: f32,
    sleeve_length_cm: f32,
  ) -> Self {
    Self {
      size,
      chest_cm,
      length_cm,
      shoulder_width_cm,
      sleeve_length_cm,
    }
  }
}

// 标准衬衫尺码表
const STANDARD_SHIRT: [GarmentMeasurements; 6] = [
  GarmentMeasurements::new(GarmentSize::XS, 86.0, 66.0, 42.0, 59.0),
  GarmentMeasurements::new(GarmentSize::S, 91.0, 68.0, 44.0, 61.0),
  GarmentMeasurements::new(GarmentSize::M, 97.0, 70.0, 46.0, 63.0),
  GarmentMeasurements::new(GarmentSize::L, 102.0, 72.0, 48.0, 65.0),
  GarmentMeasurements::new(GarmentSize::XL, 107.0, 74.0, 50.0, 67.0),
  GarmentMeasurements::new(GarmentSize::XXL, 112.0, 76.0, 52.0, 69.0),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
  #[error("尺码表为空")]
  Empty,
  #[error("尺码重复: {0}")]
  DuplicateSize(GarmentSize),
  #[error("尺码表未按胸围升序排列: {prev} ({prev_chest}cm) 之后是 {next} ({next_chest}cm)")]
  NotAscending {
    prev: GarmentSize,
    prev_chest: f32,
    next: GarmentSize,
    next_chest: f32,
  },
  #[error("容差配置无效: {0}")]
  InvalidTolerance(String),
}

/// 尺码表，按胸围升序排列，构造后只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GarmentMeasurements>", into = "Vec<GarmentMeasurements>")]
pub struct SizeCatalog {
  entries: Box<[GarmentMeasurements]>,
}

impl SizeCatalog {
  pub fn new(entries: Vec<GarmentMeasurements>) -> Result<Self, CatalogError> {
    if entries.is_empty() {
      return Err(CatalogError::Empty);
    }

    for (i, entry) in entries.iter().enumerate() {
      if entries[..i].iter().any(|e| e.size == entry.size) {
        return Err(CatalogError::DuplicateSize(entry.size));
      }
    }

    if let Some(pair) = entries.windows(2).find(|w| w[1].chest_cm < w[0].chest_cm) {
      return Err(CatalogError::NotAscending {
        prev: pair[0].size,
        prev_chest: pair[0].chest_cm,
        next: pair[1].size,
        next_chest: pair[1].chest_cm,
      });
    }

    Ok(Self {
      entries: entries.into_boxed_slice(),
    })
  }

  pub fn standard_shirt() -> Self {
    Self {
      entries: Box::new(STANDARD_SHIRT),
    }
  }

  pub fn get(&self, size: GarmentSize) -> Option<&GarmentMeasurements> {
    self.entries.iter().find(|e| e.size == size)
  }

  /// 尺码在表中的位置，尺码之间的排序依据
  pub fn index_of(&self, size: GarmentSize) -> Option<usize> {
    self.entries.iter().position(|e| e.size == size)
  }

  pub fn sizes(&self) -> Vec<GarmentSize> {
    self.entries.iter().map(|e| e.size).collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &GarmentMeasurements> {
    self.entries.iter()
  }

  pub fn entries(&self) -> &[GarmentMeasurements] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Default for SizeCatalog {
  fn default() -> Self {
    Self::standard_shirt()
  }
}

impl TryFrom<Vec<GarmentMeasurements>> for SizeCatalog {
  type Error = CatalogError;

  fn try_from(entries: Vec<GarmentMeasurements>) -> Result<Self, Self::Error> {
    Self::new(entries)
  }
}

impl From<SizeCatalog> for Vec<GarmentMeasurements> {
  fn from(catalog: SizeCatalog) -> Self {
    catalog.entries.into_vec()
  }
}

/// 合身容差（厘米），差值为成衣胸围减去人体胸围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitToleranceConfig {
  /// 差值在 ±perfect_range 内视为合身
  pub perfect_range: f32,
  /// 差值不小于该值时一定偏松
  pub loose_threshold: f32,
  /// 差值不大于该值（负数）时一定偏紧
  pub tight_threshold: f32,
}

impl FitToleranceConfig {
  pub fn validate(&self) -> Result<(), CatalogError> {
    if !(self.perfect_range >= 0.0) {
      return Err(CatalogError::InvalidTolerance(format!(
        "perfect_range 必须非负, 实际 {}",
        self.perfect_range
      )));
    }
    if !(self.tight_threshold <= -self.perfect_range) {
      return Err(CatalogError::InvalidTolerance(format!(
        "tight_threshold ({}) 必须不大于 -perfect_range ({})",
        self.tight_threshold, -self.perfect_range
      )));
    }
    if !(self.loose_threshold >= self.perfect_range) {
      return Err(CatalogError::InvalidTolerance(format!(
        "loose_threshold ({}) 必须不小于 perfect_range ({})",
        self.loose_threshold, self.perfect_range
      )));
    }
    Ok(())
  }
}

impl Default for FitToleranceConfig {
  fn default() -> Self {
    Self {
      perfect_range: 2.0,
      loose_threshold: 8.0,
      tight_threshold: -3.0,
    }
  }
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("尺码配置错误: {0}")]
  CatalogError(#[from] CatalogError),
}

/// 进程级只读尺码配置，构造时注入评分与合成两个组件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizingConfig {
  #[serde(default)]
  pub catalog: SizeCatalog,
  #[serde(default)]
  pub tolerance: FitToleranceConfig,
}

impl SizingConfig {
  pub fn new(catalog: SizeCatalog, tolerance: FitToleranceConfig) -> Result<Self, CatalogError> {
    tolerance.validate()?;
    Ok(Self { catalog, tolerance })
  }

  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    let config: SizingConfig = serde_json::from_str(json)?;
    config.tolerance.validate()?;
    Ok(config)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let config = Self::from_json_str(&content)?;
    info!(
      "已加载尺码配置: {} ({} 个尺码)",
      path.display(),
      config.catalog.len()
    );
    Ok(config)
  }
}
