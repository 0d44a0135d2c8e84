// 该文件是 Chima （尺码） 项目的一部分。
// src/size.rs - 尺码、性别与合身类型定义
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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// 服装尺码
///
/// 枚举顺序只用于展示，尺码之间的大小关系以尺码表中的位置为准。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GarmentSize {
  XS,
  S,
  M,
  L,
  XL,
  XXL,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知尺码标签: {0}")]
pub struct ParseSizeError(pub String);

impl GarmentSize {
  pub const ALL: [GarmentSize; 6] = [
    GarmentSize::XS,
    GarmentSize::S,
    GarmentSize::M,
    GarmentSize::L,
    GarmentSize::XL,
    GarmentSize::XXL,
  ];

  /// 无法识别的标签回退到的尺码
  pub const FALLBACK: GarmentSize = GarmentSize::M;

  pub fn as_label(&self) -> &'static str {
    match self {
      GarmentSize::XS => "XS",
      GarmentSize::S => "S",
      GarmentSize::M => "M",
      GarmentSize::L => "L",
      GarmentSize::XL => "XL",
      GarmentSize::XXL => "XXL",
    }
  }

  /// 宽松解析尺码标签，无法识别时回退到 `M`
  pub fn parse_lenient(label: &str) -> GarmentSize {
    match label.parse() {
      Ok(size) => size,
      Err(err) => {
        warn!("{}，使用默认尺码 {}", err, Self::FALLBACK);
        Self::FALLBACK
      }
    }
  }
}

impl FromStr for GarmentSize {
  type Err = ParseSizeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let upper = s.trim().to_ascii_uppercase();
    GarmentSize::ALL
      .into_iter()
      .find(|size| size.as_label() == upper)
      .ok_or_else(|| ParseSizeError(s.to_string()))
  }
}

impl fmt::Display for GarmentSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_label())
  }
}

/// 性别偏好，影响推荐尺码时的舒适余量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  #[default]
  Unspecified,
}

impl Gender {
  /// 胸围舒适余量（厘米）
  pub fn chest_allowance_cm(&self) -> f32 {
    match self {
      Gender::Male => 4.0,
      Gender::Female => 2.0,
      Gender::Unspecified => 3.0,
    }
  }
}

impl From<&str> for Gender {
  fn from(value: &str) -> Self {
    match value.trim().to_ascii_lowercase().as_str() {
      "male" => Gender::Male,
      "female" => Gender::Female,
      _ => Gender::Unspecified,
    }
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Gender::Male => f.write_str("male"),
      Gender::Female => f.write_str("female"),
      Gender::Unspecified => f.write_str("unspecified"),
    }
  }
}

/// 合身类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitType {
  Tight,
  Perfect,
  Loose,
}

impl FitType {
  pub fn title(&self) -> &'static str {
    match self {
      FitType::Tight => "Tight",
      FitType::Perfect => "Perfect",
      FitType::Loose => "Loose",
    }
  }
}

impl fmt::Display for FitType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FitType::Tight => f.write_str("tight"),
      FitType::Perfect => f.write_str("perfect"),
      FitType::Loose => f.write_str("loose"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!("xl".parse::<GarmentSize>(), Ok(GarmentSize::XL));
    assert_eq!(" Xxl ".parse::<GarmentSize>(), Ok(GarmentSize::XXL));
    assert!("XXXL".parse::<GarmentSize>().is_err());
  }

  #[test]
  fn lenient_parse_falls_back_to_medium() {
    assert_eq!(GarmentSize::parse_lenient("s"), GarmentSize::S);
    assert_eq!(GarmentSize::parse_lenient("huge"), GarmentSize::M);
    assert_eq!(GarmentSize::parse_lenient(""), GarmentSize::M);
  }

  #[test]
  fn unknown_gender_is_unspecified() {
    assert_eq!(Gender::from("MALE"), Gender::Male);
    assert_eq!(Gender::from("Female"), Gender::Female);
    assert_eq!(Gender::from("unisex"), Gender::Unspecified);
    assert_eq!(Gender::from("other"), Gender::Unspecified);
    assert_eq!(Gender::Unspecified.chest_allowance_cm(), 3.0);
  }

  #[test]
  fn fit_type_serializes_lowercase() {
    let json = serde_json::to_string(&FitType::Perfect).unwrap();
    assert_eq!(json, "\"perfect\"");
    let size = serde_json::to_string(&GarmentSize::XXL).unwrap();
    assert_eq!(size, "\"XXL\"");
  }
}
