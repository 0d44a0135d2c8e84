// 该文件是 Chima （尺码） 项目的一部分。
// src/pose.rs - 姿态关键点
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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const LEFT_SHOULDER: u32 = 11;
pub const RIGHT_SHOULDER: u32 = 12;

/// 人物图像坐标系中的关键点（像素）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
}

impl Landmark {
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shoulders {
  pub left: Landmark,
  pub right: Landmark,
}

/// 已计算好的姿态关键点，序号与 MediaPipe Pose 一致
///
/// JSON 中既可以是 `{"11": {"x": .., "y": ..}}` 形式的映射，
/// 也可以是按序号排列的数组。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LandmarkRepr", into = "BTreeMap<u32, Landmark>")]
pub struct PoseLandmarks {
  points: BTreeMap<u32, Landmark>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
  // untagged 会先缓存内容，整数键在此之后无法直接解析，故先按字符串读取
  Map(BTreeMap<String, Landmark>),
  List(Vec<Landmark>),
}

impl TryFrom<LandmarkRepr> for PoseLandmarks {
  type Error = String;

  fn try_from(repr: LandmarkRepr) -> Result<Self, Self::Error> {
    match repr {
      LandmarkRepr::Map(map) => {
        let points = map
          .into_iter()
          .map(|(key, landmark)| {
            key
              .trim()
              .parse::<u32>()
              .map(|index| (index, landmark))
              .map_err(|_| format!("关键点序号无效: {key}"))
          })
          .collect::<Result<_, _>>()?;
        Ok(Self { points })
      }
      LandmarkRepr::List(list) => Ok(Self::from_points(list)),
    }
  }
}

impl From<PoseLandmarks> for BTreeMap<u32, Landmark> {
  fn from(pose: PoseLandmarks) -> Self {
    pose.points
  }
}

impl PoseLandmarks {
  pub fn new() -> Self {
    Self::default()
  }

  /// 以在序列中的位置作为序号
  pub fn from_points(points: impl IntoIterator<Item = Landmark>) -> Self {
    Self {
      points: (0u32..).zip(points).collect(),
    }
  }

  pub fn with(mut self, index: u32, landmark: Landmark) -> Self {
    self.points.insert(index, landmark);
    self
  }

  pub fn get(&self, index: u32) -> Option<&Landmark> {
    self.points.get(&index)
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// 左右肩都存在时才可用
  pub fn shoulders(&self) -> Option<Shoulders> {
    let left = *self.get(LEFT_SHOULDER)?;
    let right = *self.get(RIGHT_SHOULDER)?;
    Some(Shoulders { left, right })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shoulders_need_both_points() {
    let pose = PoseLandmarks::new().with(LEFT_SHOULDER, Landmark::new(100.0, 80.0));
    assert!(pose.shoulders().is_none());

    let pose = pose.with(RIGHT_SHOULDER, Landmark::new(60.0, 84.0));
    let shoulders = pose.shoulders().unwrap();
    assert_eq!(shoulders.left.x, 100.0);
    assert_eq!(shoulders.right.y, 84.0);
  }

  #[test]
  fn deserializes_map_and_list() {
    let map: PoseLandmarks =
      serde_json::from_str(r#"{"11": {"x": 10, "y": 20}, "12": {"x": 30, "y": 22}}"#).unwrap();
    assert!(map.shoulders().is_some());

    let list: Vec<Landmark> = (0..13).map(|i| Landmark::new(i as f32, 1.0)).collect();
    let json = serde_json::to_string(&list).unwrap();
    let pose: PoseLandmarks = serde_json::from_str(&json).unwrap();
    assert_eq!(pose.len(), 13);
    assert_eq!(pose.shoulders().map(|s| s.right.x), Some(12.0));

    let roundtrip: PoseLandmarks =
      serde_json::from_str(&serde_json::to_string(&map).unwrap()).unwrap();
    assert_eq!(roundtrip, map);

    assert!(serde_json::from_str::<PoseLandmarks>(r#"{"left": {"x": 1, "y": 1}}"#).is_err());

    let short: PoseLandmarks = serde_json::from_str(r#"[{"x": 1, "y": 1}]"#).unwrap();
    assert!(short.shoulders().is_none());
  }
}
