// 该文件是 Chima （尺码） 项目的一部分。
// src/compose/placement.rs - 服装放置位置计算
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

use tracing::debug;

use super::{ComposeError, style::FitStyle};
use crate::pose::PoseLandmarks;

/// 放置锚点：服装水平中心与上边缘（像素，可能落在图像外）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
  pub center_x: i64,
  pub top_y: i64,
}

/// 裁剪到人物图像范围内的放置矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

/// 有肩部关键点时以肩部为准，否则按图像几何取默认位置
pub fn placement_anchor(
  person_width: u32,
  person_height: u32,
  landmarks: Option<&PoseLandmarks>,
  style: &FitStyle,
) -> Anchor {
  match landmarks.and_then(PoseLandmarks::shoulders) {
    Some(shoulders) => {
      let left_x = shoulders.left.x as i64;
      let right_x = shoulders.right.x as i64;
      let shoulder_y = ((shoulders.left.y + shoulders.right.y) / 2.0) as i64;
      Anchor {
        center_x: (left_x + right_x).div_euclid(2),
        top_y: shoulder_y - style.shoulder_lift,
      }
    }
    None => Anchor {
      center_x: (person_width / 2) as i64,
      top_y: (person_height / 4) as i64 + style.fallback_shift,
    },
  }
}

/// 把 `garment_width` x `garment_height` 的服装按锚点放到人物图像上并裁剪
///
/// 矩形被挤到图像内部；若裁剪后面积为零，或服装在两个方向上都超出人物图像，
/// 则视为无法放置。
pub fn clip_placement(
  anchor: Anchor,
  garment_width: u32,
  garment_height: u32,
  person_width: u32,
  person_height: u32,
) -> Result<Placement, ComposeError> {
  let degenerate = || ComposeError::DegenerateGeometry {
    garment_width,
    garment_height,
    person_width,
    person_height,
  };

  if garment_width > person_width && garment_height > person_height {
    return Err(degenerate());
  }

  let (gw, gh) = (garment_width as i64, garment_height as i64);
  let (pw, ph) = (person_width as i64, person_height as i64);

  let start_x = (anchor.center_x - gw / 2).min(pw - gw).max(0);
  let start_y = anchor.top_y.min(ph - gh).max(0);
  let end_x = (start_x + gw).min(pw);
  let end_y = (start_y + gh).min(ph);

  if end_x <= start_x || end_y <= start_y {
    return Err(degenerate());
  }

  let placement = Placement {
    x: start_x as u32,
    y: start_y as u32,
    width: (end_x - start_x) as u32,
    height: (end_y - start_y) as u32,
  };
  debug!(
    "放置区域: ({}, {}) {}x{}，服装 {}x{}",
    placement.x, placement.y, placement.width, placement.height, garment_width, garment_height
  );
  Ok(placement)
}
