// 该文件是 Chima （尺码） 项目的一部分。
// src/compose.rs - 试穿效果合成
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

use ab_glyph::FontArc;
use image::{GrayImage, Rgb, RgbImage, imageops, imageops::FilterType};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  catalog::SizingConfig,
  fit::{FitAnalysis, FitEngine, FitError},
  pose::PoseLandmarks,
  size::{FitType, GarmentSize, Gender},
};

pub mod filter;
pub mod label;
pub mod placement;
pub mod style;

use self::{
  filter::{
    SHADOW_WEIGHT, add_weighted, apply_post_filter, drape_shadow, edge_highlight, tension_edges,
  },
  label::FitIndicator,
  placement::{Placement, clip_placement, placement_anchor},
  style::FitStyle,
};

/// 对比图中展示的尺码
pub const GRID_SIZES: [GarmentSize; 3] = [GarmentSize::S, GarmentSize::M, GarmentSize::L];
pub const TILE_WIDTH: u32 = 300;
pub const TILE_HEIGHT: u32 = 400;

const RESIZE_FILTER: FilterType = FilterType::Triangle;

#[derive(Error, Debug)]
pub enum ComposeError {
  #[error("图像解码错误: {0}")]
  ImageDecode(String),
  #[error(
    "放置区域退化: 服装 {garment_width}x{garment_height} 无法放入 {person_width}x{person_height} 的人物图像"
  )]
  DegenerateGeometry {
    garment_width: u32,
    garment_height: u32,
    person_width: u32,
    person_height: u32,
  },
  #[error("字体加载错误: {0}")]
  Font(#[from] ab_glyph::InvalidFont),
  #[error("合身分析错误: {0}")]
  Fit(#[from] FitError),
}

/// 从编码后的图像数据（PNG、JPEG）解码为 RGB 图像
pub fn decode_rgb_image(bytes: &[u8]) -> Result<RgbImage, ComposeError> {
  let image = image::load_from_memory(bytes)
    .map_err(|e| ComposeError::ImageDecode(e.to_string()))?
    .into_rgb8();
  ensure_raster(&image, "解码结果")?;
  Ok(image)
}

/// 由按行排列的 RGB 原始数据构造图像
pub fn rgb_image_from_raw(
  width: u32,
  height: u32,
  data: Vec<u8>,
) -> Result<RgbImage, ComposeError> {
  let len = data.len();
  let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
    ComposeError::ImageDecode(format!(
      "数据长度不匹配: 期望长度 {}, 实际长度 {}",
      3 * width as usize * height as usize,
      len
    ))
  })?;
  ensure_raster(&image, "原始数据")?;
  Ok(image)
}

fn ensure_raster(image: &RgbImage, what: &str) -> Result<(), ComposeError> {
  if image.width() == 0 || image.height() == 0 {
    return Err(ComposeError::ImageDecode(format!(
      "{}尺寸为零: {}x{}",
      what,
      image.width(),
      image.height()
    )));
  }
  Ok(())
}

enum Overlay {
  Plain,
  Tension(GrayImage),
  Shadow(RgbImage),
}

/// 试穿效果合成器
///
/// 所有输入都不会被修改，每次调用都生成新的图像；相同输入得到逐字节相同的输出。
pub struct Compositor {
  engine: FitEngine,
  indicator: FitIndicator,
}

impl Compositor {
  pub fn new(config: Arc<SizingConfig>) -> Result<Self, ComposeError> {
    let font_data: &'static [u8] = include_bytes!("../assets/DejaVuSans.ttf");
    let font = FontArc::try_from_slice(font_data)?;
    Ok(Self {
      engine: FitEngine::new(config),
      indicator: FitIndicator::new(font),
    })
  }

  pub fn engine(&self) -> &FitEngine {
    &self.engine
  }

  /// 按合身分析结果变形服装图像，放到人物图像上混合，并绘制合身标识
  pub fn composite(
    &self,
    person: &RgbImage,
    garment: &RgbImage,
    analysis: &FitAnalysis,
    landmarks: Option<&PoseLandmarks>,
  ) -> Result<RgbImage, ComposeError> {
    ensure_raster(person, "人物图像")?;
    ensure_raster(garment, "服装图像")?;

    let style = FitStyle::for_analysis(analysis);
    let (person_width, person_height) = person.dimensions();
    let (garment_width, garment_height) = style.garment_size(garment.width(), garment.height());

    let anchor = placement_anchor(person_width, person_height, landmarks, &style);
    let placement = clip_placement(
      anchor,
      garment_width,
      garment_height,
      person_width,
      person_height,
    )?;

    let resized = imageops::resize(garment, garment_width, garment_height, RESIZE_FILTER);
    let mut filtered = apply_post_filter(&resized, style.filter);
    if (placement.width, placement.height) != (garment_width, garment_height) {
      debug!(
        "服装 {}x{} 超出图像范围，缩放到 {}x{}",
        garment_width, garment_height, placement.width, placement.height
      );
      filtered = imageops::resize(&filtered, placement.width, placement.height, RESIZE_FILTER);
    }

    let mut result = person.clone();
    blend(&mut result, &filtered, placement, &style);
    self
      .indicator
      .draw(&mut result, analysis, style.label_color);

    debug!(
      "合成完成: 尺码 {} ({}), 锚点 ({}, {})",
      analysis.selected_size, analysis.fit_type, anchor.center_x, anchor.top_y
    );
    Ok(result)
  }

  /// 分别合成 S、M、L 三个尺码的效果，缩放到统一大小后按尺码表顺序横向拼接
  pub fn comparison_grid(
    &self,
    person: &RgbImage,
    garment: &RgbImage,
    person_chest_cm: f32,
    person_height_cm: f32,
    gender: Gender,
    landmarks: Option<&PoseLandmarks>,
  ) -> Result<RgbImage, ComposeError> {
    let catalog = &self.engine.config().catalog;
    let mut sizes = GRID_SIZES.to_vec();
    sizes.sort_by_key(|size| catalog.index_of(*size).unwrap_or(usize::MAX));

    let tiles = sizes
      .par_iter()
      .map(|&size| {
        let analysis = self
          .engine
          .analyze_fit(person_chest_cm, person_height_cm, size, gender)?;
        let preview = self.composite(person, garment, &analysis, landmarks)?;
        Ok(imageops::resize(
          &preview,
          TILE_WIDTH,
          TILE_HEIGHT,
          RESIZE_FILTER,
        ))
      })
      .collect::<Result<Vec<_>, ComposeError>>()?;

    let mut grid = RgbImage::new(TILE_WIDTH * tiles.len() as u32, TILE_HEIGHT);
    for (i, tile) in tiles.iter().enumerate() {
      imageops::replace(&mut grid, tile, i as i64 * TILE_WIDTH as i64, 0);
    }

    info!(
      "尺码对比图完成: {}x{} ({} 个尺码)",
      grid.width(),
      grid.height(),
      tiles.len()
    );
    Ok(grid)
  }
}

/// 在放置区域内混合服装，`garment` 的尺寸与放置区域一致
fn blend(result: &mut RgbImage, garment: &RgbImage, at: Placement, style: &FitStyle) {
  let alpha = style.alpha;
  let overlay = match style.fit_type {
    FitType::Tight => Overlay::Tension(tension_edges(garment)),
    FitType::Loose => Overlay::Shadow(drape_shadow(garment)),
    FitType::Perfect => Overlay::Plain,
  };

  for (gx, gy, cloth) in garment.enumerate_pixels() {
    let (x, y) = (at.x + gx, at.y + gy);
    let base = *result.get_pixel(x, y);
    let pixel = match &overlay {
      Overlay::Plain => add_weighted(base, 1.0 - alpha, *cloth, alpha),
      Overlay::Tension(edges) => {
        let blended = add_weighted(base, 1.0 - alpha, *cloth, alpha);
        let boost = edge_highlight(edges.get_pixel(gx, gy)[0]);
        Rgb(blended.0.map(|v| v.saturating_add(boost)))
      }
      Overlay::Shadow(shadow) => {
        let shaded = add_weighted(
          base,
          1.0 - SHADOW_WEIGHT,
          *shadow.get_pixel(gx, gy),
          SHADOW_WEIGHT,
        );
        add_weighted(shaded, 1.0 - alpha, *cloth, alpha)
      }
    };
    result.put_pixel(x, y, pixel);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    catalog::{FitToleranceConfig, GarmentMeasurements, SizeCatalog},
    pose::{LEFT_SHOULDER, Landmark, RIGHT_SHOULDER},
  };

  const PERSON: Rgb<u8> = Rgb([10, 20, 30]);
  const CLOTH: Rgb<u8> = Rgb([200, 100, 50]);

  fn compositor() -> Compositor {
    Compositor::new(Arc::new(SizingConfig::default())).unwrap()
  }

  fn person() -> RgbImage {
    RgbImage::from_pixel(400, 600, PERSON)
  }

  fn striped_garment() -> RgbImage {
    RgbImage::from_fn(100, 80, |x, _| if x % 20 < 10 { CLOTH } else { Rgb([240, 240, 240]) })
  }

  fn analysis(size: GarmentSize) -> FitAnalysis {
    compositor()
      .engine()
      .analyze_fit(93.0, 175.0, size, Gender::Male)
      .unwrap()
  }

  /// 无关键点时的放置区域，以及滤波后（裁剪时重新缩放）的服装
  fn prepared_garment(
    person: &RgbImage,
    garment: &RgbImage,
    analysis: &FitAnalysis,
  ) -> (Placement, RgbImage) {
    let style = FitStyle::for_analysis(analysis);
    let (width, height) = style.garment_size(garment.width(), garment.height());
    let anchor = placement_anchor(person.width(), person.height(), None, &style);
    let placement =
      clip_placement(anchor, width, height, person.width(), person.height()).unwrap();
    let resized = imageops::resize(garment, width, height, RESIZE_FILTER);
    let mut filtered = apply_post_filter(&resized, style.filter);
    if (placement.width, placement.height) != (width, height) {
      filtered = imageops::resize(&filtered, placement.width, placement.height, RESIZE_FILTER);
    }
    (placement, filtered)
  }

  #[test]
  fn perfect_fit_blends_inside_placement_only() {
    let compositor = compositor();
    let perfect = analysis(GarmentSize::S);
    assert_eq!(perfect.fit_type, FitType::Perfect);

    let garment = RgbImage::from_pixel(100, 80, CLOTH);
    let result = compositor
      .composite(&person(), &garment, &perfect, None)
      .unwrap();

    assert_eq!(result.dimensions(), (400, 600));
    // 放置区域: x 150..250, y 150..230
    assert_eq!(result.get_pixel(200, 200), &Rgb([162, 84, 46]));
    assert_eq!(result.get_pixel(200, 240), &PERSON);
    assert_eq!(result.get_pixel(20, 500), &PERSON);
  }

  #[test]
  fn indicator_has_background_box() {
    let result = compositor()
      .composite(
        &person(),
        &striped_garment(),
        &analysis(GarmentSize::M),
        None,
      )
      .unwrap();
    assert_eq!(result.get_pixel(6, 33), &Rgb([0, 0, 0]));
  }

  #[test]
  fn fit_types_render_differently() {
    let compositor = compositor();
    let person = person();
    let garment = striped_garment();
    let pose = PoseLandmarks::new()
      .with(LEFT_SHOULDER, Landmark::new(260.0, 150.0))
      .with(RIGHT_SHOULDER, Landmark::new(140.0, 150.0));

    let tight = analysis(GarmentSize::XS);
    let loose = analysis(GarmentSize::L);
    assert_eq!(tight.fit_type, FitType::Tight);
    assert_eq!(loose.fit_type, FitType::Loose);

    let tight = compositor
      .composite(&person, &garment, &tight, Some(&pose))
      .unwrap();
    let loose = compositor
      .composite(&person, &garment, &loose, Some(&pose))
      .unwrap();
    assert_ne!(tight, loose);
    assert_ne!(tight, person);
  }

  #[test]
  fn tight_fit_highlights_garment_edges() {
    let person = person();
    let garment = RgbImage::from_fn(400, 300, |x, _| {
      if x % 80 < 40 { CLOTH } else { Rgb([250, 250, 250]) }
    });
    let tight = analysis(GarmentSize::XS);
    assert_eq!(tight.fit_type, FitType::Tight);

    let result = compositor()
      .composite(&person, &garment, &tight, None)
      .unwrap();
    let (placement, filtered) = prepared_garment(&person, &garment, &tight);
    let edges = tension_edges(&filtered);
    let (gx, gy, edge) = edges
      .enumerate_pixels()
      .find(|(_, _, e)| e[0] > 0)
      .map(|(x, y, e)| (x, y, e[0]))
      .expect("条纹边界应检测到边缘");

    let alpha = FitStyle::for_analysis(&tight).alpha;
    let plain = add_weighted(PERSON, 1.0 - alpha, *filtered.get_pixel(gx, gy), alpha);
    let expected = Rgb(plain.0.map(|v| v.saturating_add(edge_highlight(edge))));
    let pixel = *result.get_pixel(placement.x + gx, placement.y + gy);
    assert_eq!(pixel, expected);
    assert!(pixel.0.iter().zip(plain.0).all(|(p, q)| *p >= q));
    assert_ne!(pixel, plain);
  }

  #[test]
  fn loose_fit_blends_drape_shadow_first() {
    let person = person();
    let garment = striped_garment();
    let loose = analysis(GarmentSize::L);
    assert_eq!(loose.fit_type, FitType::Loose);

    let result = compositor()
      .composite(&person, &garment, &loose, None)
      .unwrap();
    let (placement, filtered) = prepared_garment(&person, &garment, &loose);
    let shadow = drape_shadow(&filtered);
    let alpha = FitStyle::for_analysis(&loose).alpha;
    assert_eq!(alpha, 0.65);

    let corner = (placement.width - 1, placement.height - 1);
    for (gx, gy) in [(0, 0), (40, 50), (55, 10), corner] {
      let shaded = add_weighted(
        PERSON,
        1.0 - SHADOW_WEIGHT,
        *shadow.get_pixel(gx, gy),
        SHADOW_WEIGHT,
      );
      let expected = add_weighted(shaded, 1.0 - alpha, *filtered.get_pixel(gx, gy), alpha);
      assert_eq!(
        result.get_pixel(placement.x + gx, placement.y + gy),
        &expected
      );
    }
  }

  #[test]
  fn garment_clipped_on_one_axis_is_rescaled_into_frame() {
    let person = RgbImage::from_pixel(400, 100, PERSON);
    let garment = RgbImage::from_fn(120, 200, |_, y| Rgb([200, (y / 2) as u8, 50]));
    let loose = analysis(GarmentSize::L);

    let (width, height) = FitStyle::for_analysis(&loose).garment_size(120, 200);
    assert!(width < 400 && height > 100);
    let (placement, filtered) = prepared_garment(&person, &garment, &loose);
    assert_eq!((placement.y, placement.width, placement.height), (0, width, 100));
    assert_eq!(filtered.dimensions(), (width, 100));

    let result = compositor()
      .composite(&person, &garment, &loose, None)
      .unwrap();
    assert_eq!(result.dimensions(), (400, 100));

    // 最后一行即被裁剪的下边缘
    let shadow = drape_shadow(&filtered);
    let alpha = FitStyle::for_analysis(&loose).alpha;
    let (x, y) = (200, 99);
    let (gx, gy) = (x - placement.x, y - placement.y);
    let shaded = add_weighted(
      PERSON,
      1.0 - SHADOW_WEIGHT,
      *shadow.get_pixel(gx, gy),
      SHADOW_WEIGHT,
    );
    let expected = add_weighted(shaded, 1.0 - alpha, *filtered.get_pixel(gx, gy), alpha);
    assert_eq!(result.get_pixel(x, y), &expected);
    assert_ne!(result.get_pixel(x, y), &PERSON);
    assert_eq!(result.get_pixel(placement.x - 1, y), &PERSON);
  }

  #[test]
  fn composite_is_deterministic() {
    let compositor = compositor();
    let analysis = analysis(GarmentSize::XS);
    let first = compositor
      .composite(&person(), &striped_garment(), &analysis, None)
      .unwrap();
    let second = compositor
      .composite(&person(), &striped_garment(), &analysis, None)
      .unwrap();
    assert_eq!(first.as_raw(), second.as_raw());
  }

  #[test]
  fn tiny_person_cannot_host_overlay() {
    let small = RgbImage::from_pixel(40, 40, PERSON);
    let garment = RgbImage::from_pixel(100, 100, CLOTH);
    let result = compositor().composite(&small, &garment, &analysis(GarmentSize::S), None);
    assert!(matches!(
      result,
      Err(ComposeError::DegenerateGeometry { .. })
    ));
  }

  #[test]
  fn empty_rasters_are_rejected() {
    let empty = RgbImage::new(0, 0);
    let result = compositor().composite(&person(), &empty, &analysis(GarmentSize::S), None);
    assert!(matches!(result, Err(ComposeError::ImageDecode(_))));

    assert!(matches!(
      rgb_image_from_raw(4, 4, vec![0; 10]),
      Err(ComposeError::ImageDecode(_))
    ));
    assert!(matches!(
      decode_rgb_image(b"not an image"),
      Err(ComposeError::ImageDecode(_))
    ));
    assert_eq!(
      rgb_image_from_raw(2, 1, vec![1, 2, 3, 4, 5, 6])
        .unwrap()
        .get_pixel(1, 0),
      &Rgb([4, 5, 6])
    );
  }

  #[test]
  fn grid_has_three_tiles() {
    let compositor = compositor();
    let grid = compositor
      .comparison_grid(
        &person(),
        &striped_garment(),
        93.0,
        175.0,
        Gender::Male,
        None,
      )
      .unwrap();
    assert_eq!(grid.dimensions(), (3 * TILE_WIDTH, TILE_HEIGHT));

    let again = compositor
      .comparison_grid(
        &person(),
        &striped_garment(),
        93.0,
        175.0,
        Gender::Male,
        None,
      )
      .unwrap();
    assert_eq!(grid, again);
  }

  #[test]
  fn grid_follows_catalog_position() {
    // 尺码表位置与枚举声明顺序不同
    let catalog = SizeCatalog::new(vec![
      GarmentMeasurements::new(GarmentSize::L, 90.0, 70.0, 46.0, 63.0),
      GarmentMeasurements::new(GarmentSize::S, 95.0, 70.0, 46.0, 63.0),
      GarmentMeasurements::new(GarmentSize::M, 100.0, 70.0, 46.0, 63.0),
    ])
    .unwrap();
    let config = SizingConfig::new(catalog, FitToleranceConfig::default()).unwrap();
    let compositor = Compositor::new(Arc::new(config)).unwrap();
    let (person, garment) = (person(), striped_garment());

    let grid = compositor
      .comparison_grid(&person, &garment, 93.0, 175.0, Gender::Male, None)
      .unwrap();
    let tile = |size| {
      let analysis = compositor
        .engine()
        .analyze_fit(93.0, 175.0, size, Gender::Male)
        .unwrap();
      let preview = compositor
        .composite(&person, &garment, &analysis, None)
        .unwrap();
      imageops::resize(&preview, TILE_WIDTH, TILE_HEIGHT, RESIZE_FILTER)
    };
    let tile_at = |i: u32| {
      imageops::crop_imm(&grid, i * TILE_WIDTH, 0, TILE_WIDTH, TILE_HEIGHT).to_image()
    };

    assert_eq!(tile_at(0), tile(GarmentSize::L));
    assert_eq!(tile_at(1), tile(GarmentSize::S));
    assert_eq!(tile_at(2), tile(GarmentSize::M));
  }
}
