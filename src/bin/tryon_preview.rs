// 该文件是 Chima （尺码） 项目的一部分。
// src/bin/tryon_preview.rs - 试穿预览命令行
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

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use chima::{
  FromUrl, Gender, PoseLandmarks, SizingConfig, TryOnRequest, TryOnTask,
  input::ImageFileInput,
  output::{Render, SaveImageFileOutput},
};

/// Chima 试穿预览参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 人物图像，例如 image:///data/person.jpg
  #[arg(long, value_name = "SOURCE")]
  pub person: Url,
  /// 服装图像
  #[arg(long, value_name = "SOURCE")]
  pub garment: Url,
  /// 胸围（厘米）
  #[arg(long, value_name = "CM")]
  pub chest: f32,
  /// 身高（厘米）
  #[arg(long, value_name = "CM")]
  pub height: f32,
  /// 所选尺码，无法识别时使用 M
  #[arg(long, default_value = "M", value_name = "SIZE")]
  pub size: String,
  /// 性别: male / female / unspecified
  #[arg(long, default_value = "unspecified", value_name = "GENDER")]
  pub gender: String,
  /// 姿态关键点 JSON 文件（序号映射或数组）
  #[arg(long, value_name = "FILE")]
  pub landmarks: Option<PathBuf>,
  /// 尺码表与容差 JSON 文件，缺省使用标准衬衫尺码
  #[arg(long, value_name = "FILE")]
  pub sizing_config: Option<PathBuf>,
  /// 试穿预览输出，例如 image:///tmp/preview.png
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 尺码对比图输出
  #[arg(long, value_name = "OUTPUT")]
  pub grid: Option<Url>,
}

fn load_landmarks(path: &Path) -> Result<PoseLandmarks> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("无法读取关键点文件: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("无法解析关键点文件: {}", path.display()))
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("人物图像: {}", args.person);
  info!("服装图像: {}", args.garment);
  info!("输出路径: {}", args.output);

  let config = match &args.sizing_config {
    Some(path) => SizingConfig::from_json_file(path)
      .with_context(|| format!("无法加载尺码配置: {}", path.display()))?,
    None => SizingConfig::default(),
  };
  let landmarks = args.landmarks.as_deref().map(load_landmarks).transpose()?;

  let person = ImageFileInput::from_url(&args.person)?.into_image();
  let garment = ImageFileInput::from_url(&args.garment)?.into_image();
  let output = SaveImageFileOutput::from_url(&args.output)?;
  let grid_output = args
    .grid
    .as_ref()
    .map(SaveImageFileOutput::from_url)
    .transpose()?;

  let task = TryOnTask::new(Arc::new(config))?;
  let request = TryOnRequest::new(args.chest, args.height)
    .with_size(args.size.as_str())
    .with_gender(Gender::from(args.gender.as_str()))
    .with_landmarks(landmarks);

  let now = std::time::Instant::now();
  let result = task.run(&person, &garment, &request)?;
  info!("合成完成，耗时: {:.2?}", now.elapsed());

  output.render_result(&result.preview)?;
  if let Some(grid_output) = grid_output {
    grid_output.render_result(&result.comparison_grid)?;
  }

  println!("{}", serde_json::to_string_pretty(&result.report)?);

  Ok(())
}
