//! Material layer metadata: domain, stages, material parameters and scene resources.

use bitflags::bitflags;

use crate::{
  types::ValueType,
  value::{Literal, Value},
};

/// Rendering context of a material, gating which constructs are legal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MaterialDomain {
  Surface,
  Decal,
  PostProcess,
  Terrain,
  Gui,
  Particle,
  Deformable,
}

impl MaterialDomain {
  /// Whether vertex to pixel interpolants can be used in this domain.
  pub fn supports_interpolants(self) -> bool {
    !matches!(self, MaterialDomain::Decal | MaterialDomain::PostProcess)
  }
}

impl Default for MaterialDomain {
  fn default() -> Self {
    MaterialDomain::Surface
  }
}

/// Shader stage code is being generated for.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderStage {
  Vertex,
  Pixel,
}

/// Read-only description of the material being generated.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MaterialLayer {
  pub domain: MaterialDomain,
}

impl MaterialLayer {
  pub fn new(domain: MaterialDomain) -> Self {
    MaterialLayer { domain }
  }
}

bitflags! {
  /// Features used by a generated material, so that the pipeline can set up its inputs.
  #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
  pub struct UsageFlags: u32 {
    const USE_VERTEX_COLOR = 1 << 0;
    const USE_SCENE_DEPTH = 1 << 1;
    const USE_INTERPOLANTS = 1 << 2;
    const USE_FUNCTIONS = 1 << 3;
    const USE_CUSTOM_CODE = 1 << 4;
  }
}

/// Scene resources a material can sample, registered on first use.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SceneTexture {
  SceneDepth,
}

impl SceneTexture {
  /// Name of the resource in the generated code.
  pub const fn shader_name(self) -> &'static str {
    match self {
      SceneTexture::SceneDepth => "SceneDepthTexture",
    }
  }
}

/// Inputs of the material output node.
///
/// The discriminant of a parameter is the id of its box on the material output node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MaterialParam {
  Color = 0,
  Mask = 1,
  Emissive = 2,
  Metalness = 3,
  Specular = 4,
  Roughness = 5,
  AmbientOcclusion = 6,
  Normal = 7,
  Opacity = 8,
  Refraction = 9,
  SubsurfaceColor = 10,
  PositionOffset = 11,
  TessellationMultiplier = 12,
  WorldDisplacement = 13,
}

impl MaterialParam {
  pub const ALL: &'static [MaterialParam] = &[
    MaterialParam::Color,
    MaterialParam::Mask,
    MaterialParam::Emissive,
    MaterialParam::Metalness,
    MaterialParam::Specular,
    MaterialParam::Roughness,
    MaterialParam::AmbientOcclusion,
    MaterialParam::Normal,
    MaterialParam::Opacity,
    MaterialParam::Refraction,
    MaterialParam::SubsurfaceColor,
    MaterialParam::PositionOffset,
    MaterialParam::TessellationMultiplier,
    MaterialParam::WorldDisplacement,
  ];

  /// Box id on the material output node.
  pub const fn box_id(self) -> u32 {
    self as u32
  }

  /// Stage the parameter is written in.
  pub const fn stage(self) -> ShaderStage {
    match self {
      MaterialParam::PositionOffset
      | MaterialParam::TessellationMultiplier
      | MaterialParam::WorldDisplacement => ShaderStage::Vertex,
      _ => ShaderStage::Pixel,
    }
  }

  /// Field of the `Material` structure written with the parameter.
  pub const fn target(self) -> &'static str {
    match self {
      MaterialParam::Color => "Color",
      MaterialParam::Mask => "Mask",
      MaterialParam::Emissive => "Emissive",
      MaterialParam::Metalness => "Metalness",
      MaterialParam::Specular => "Specular",
      MaterialParam::Roughness => "Roughness",
      MaterialParam::AmbientOcclusion => "AO",
      MaterialParam::Normal => "TangentNormal",
      MaterialParam::Opacity => "Opacity",
      MaterialParam::Refraction => "Refraction",
      MaterialParam::SubsurfaceColor => "SubsurfaceColor",
      MaterialParam::PositionOffset => "PositionOffset",
      MaterialParam::TessellationMultiplier => "TessellationMultiplier",
      MaterialParam::WorldDisplacement => "WorldDisplacement",
    }
  }

  /// Type of the parameter.
  pub fn ty(self) -> ValueType {
    self.default_value().ty()
  }

  /// Value written when the parameter box is not connected.
  pub fn default_value(self) -> Value {
    let lit = match self {
      MaterialParam::Color
      | MaterialParam::Emissive
      | MaterialParam::SubsurfaceColor
      | MaterialParam::PositionOffset
      | MaterialParam::WorldDisplacement => Literal::Float3([0.; 3]),
      MaterialParam::Normal => Literal::Float3([0., 0., 1.]),
      MaterialParam::Metalness => Literal::Float(0.),
      MaterialParam::Specular | MaterialParam::Roughness => Literal::Float(0.5),
      MaterialParam::Mask
      | MaterialParam::AmbientOcclusion
      | MaterialParam::Opacity
      | MaterialParam::Refraction
      | MaterialParam::TessellationMultiplier => Literal::Float(1.),
    };

    Value::literal(lit)
  }

  /// Parameters written in a given stage, in box order.
  pub fn in_stage(stage: ShaderStage) -> impl Iterator<Item = MaterialParam> {
    MaterialParam::ALL
      .iter()
      .copied()
      .filter(move |param| param.stage() == stage)
  }
}
