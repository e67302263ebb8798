//! Node kinds, parameters and box layouts.
//!
//! Node kinds form a closed set: every kind is a variant of [`NodeKind`], and the generator matches on it
//! exhaustively. The `(group, op code)` pair stored in graphs is attached to each variant with `#[node(…)]` and the
//! lookup table is derived by [`NodeTable`](matgen_derive::NodeTable).

use std::fmt;

use matgen_derive::NodeTable;

use crate::{
  asset::AssetId,
  types::ValueType,
  value::{Literal, Value},
};

/// Type identifier of a node: a group and an op code within that group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeTypeId {
  pub group: u16,
  pub op: u16,
}

impl NodeTypeId {
  pub const fn new(group: u16, op: u16) -> Self {
    NodeTypeId { group, op }
  }
}

impl fmt::Display for NodeTypeId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.group, self.op)
  }
}

pub const GROUP_MATERIAL: u16 = 1;
pub const GROUP_CONSTANTS: u16 = 2;
pub const GROUP_MATH: u16 = 3;
pub const GROUP_FUNCTION: u16 = 16;

/// Every node kind known to the generator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, NodeTable)]
pub enum NodeKind {
  // material
  #[node(group = 1, op = 1)]
  MaterialOutput,
  #[node(group = 1, op = 2)]
  WorldPosition,
  #[node(group = 1, op = 3)]
  View,
  #[node(group = 1, op = 4)]
  Normal,
  #[node(group = 1, op = 5)]
  CameraVector,
  #[node(group = 1, op = 6)]
  ScreenPosition,
  #[node(group = 1, op = 7)]
  ScreenSize,
  #[node(group = 1, op = 8)]
  CustomCode,
  #[node(group = 1, op = 9)]
  ObjectPosition,
  #[node(group = 1, op = 10)]
  TwoSidedSign,
  #[node(group = 1, op = 11)]
  CameraDepthFade,
  #[node(group = 1, op = 12)]
  VertexColor,
  #[node(group = 1, op = 13, name = "Pre-skinned Local Position")]
  PreSkinnedLocalPosition,
  #[node(group = 1, op = 14, name = "Pre-skinned Local Normal")]
  PreSkinnedLocalNormal,
  #[node(group = 1, op = 15)]
  Depth,
  #[node(group = 1, op = 16)]
  Tangent,
  #[node(group = 1, op = 17)]
  Bitangent,
  #[node(group = 1, op = 18)]
  CameraPosition,
  #[node(group = 1, op = 19)]
  PerInstanceRandom,
  #[node(group = 1, op = 20, name = "Interpolate VS To PS")]
  InterpolateVsToPs,
  #[node(group = 1, op = 21)]
  TerrainHolesMask,
  #[node(group = 1, op = 22)]
  TerrainLayerWeight,
  #[node(group = 1, op = 23)]
  DepthFade,
  #[node(group = 1, op = 24)]
  MaterialFunction,
  #[node(group = 1, op = 25)]
  ObjectSize,
  #[node(group = 1, op = 48)]
  BlendNormals,

  // constants
  #[node(group = 2, op = 1)]
  Bool,
  #[node(group = 2, op = 2)]
  Integer,
  #[node(group = 2, op = 3)]
  Float,
  #[node(group = 2, op = 4)]
  Vector2,
  #[node(group = 2, op = 5)]
  Vector3,
  #[node(group = 2, op = 6)]
  Vector4,

  // math
  #[node(group = 3, op = 1)]
  Add,
  #[node(group = 3, op = 2)]
  Subtract,
  #[node(group = 3, op = 3)]
  Multiply,
  #[node(group = 3, op = 5)]
  Divide,
  #[node(group = 3, op = 6)]
  Min,
  #[node(group = 3, op = 7)]
  Max,
  #[node(group = 3, op = 8)]
  Dot,
  #[node(group = 3, op = 9)]
  Abs,
  #[node(group = 3, op = 10)]
  Saturate,
  #[node(group = 3, op = 11)]
  Normalize,

  // functions
  #[node(group = 16, op = 1)]
  FunctionInput,
  #[node(group = 16, op = 2)]
  FunctionOutput,
}

/// Direction of a box.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
  In,
  Out,
}

/// Declaration of a box in a node kind layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BoxDecl {
  pub id: u32,
  pub direction: Direction,
  pub ty: ValueType,
}

const fn input(id: u32, ty: ValueType) -> BoxDecl {
  BoxDecl {
    id,
    direction: Direction::In,
    ty,
  }
}

const fn output(id: u32, ty: ValueType) -> BoxDecl {
  BoxDecl {
    id,
    direction: Direction::Out,
    ty,
  }
}

/// Box ids of the custom code node.
pub mod custom_code {
  pub const INPUTS: u32 = 8;
  pub const OUTPUTS: u32 = 4;
  pub const FIRST_INPUT: u32 = 0;
  pub const FIRST_OUTPUT: u32 = 8;
}

/// Box ids of the material function call node.
pub mod function_call {
  pub const INPUTS: u32 = 16;
  pub const OUTPUTS: u32 = 16;
  pub const FIRST_INPUT: u32 = 0;
  pub const FIRST_OUTPUT: u32 = 16;
}

const F: ValueType = ValueType::FLOAT;
const F2: ValueType = ValueType::FLOAT2;
const F3: ValueType = ValueType::FLOAT3;
const F4: ValueType = ValueType::FLOAT4;

const SINGLE_F: &[BoxDecl] = &[output(0, F)];
const SINGLE_F3: &[BoxDecl] = &[output(0, F3)];
const SINGLE_F4: &[BoxDecl] = &[output(0, F4)];
const SINGLE_F2: &[BoxDecl] = &[output(0, F2)];
const VIEW: &[BoxDecl] = &[output(0, F3), output(1, F3), output(2, F)];
const DOUBLE_F2: &[BoxDecl] = &[output(0, F2), output(1, F2)];
const CAMERA_DEPTH_FADE: &[BoxDecl] = &[input(0, F), input(1, F), output(2, F)];
const INTERPOLATE: &[BoxDecl] = &[input(0, F4), output(1, F4)];
const BLEND_NORMALS: &[BoxDecl] = &[input(0, F3), input(1, F3), output(2, F3)];
const BOOL: &[BoxDecl] = &[output(0, ValueType::Bool)];
const INTEGER: &[BoxDecl] = &[output(0, ValueType::Int)];
const FUNCTION_INPUT: &[BoxDecl] = &[output(0, F4), input(1, F4)];
const FUNCTION_OUTPUT: &[BoxDecl] = &[input(0, F4)];
const BINARY_OP: &[BoxDecl] = &[input(0, F4), input(1, F4), output(2, F4)];
const UNARY_OP: &[BoxDecl] = &[input(0, F4), output(1, F4)];

const MATERIAL_OUTPUT: &[BoxDecl] = &[
  input(0, F3),
  input(1, F),
  input(2, F3),
  input(3, F),
  input(4, F),
  input(5, F),
  input(6, F),
  input(7, F3),
  input(8, F),
  input(9, F),
  input(10, F3),
  input(11, F3),
  input(12, F),
  input(13, F3),
];

const CUSTOM_CODE: &[BoxDecl] = &[
  input(0, F4),
  input(1, F4),
  input(2, F4),
  input(3, F4),
  input(4, F4),
  input(5, F4),
  input(6, F4),
  input(7, F4),
  output(8, F4),
  output(9, F4),
  output(10, F4),
  output(11, F4),
];

// function arguments and results take their type from the function graph; boxes are only declared here so that
// connections can be validated
const MATERIAL_FUNCTION: &[BoxDecl] = &[
  input(0, F),
  input(1, F),
  input(2, F),
  input(3, F),
  input(4, F),
  input(5, F),
  input(6, F),
  input(7, F),
  input(8, F),
  input(9, F),
  input(10, F),
  input(11, F),
  input(12, F),
  input(13, F),
  input(14, F),
  input(15, F),
  output(16, F),
  output(17, F),
  output(18, F),
  output(19, F),
  output(20, F),
  output(21, F),
  output(22, F),
  output(23, F),
  output(24, F),
  output(25, F),
  output(26, F),
  output(27, F),
  output(28, F),
  output(29, F),
  output(30, F),
  output(31, F),
];

impl NodeKind {
  /// Group of the node kind.
  pub const fn group(self) -> u16 {
    self.type_id().group
  }

  /// Boxes of the node kind, inputs and outputs sharing one id space.
  pub const fn boxes(self) -> &'static [BoxDecl] {
    match self {
      NodeKind::MaterialOutput => MATERIAL_OUTPUT,
      NodeKind::WorldPosition
      | NodeKind::Normal
      | NodeKind::CameraVector
      | NodeKind::ObjectPosition
      | NodeKind::PreSkinnedLocalPosition
      | NodeKind::PreSkinnedLocalNormal
      | NodeKind::Tangent
      | NodeKind::Bitangent
      | NodeKind::CameraPosition
      | NodeKind::ObjectSize => SINGLE_F3,
      NodeKind::View => VIEW,
      NodeKind::ScreenPosition | NodeKind::ScreenSize => DOUBLE_F2,
      NodeKind::CustomCode => CUSTOM_CODE,
      NodeKind::TwoSidedSign
      | NodeKind::Depth
      | NodeKind::PerInstanceRandom
      | NodeKind::TerrainHolesMask
      | NodeKind::TerrainLayerWeight
      | NodeKind::DepthFade => SINGLE_F,
      NodeKind::CameraDepthFade => CAMERA_DEPTH_FADE,
      NodeKind::VertexColor => SINGLE_F4,
      NodeKind::InterpolateVsToPs => INTERPOLATE,
      NodeKind::MaterialFunction => MATERIAL_FUNCTION,
      NodeKind::BlendNormals => BLEND_NORMALS,
      NodeKind::Bool => BOOL,
      NodeKind::Integer => INTEGER,
      NodeKind::Float => SINGLE_F,
      NodeKind::Vector2 => SINGLE_F2,
      NodeKind::Vector3 => SINGLE_F3,
      NodeKind::Vector4 => SINGLE_F4,
      NodeKind::Add
      | NodeKind::Subtract
      | NodeKind::Multiply
      | NodeKind::Divide
      | NodeKind::Min
      | NodeKind::Max
      | NodeKind::Dot => BINARY_OP,
      NodeKind::Abs | NodeKind::Saturate | NodeKind::Normalize => UNARY_OP,
      NodeKind::FunctionInput => FUNCTION_INPUT,
      NodeKind::FunctionOutput => FUNCTION_OUTPUT,
    }
  }

  /// Declaration of a box of the node kind.
  pub fn box_decl(self, id: u32) -> Option<BoxDecl> {
    self.boxes().iter().find(|decl| decl.id == id).copied()
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Literal parameter of a node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
  Bool(bool),
  Int(i32),
  Float(f32),
  Float2([f32; 2]),
  Float3([f32; 3]),
  Float4([f32; 4]),
  Text(String),
  Asset(AssetId),
}

impl ParamValue {
  /// Value of a numeric parameter; `None` for text and asset references.
  pub fn to_value(&self) -> Option<Value> {
    let lit = match *self {
      ParamValue::Bool(b) => Literal::Bool(b),
      ParamValue::Int(i) => Literal::Int(i),
      ParamValue::Float(x) => Literal::Float(x),
      ParamValue::Float2(v) => Literal::Float2(v),
      ParamValue::Float3(v) => Literal::Float3(v),
      ParamValue::Float4(v) => Literal::Float4(v),
      ParamValue::Text(_) | ParamValue::Asset(_) => return None,
    };

    Some(Value::literal(lit))
  }

  /// Parameter as an integer, converting booleans and floats.
  pub fn as_int(&self) -> Option<i32> {
    match *self {
      ParamValue::Bool(b) => Some(b as i32),
      ParamValue::Int(i) => Some(i),
      ParamValue::Float(x) => Some(x as i32),
      _ => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      ParamValue::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_asset(&self) -> Option<AssetId> {
    match *self {
      ParamValue::Asset(id) => Some(id),
      _ => None,
    }
  }
}

impl From<f32> for ParamValue {
  fn from(x: f32) -> Self {
    ParamValue::Float(x)
  }
}

impl From<i32> for ParamValue {
  fn from(i: i32) -> Self {
    ParamValue::Int(i)
  }
}

impl From<bool> for ParamValue {
  fn from(b: bool) -> Self {
    ParamValue::Bool(b)
  }
}

impl From<&'_ str> for ParamValue {
  fn from(s: &str) -> Self {
    ParamValue::Text(s.to_owned())
  }
}

impl From<AssetId> for ParamValue {
  fn from(id: AssetId) -> Self {
    ParamValue::Asset(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn type_ids_are_unique() {
    for kind in NodeKind::ALL {
      assert_eq!(NodeKind::from_type_id(kind.type_id()), Some(*kind));
    }
  }

  #[test]
  fn known_type_ids() {
    assert_eq!(NodeKind::MaterialFunction.type_id(), NodeTypeId::new(GROUP_MATERIAL, 24));
    assert_eq!(NodeKind::FunctionInput.type_id(), NodeTypeId::new(GROUP_FUNCTION, 1));
    assert_eq!(NodeKind::BlendNormals.type_id(), NodeTypeId::new(GROUP_MATERIAL, 48));
    assert_eq!(NodeKind::from_type_id(NodeTypeId::new(GROUP_MATERIAL, 26)), None);
    assert_eq!(NodeKind::Float.group(), GROUP_CONSTANTS);
    assert_eq!(NodeKind::Add.group(), GROUP_MATH);
    assert_eq!(NodeKind::from_type_id(NodeTypeId::new(1, 99)), None);
  }

  #[test]
  fn box_ids_are_unique() {
    for kind in NodeKind::ALL {
      let boxes = kind.boxes();

      for (i, a) in boxes.iter().enumerate() {
        assert!(boxes[i + 1..].iter().all(|b| b.id != a.id), "{}", kind);
      }
    }
  }

  #[test]
  fn names() {
    assert_eq!(NodeKind::InterpolateVsToPs.name(), "Interpolate VS To PS");
    assert_eq!(NodeKind::TerrainLayerWeight.to_string(), "Terrain Layer Weight");
  }

  #[test]
  fn params() {
    assert_eq!(ParamValue::Float(2.5).as_int(), Some(2));
    assert_eq!(ParamValue::from("x").as_text(), Some("x"));
    assert_eq!(ParamValue::from("x").to_value(), None);
    assert_eq!(
      ParamValue::Float3([1., 2., 3.]).to_value().map(|v| v.ty()),
      Some(ValueType::FLOAT3)
    );
  }
}
