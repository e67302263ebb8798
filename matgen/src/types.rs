//! Semantic types carried by values and boxes.

use std::fmt;

/// Dimension of a floating type.
///
/// Floating types currently can have one of four dimensions:
///
/// - [`Dim::Scalar`]: designates a scalar value.
/// - [`Dim::D2`]: designates a 2D vector.
/// - [`Dim::D3`]: designates a 3D vector.
/// - [`Dim::D4`]: designates a 4D vector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Dim {
  /// Scalar value.
  Scalar,

  /// 2D vector.
  D2,

  /// 3D vector.
  D3,

  /// 4D vector.
  D4,
}

impl Dim {
  /// Number of components.
  pub const fn components(self) -> usize {
    match self {
      Dim::Scalar => 1,
      Dim::D2 => 2,
      Dim::D3 => 3,
      Dim::D4 => 4,
    }
  }

  /// Dimension holding `n` components, if any.
  pub const fn from_components(n: usize) -> Option<Self> {
    match n {
      1 => Some(Dim::Scalar),
      2 => Some(Dim::D2),
      3 => Some(Dim::D3),
      4 => Some(Dim::D4),
      _ => None,
    }
  }
}

/// Semantic type of a [`Value`](crate::value::Value) or a box.
///
/// Only floating values have vector flavors; booleans and integers are scalar. Matrices and textures cannot be cast
/// to anything else.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueType {
  /// A boolean.
  Bool,

  /// A signed integer.
  Int,

  /// An unsigned integer.
  UInt,

  /// A floating scalar or vector.
  Float(Dim),

  /// A 4×4 floating matrix.
  Matrix,

  /// A texture object, only usable as an argument of sampling expressions.
  Texture,
}

impl ValueType {
  pub const FLOAT: Self = ValueType::Float(Dim::Scalar);
  pub const FLOAT2: Self = ValueType::Float(Dim::D2);
  pub const FLOAT3: Self = ValueType::Float(Dim::D3);
  pub const FLOAT4: Self = ValueType::Float(Dim::D4);

  /// Number of components for scalars and vectors.
  pub const fn components(self) -> Option<usize> {
    match self {
      ValueType::Bool | ValueType::Int | ValueType::UInt => Some(1),
      ValueType::Float(dim) => Some(dim.components()),
      ValueType::Matrix | ValueType::Texture => None,
    }
  }

  /// The widest of two types, used to pick the result type of binary operations.
  ///
  /// Floating vectors win over scalars and wider vectors win over narrower ones. Non-numeric types are returned
  /// unchanged from `self`.
  pub fn widest(self, other: Self) -> Self {
    match (self.components(), other.components()) {
      (Some(a), Some(b)) if b > a => other,
      (Some(a), Some(b)) if a == b && !matches!(self, ValueType::Float(_)) => other,
      _ => self,
    }
  }

  /// HLSL name of the type.
  pub const fn hlsl_name(self) -> &'static str {
    match self {
      ValueType::Bool => "bool",
      ValueType::Int => "int",
      ValueType::UInt => "uint",
      ValueType::Float(Dim::Scalar) => "float",
      ValueType::Float(Dim::D2) => "float2",
      ValueType::Float(Dim::D3) => "float3",
      ValueType::Float(Dim::D4) => "float4",
      ValueType::Matrix => "float4x4",
      ValueType::Texture => "Texture2D",
    }
  }
}

impl fmt::Display for ValueType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.hlsl_name())
  }
}
