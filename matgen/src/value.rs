//! Values produced by evaluating boxes.

use std::{borrow::Cow, fmt};

use crate::{
  error::ErrorKind,
  types::{Dim, ValueType},
  writer::hlsl,
};

/// Literal value.
///
/// Literals are folded through casts, so that `float3(1.0, 1.0, 1.0)` is generated instead of a cast expression when
/// the source value is known.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
  Bool(bool),
  Int(i32),
  UInt(u32),
  Float(f32),
  Float2([f32; 2]),
  Float3([f32; 3]),
  Float4([f32; 4]),
}

impl Literal {
  /// Type of the literal.
  pub const fn ty(&self) -> ValueType {
    match self {
      Literal::Bool(_) => ValueType::Bool,
      Literal::Int(_) => ValueType::Int,
      Literal::UInt(_) => ValueType::UInt,
      Literal::Float(_) => ValueType::FLOAT,
      Literal::Float2(_) => ValueType::FLOAT2,
      Literal::Float3(_) => ValueType::FLOAT3,
      Literal::Float4(_) => ValueType::FLOAT4,
    }
  }

  /// Components as floats, zero-extended to four, along with the number of meaningful components.
  fn components(&self) -> ([f32; 4], usize) {
    match *self {
      Literal::Bool(b) => ([if b { 1. } else { 0. }, 0., 0., 0.], 1),
      Literal::Int(i) => ([i as f32, 0., 0., 0.], 1),
      Literal::UInt(u) => ([u as f32, 0., 0., 0.], 1),
      Literal::Float(x) => ([x, 0., 0., 0.], 1),
      Literal::Float2([x, y]) => ([x, y, 0., 0.], 2),
      Literal::Float3([x, y, z]) => ([x, y, z, 0.], 3),
      Literal::Float4(v) => (v, 4),
    }
  }

  /// Fold a cast to `to`; `None` if `to` is not a scalar or vector type.
  fn cast(&self, to: ValueType) -> Option<Self> {
    let (mut c, n) = self.components();

    // scalars splat to every component
    if n == 1 {
      c = [c[0]; 4];
    }

    let lit = match to {
      ValueType::Bool => Literal::Bool(c[0] != 0.),
      ValueType::Int => Literal::Int(c[0] as i32),
      ValueType::UInt => Literal::UInt(c[0] as u32),
      ValueType::Float(Dim::Scalar) => Literal::Float(c[0]),
      // vectors are already zero-extended by components()
      ValueType::Float(Dim::D2) => Literal::Float2([c[0], c[1]]),
      ValueType::Float(Dim::D3) => Literal::Float3([c[0], c[1], c[2]]),
      ValueType::Float(Dim::D4) => Literal::Float4(c),
      ValueType::Matrix | ValueType::Texture => return None,
    };

    Some(lit)
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    hlsl::write_literal(f, self)
  }
}

#[derive(Clone, Debug, PartialEq)]
enum Repr {
  Literal(Literal),
  Code(String),
}

/// Typed result of evaluating a box.
///
/// A value is either a [`Literal`] or a piece of generated shader code (an expression, most of the time a reference
/// to a local variable or an intrinsic). Values are immutable; [`Value::cast`] creates a new value.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
  ty: ValueType,
  repr: Repr,
}

impl Value {
  /// Create a value from generated code.
  pub fn new(ty: ValueType, code: impl Into<String>) -> Self {
    Value {
      ty,
      repr: Repr::Code(code.into()),
    }
  }

  /// Create a literal value.
  pub const fn literal(lit: Literal) -> Self {
    Value {
      ty: lit.ty(),
      repr: Repr::Literal(lit),
    }
  }

  /// The neutral zero of a type.
  pub fn zero(ty: ValueType) -> Self {
    match ty {
      ValueType::Bool => Value::literal(Literal::Bool(false)),
      ValueType::Int => Value::literal(Literal::Int(0)),
      ValueType::UInt => Value::literal(Literal::UInt(0)),
      ValueType::Float(dim) => Value::literal(splat(dim, 0.)),
      ValueType::Matrix | ValueType::Texture => Value::new(ty, format!("({})0", ty)),
    }
  }

  /// The neutral one of a type; the identity for matrices.
  pub fn one(ty: ValueType) -> Self {
    match ty {
      ValueType::Bool => Value::literal(Literal::Bool(true)),
      ValueType::Int => Value::literal(Literal::Int(1)),
      ValueType::UInt => Value::literal(Literal::UInt(1)),
      ValueType::Float(dim) => Value::literal(splat(dim, 1.)),
      ValueType::Matrix => Value::new(ty, "float4x4(1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1)"),
      ValueType::Texture => Value::zero(ty),
    }
  }

  /// Scalar floating zero, the fallback of most failed evaluations.
  pub fn float_zero() -> Self {
    Value::zero(ValueType::FLOAT)
  }

  /// Scalar floating one.
  pub fn float_one() -> Self {
    Value::one(ValueType::FLOAT)
  }

  /// Type of the value.
  pub const fn ty(&self) -> ValueType {
    self.ty
  }

  /// Literal, if the value is known at generation time.
  pub fn as_literal(&self) -> Option<&Literal> {
    match self.repr {
      Repr::Literal(ref lit) => Some(lit),
      Repr::Code(_) => None,
    }
  }

  /// Shader code of the value.
  pub fn code(&self) -> Cow<str> {
    match self.repr {
      Repr::Literal(ref lit) => Cow::Owned(lit.to_string()),
      Repr::Code(ref code) => Cow::Borrowed(code),
    }
  }

  /// Convert the value to another type.
  ///
  /// # Return
  ///
  /// A new value of type `to`, or [`ErrorKind::TypeMismatch`] if either type is a matrix or a texture (and the types
  /// differ). Literals are folded; other values get a conversion expression:
  ///
  /// - scalar to scalar: C-style cast, `(int)(x)`.
  /// - scalar to vector: splat, `(float3)(x)`.
  /// - vector to narrower vector or scalar: swizzle, `x.xy`.
  /// - vector to wider vector: zero extension, `float4(x.xyz, 0.0)`.
  pub fn cast(&self, to: ValueType) -> Result<Value, ErrorKind> {
    let from = self.ty;

    if from == to {
      return Ok(self.clone());
    }

    let (n, m) = match (from.components(), to.components()) {
      (Some(n), Some(m)) => (n, m),
      _ => return Err(ErrorKind::TypeMismatch { from, to }),
    };

    if let Repr::Literal(ref lit) = self.repr {
      if let Some(lit) = lit.cast(to) {
        return Ok(Value::literal(lit));
      }
    }

    let code = self.code();
    let code = match (n, m) {
      (1, _) => format!("({})({})", to, code),
      (_, 1) if to == ValueType::FLOAT => format!("{}.x", parenthesize(&code)),
      (_, 1) => format!("({})({}.x)", to, parenthesize(&code)),
      (n, m) if m < n => format!("{}.{}", parenthesize(&code), &"xyzw"[..m]),
      (n, m) => {
        let zeros = vec!["0.0"; m - n].join(", ");
        format!("{}({}.{}, {})", to, parenthesize(&code), &"xyzw"[..n], zeros)
      }
    };

    Ok(Value::new(to, code))
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.repr {
      Repr::Literal(ref lit) => fmt::Display::fmt(lit, f),
      Repr::Code(ref code) => f.write_str(code),
    }
  }
}

impl From<Literal> for Value {
  fn from(lit: Literal) -> Self {
    Value::literal(lit)
  }
}

fn splat(dim: Dim, x: f32) -> Literal {
  match dim {
    Dim::Scalar => Literal::Float(x),
    Dim::D2 => Literal::Float2([x; 2]),
    Dim::D3 => Literal::Float3([x; 3]),
    Dim::D4 => Literal::Float4([x; 4]),
  }
}

/// Wrap the code in parentheses unless it is a single operand (identifier, member access, call or indexing).
fn parenthesize(code: &str) -> Cow<str> {
  let mut depth = 0i32;
  let atomic = code.chars().all(|c| match c {
    '(' | '[' => {
      depth += 1;
      true
    }
    ')' | ']' => {
      depth -= 1;
      true
    }
    c if depth > 0 => c != '\n',
    c => c.is_alphanumeric() || c == '_' || c == '.',
  });

  if atomic {
    Cow::Borrowed(code)
  } else {
    Cow::Owned(format!("({})", code))
  }
}
