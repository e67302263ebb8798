//! HLSL writers.

use crate::{generator::GeneratedMaterial, value::Literal, writer::StageSource};
use std::fmt;

/// Number of spaces an indent level represents.
pub(crate) const INDENT_SPACES: usize = 2;

/// Write a [`GeneratedMaterial`] to a [`String`].
pub fn write_material_to_str(material: &GeneratedMaterial) -> Result<String, fmt::Error> {
  let mut output = String::new();
  write_material(&mut output, material)?;
  Ok(output)
}

/// Write a [`GeneratedMaterial`] to a [`fmt::Write`](std::fmt::Write).
///
/// The output contains the scene resources declarations followed by the `GetMaterialVS` and `GetMaterialPS`
/// functions, filling a `Material` structure from a `MaterialInput` one.
pub fn write_material(f: &mut impl fmt::Write, material: &GeneratedMaterial) -> Result<(), fmt::Error> {
  for (slot, texture) in material.scene_textures.iter().enumerate() {
    writeln!(f, "Texture2D {} : register(t{});", texture.shader_name(), slot)?;
  }

  write_stage_fun(f, "GetMaterialVS", &material.vertex)?;
  write_stage_fun(f, "GetMaterialPS", &material.pixel)
}

fn write_stage_fun(f: &mut impl fmt::Write, name: &str, stage: &StageSource) -> Result<(), fmt::Error> {
  // just for aesthetics
  f.write_str("\n")?;

  writeln!(f, "Material {}(MaterialInput input)", name)?;
  f.write_str("{\n")?;
  write_indented(f, 1, "Material material = (Material)0;\n")?;
  f.write_str(&stage.code)?;

  for output in &stage.outputs {
    write_indent(f, 1)?;
    writeln!(f, "material.{} = {};", output.target, output.value)?;
  }

  write_indented(f, 1, "return material;\n")?;
  f.write_str("}\n")
}

/// Write a literal.
pub fn write_literal(f: &mut impl fmt::Write, lit: &Literal) -> Result<(), fmt::Error> {
  match *lit {
    Literal::Bool(b) => write!(f, "{}", b),
    Literal::Int(i) => write!(f, "{}", i),
    Literal::UInt(u) => write!(f, "{}u", u),
    Literal::Float(x) => f.write_str(&write_f32(x)),
    Literal::Float2([x, y]) => write!(f, "float2({}, {})", write_f32(x), write_f32(y)),
    Literal::Float3([x, y, z]) => write!(
      f,
      "float3({}, {}, {})",
      write_f32(x),
      write_f32(y),
      write_f32(z)
    ),
    Literal::Float4([x, y, z, w]) => write!(
      f,
      "float4({}, {}, {}, {})",
      write_f32(x),
      write_f32(y),
      write_f32(z),
      write_f32(w)
    ),
  }
}

/// Format a float so that it always reads as a floating literal.
pub(crate) fn write_f32(x: f32) -> String {
  if x.is_finite() && x.fract() == 0. {
    format!("{:.1}", x)
  } else {
    x.to_string()
  }
}

pub(crate) fn write_indented(
  f: &mut impl fmt::Write,
  indent_lvl: usize,
  t: &str,
) -> Result<(), fmt::Error> {
  write_indent(f, indent_lvl)?;
  f.write_str(t)
}

pub(crate) fn write_indent(f: &mut impl fmt::Write, indent_lvl: usize) -> Result<(), fmt::Error> {
  write!(
    f,
    "{indent:width$}",
    indent = "",
    width = INDENT_SPACES * indent_lvl
  )
}
