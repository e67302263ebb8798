//! Node dispatch and the material group.

use crate::{
  asset::FunctionResolver,
  error::ErrorKind,
  generator::{Interpolant, MaterialGenerator, Site},
  graph::BoxId,
  layer::{MaterialDomain, SceneTexture, ShaderStage, UsageFlags},
  node::{custom_code, NodeKind, ParamValue},
  template::CodeTemplate,
  types::ValueType,
  value::Value,
};

use super::math::{BinaryOp, UnaryOp};

const F: ValueType = ValueType::FLOAT;
const F2: ValueType = ValueType::FLOAT2;
const F3: ValueType = ValueType::FLOAT3;
const F4: ValueType = ValueType::FLOAT4;

/// Packed storage of a terrain layer weight.
///
/// Layer weights are stored in two four-component slots.
///
/// # Return
///
/// `(slot, component)` for layers in `0..=7`, `None` otherwise.
pub fn terrain_layer_slot(index: i32) -> Option<(usize, usize)> {
  if (0..=7).contains(&index) {
    let index = index as usize;
    Some((index / 4, index % 4))
  } else {
    None
  }
}

impl<R> MaterialGenerator<R>
where
  R: FunctionResolver,
{
  /// Compute the value of the requested box of a node.
  pub(super) fn process(&mut self, site: &Site) -> Value {
    match site.kind {
      // never read as producers
      NodeKind::MaterialOutput | NodeKind::FunctionOutput => Value::float_zero(),

      NodeKind::WorldPosition => Value::new(F3, "input.WorldPosition.xyz"),

      NodeKind::View => match site.box_id() {
        0 => Value::new(F3, "ViewPos"),
        1 => Value::new(F3, "ViewDir"),
        2 => Value::new(F, "ViewFar"),
        _ => self.invalid_output(site),
      },

      NodeKind::Normal => Value::new(F3, "input.TBN[2]"),

      NodeKind::CameraVector => self.write_local(F3, "normalize(ViewPos - input.WorldPosition.xyz)"),

      NodeKind::ScreenPosition => match site.box_id() {
        0 => Value::new(F2, "input.SvPosition.xy"),
        1 => self.write_local(F2, "input.SvPosition.xy * ScreenSize.zw"),
        _ => self.invalid_output(site),
      },

      NodeKind::ScreenSize => match site.box_id() {
        0 => Value::new(F2, "ScreenSize.xy"),
        1 => Value::new(F2, "ScreenSize.zw"),
        _ => self.invalid_output(site),
      },

      NodeKind::CustomCode => self.process_custom_code(site),

      NodeKind::ObjectPosition => Value::new(F3, "GetObjectPosition(input)"),

      NodeKind::TwoSidedSign => Value::new(F, "input.TwoSidedSign"),

      NodeKind::CameraDepthFade => self.process_camera_depth_fade(site),

      NodeKind::VertexColor => {
        self.usage |= UsageFlags::USE_VERTEX_COLOR;
        Value::new(F4, "input.VertexColor")
      }

      NodeKind::PreSkinnedLocalPosition => match self.stage {
        ShaderStage::Vertex => Value::new(F3, "input.PreSkinnedPosition"),
        ShaderStage::Pixel => Value::zero(F3),
      },

      NodeKind::PreSkinnedLocalNormal => match self.stage {
        ShaderStage::Vertex => Value::new(F3, "input.PreSkinnedNormal"),
        ShaderStage::Pixel => Value::zero(F3),
      },

      NodeKind::Depth => self.write_local(F, "distance(ViewPos, input.WorldPosition.xyz)"),

      NodeKind::Tangent => Value::new(F3, "input.TBN[0]"),

      NodeKind::Bitangent => Value::new(F3, "input.TBN[1]"),

      NodeKind::CameraPosition => Value::new(F3, "ViewPos"),

      NodeKind::PerInstanceRandom => Value::new(F, "GetPerInstanceRandom(input)"),

      NodeKind::InterpolateVsToPs => self.process_interpolate(site),

      NodeKind::TerrainHolesMask => match self.layer.domain {
        MaterialDomain::Terrain => Value::new(F, "input.HolesMask"),
        _ => Value::float_one(),
      },

      NodeKind::TerrainLayerWeight => self.process_terrain_layer_weight(site),

      NodeKind::DepthFade => self.process_depth_fade(site),

      NodeKind::MaterialFunction => self.process_function_call(site),

      NodeKind::ObjectSize => Value::new(F3, "GetObjectSize(input)"),

      NodeKind::BlendNormals => {
        let base = self.try_get_value(site.input(0), Value::zero(F3));
        let base = self.cast_or_report(site.key, base, F3);
        let additional = self.try_get_value(site.input(1), Value::zero(F3));
        let additional = self.cast_or_report(site.key, additional, F3);

        self.write_local(
          F3,
          &format!(
            "normalize(float3({0}.xy + {1}.xy, {0}.z * {1}.z))",
            base, additional
          ),
        )
      }

      NodeKind::Bool
      | NodeKind::Integer
      | NodeKind::Float
      | NodeKind::Vector2
      | NodeKind::Vector3
      | NodeKind::Vector4 => self.process_constant(site),

      NodeKind::Add => self.process_binary(site, BinaryOp::Add),
      NodeKind::Subtract => self.process_binary(site, BinaryOp::Subtract),
      NodeKind::Multiply => self.process_binary(site, BinaryOp::Multiply),
      NodeKind::Divide => self.process_binary(site, BinaryOp::Divide),
      NodeKind::Min => self.process_binary(site, BinaryOp::Min),
      NodeKind::Max => self.process_binary(site, BinaryOp::Max),
      NodeKind::Dot => self.process_binary(site, BinaryOp::Dot),
      NodeKind::Abs => self.process_unary(site, UnaryOp::Abs),
      NodeKind::Saturate => self.process_unary(site, UnaryOp::Saturate),
      NodeKind::Normalize => self.process_unary(site, UnaryOp::Normalize),

      NodeKind::FunctionInput => self.process_function_input(site),
    }
  }

  fn invalid_output(&mut self, site: &Site) -> Value {
    self.report_error(site.key, ErrorKind::InvalidOutputIndex(site.key.box_id));
    Value::float_zero()
  }

  fn process_custom_code(&mut self, site: &Site) -> Value {
    let first_output = custom_code::FIRST_OUTPUT;
    if !(first_output..first_output + custom_code::OUTPUTS).contains(&site.box_id()) {
      return self.invalid_output(site);
    }

    let code = site.param(0).and_then(ParamValue::as_text).unwrap_or_default();
    if code.trim().is_empty() {
      return Value::float_zero();
    }

    self.usage |= UsageFlags::USE_CUSTOM_CODE;
    let template = CodeTemplate::parse(code);

    // only outputs read downstream get a local
    let mut outputs = Vec::with_capacity(custom_code::OUTPUTS as usize);
    for i in 0..custom_code::OUTPUTS {
      let consumed = self.graphs[site.key.graph]
        .graph
        .has_consumers(site.key.node, BoxId(first_output + i));

      outputs.push(if consumed {
        Some(self.declare_local(F4))
      } else {
        None
      });
    }

    let mut inputs = Vec::with_capacity(custom_code::INPUTS as usize);
    for i in 0..custom_code::INPUTS {
      let key = site.input(custom_code::FIRST_INPUT + i);
      let value = if self.is_connected(key) {
        let value = self.evaluate(key);
        self.cast_or_report(site.key, value, F4)
      } else {
        Value::zero(F4)
      };

      inputs.push(Some(value.code().into_owned()));
    }

    let output_names = outputs
      .iter()
      .map(|value| value.as_ref().map(|value| value.code().into_owned()))
      .collect::<Vec<_>>();

    self.write_comment(site.kind.name());
    self
      .writer
      .write_block(&template.render(&inputs, &output_names));

    for (i, value) in (0..).zip(outputs) {
      if let Some(b) = self.graph_box_mut(site.input(first_output + i)) {
        b.cache = value;
      }
    }

    self
      .graph_box(site.key)
      .and_then(|b| b.cache())
      .cloned()
      .unwrap_or_else(|| Value::zero(F4))
  }

  fn process_camera_depth_fade(&mut self, site: &Site) -> Value {
    let length = self.input_or_param(site, 0, 0);
    let length = self.cast_or_report(site.key, length, F);
    let offset = self.input_or_param(site, 1, 1);
    let offset = self.cast_or_report(site.key, offset, F);

    self.write_comment(site.kind.name());
    let to_camera = self.write_local(F3, "ViewPos - input.WorldPosition.xyz");
    let forward = self.write_local(F3, "TransformViewVectorToWorld(input, float3(0, 0, -1))");
    let depth = self.write_local(
      F,
      &format!(
        "dot(normalize({0}), {1}) * length({0})",
        to_camera, forward
      ),
    );
    let faded = self.write_local(F, &format!("{} - {}", depth, offset));

    self.write_local(F, &format!("saturate({} / {})", faded, length))
  }

  fn process_depth_fade(&mut self, site: &Site) -> Value {
    let distance = site
      .param(0)
      .and_then(ParamValue::to_value)
      .unwrap_or_else(Value::float_one);
    let distance = self.cast_or_report(site.key, distance, F);

    self.write_comment(site.kind.name());
    let screen_uv = self.write_local(F2, "input.SvPosition.xy * ScreenSize.zw");

    let depth_texture = self.find_or_add_scene_texture(SceneTexture::SceneDepth);
    self.usage |= UsageFlags::USE_SCENE_DEPTH;
    let depth_sample = self.write_local(
      F,
      &format!(
        "{}.SampleLevel(SamplerLinearClamp, {}, 0).x",
        depth_texture, screen_uv
      ),
    );

    let scene_depth = self.write_local(F, &format!("ViewInfo.w / ({} - ViewInfo.z)", depth_sample));
    let pixel_depth = self.write_local(F, "mul(float4(input.WorldPosition.xyz, 1), ViewMatrix).z");
    let depth_diff = self.write_local(F, &format!("{} * ViewFar - {}", scene_depth, pixel_depth));

    self.write_local(F, &format!("saturate({} / {})", depth_diff, distance))
  }

  fn process_terrain_layer_weight(&mut self, site: &Site) -> Value {
    if self.layer.domain != MaterialDomain::Terrain {
      return Value::float_one();
    }

    let index = site.param(0).and_then(ParamValue::as_int).unwrap_or(0);
    match terrain_layer_slot(index) {
      Some((slot, component)) => Value::new(F, format!("input.Layers[{}][{}]", slot, component)),

      None => {
        self.report_error(
          site.key,
          ErrorKind::InvalidParameter(format!("invalid terrain layer index {}", index)),
        );
        Value::float_one()
      }
    }
  }

  fn process_interpolate(&mut self, site: &Site) -> Value {
    let input = site.input(0);

    if self.stage == ShaderStage::Vertex {
      let value = self.try_get_value(input, Value::zero(F4));
      return self.cast_or_report(site.key, value, F4);
    }

    let max = self.config.max_interpolants;
    if self.interpolants.len() >= max {
      self.report_error(site.key, ErrorKind::CapacityExceeded(max));
      return Value::zero(F4);
    }

    if !self.layer.domain.supports_interpolants() {
      self.report_error(
        site.key,
        ErrorKind::UnsupportedInContext(
          "VS to PS interpolants are not supported in Decal or Post Process materials".to_owned(),
        ),
      );
      return Value::zero(F4);
    }

    let slot = self.interpolants.len();
    self.interpolants.push(Interpolant {
      node: site.key,
      input,
      context: self.context.clone(),
    });
    self.usage |= UsageFlags::USE_INTERPOLANTS;

    Value::new(F4, format!("input.CustomVSToPS[{}]", slot))
  }
}
