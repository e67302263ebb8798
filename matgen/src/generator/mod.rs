//! Material code generation.
//!
//! A [`MaterialGenerator`] turns one material graph into the code of its vertex and pixel stages. Evaluation is lazy:
//! the generator starts from the boxes of the material output node and walks connections backwards, dispatching on
//! the kind of every producer node. The value of an output box is computed once per stage and cached in the box, so
//! that statements are emitted once regardless of how many nodes consume the box.
//!
//! Generation never stops on a faulty node: problems are recorded as [`Diagnostic`]s and the faulty node evaluates
//! to a neutral value of the expected type.

mod constants;
mod context;
mod function;
mod material;
mod math;

use std::{
  collections::{HashMap, HashSet},
  fmt,
  sync::Arc,
};

pub use context::{CallContext, CallFrame};
pub use material::terrain_layer_slot;

use crate::{
  asset::{FunctionResolver, MaterialFunction},
  error::{Diagnostic, ErrorKind, GenerateError},
  graph::{BoxId, Graph, GraphBox, NodeId, NodeIndex},
  layer::{MaterialLayer, MaterialParam, SceneTexture, ShaderStage, UsageFlags},
  node::{NodeKind, ParamValue},
  types::ValueType,
  value::Value,
  writer::{hlsl, ShaderWriter, StageOutput, StageSource},
};

/// Index of a graph owned by a generator.
///
/// The material graph is always [`ROOT_GRAPH`]; function graphs instantiated for call sites follow.
pub type GraphIndex = usize;

/// Index of the material graph.
pub const ROOT_GRAPH: GraphIndex = 0;

/// Number of vertex to pixel interpolants a material can use.
pub const MAX_INTERPOLANTS: usize = 16;

/// Address of a box across the graphs of a generator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BoxKey {
  pub graph: GraphIndex,
  pub node: NodeIndex,
  pub box_id: BoxId,
}

impl BoxKey {
  pub fn new(graph: GraphIndex, node: NodeIndex, box_id: u32) -> Self {
    BoxKey {
      graph,
      node,
      box_id: BoxId(box_id),
    }
  }

  /// Box of the material graph.
  pub fn root(node: NodeIndex, box_id: u32) -> Self {
    BoxKey::new(ROOT_GRAPH, node, box_id)
  }

  /// Another box of the same node.
  pub fn sibling(self, box_id: u32) -> Self {
    BoxKey::new(self.graph, self.node, box_id)
  }
}

/// Generator settings.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
  /// Number of interpolants that can be allocated, at most [`MAX_INTERPOLANTS`].
  pub max_interpolants: usize,

  /// Write a comment naming the node before multi-statement nodes.
  pub emit_comments: bool,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    GeneratorConfig {
      max_interpolants: MAX_INTERPOLANTS,
      emit_comments: false,
    }
  }
}

/// A vertex to pixel interpolant slot.
#[derive(Clone, Debug)]
pub struct Interpolant {
  node: BoxKey,
  input: BoxKey,
  context: CallContext,
}

impl Interpolant {
  /// Output box of the node that allocated the slot.
  pub fn node(&self) -> BoxKey {
    self.node
  }

  /// Box evaluated in the vertex stage to fill the slot.
  pub fn input(&self) -> BoxKey {
    self.input
  }
}

/// Result of a generation run.
#[derive(Clone, Debug)]
pub struct GeneratedMaterial {
  pub pixel: StageSource,
  pub vertex: StageSource,

  /// Number of vertex to pixel interpolants in use.
  pub interpolants: usize,

  /// Scene resources sampled by the material, in register order.
  pub scene_textures: Vec<SceneTexture>,

  pub usage: UsageFlags,

  /// Every problem found, in discovery order.
  pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedMaterial {
  /// Whether generation went through without any diagnostic.
  pub fn is_clean(&self) -> bool {
    self.diagnostics.is_empty()
  }

  /// Assemble the HLSL code of the material.
  pub fn to_hlsl(&self) -> Result<String, fmt::Error> {
    hlsl::write_material_to_str(self)
  }
}

/// A graph owned by the generator, with the function it was instantiated from.
#[derive(Debug)]
struct GraphSlot {
  graph: Graph,
  function: Option<Arc<MaterialFunction>>,

  /// Call nodes leading to this graph from the material graph.
  call_path: Vec<NodeId>,
}

/// The node being evaluated, along with the requested box.
#[derive(Clone, Debug)]
struct Site {
  key: BoxKey,
  id: NodeId,
  kind: NodeKind,
  params: Vec<ParamValue>,
}

impl Site {
  fn param(&self, index: usize) -> Option<&ParamValue> {
    self.params.get(index)
  }

  /// Another box of the node.
  fn input(&self, box_id: u32) -> BoxKey {
    self.key.sibling(box_id)
  }

  /// Requested box id.
  fn box_id(&self) -> u32 {
    self.key.box_id.0
  }
}

/// Code generator of a single material.
///
/// A generator is meant for a single run: build it, optionally evaluate boxes, then call
/// [`MaterialGenerator::generate`].
#[derive(Debug)]
pub struct MaterialGenerator<R> {
  resolver: R,
  layer: MaterialLayer,
  config: GeneratorConfig,
  graphs: Vec<GraphSlot>,
  instances: HashMap<(GraphIndex, NodeIndex), GraphIndex>,
  context: CallContext,
  stage: ShaderStage,
  writer: ShaderWriter,
  interpolants: Vec<Interpolant>,
  scene_textures: Vec<SceneTexture>,
  usage: UsageFlags,
  diagnostics: Vec<Diagnostic>,
  evaluating: HashSet<(GraphIndex, NodeIndex)>,
}

impl<R> MaterialGenerator<R>
where
  R: FunctionResolver,
{
  /// Create a generator for a material graph; function calls are resolved with `resolver`.
  pub fn new(graph: Graph, layer: MaterialLayer, resolver: R) -> Self {
    MaterialGenerator {
      resolver,
      layer,
      config: GeneratorConfig::default(),
      graphs: vec![GraphSlot {
        graph,
        function: None,
        call_path: Vec::new(),
      }],
      instances: HashMap::new(),
      context: CallContext::root(ROOT_GRAPH),
      stage: ShaderStage::Pixel,
      writer: ShaderWriter::new(),
      interpolants: Vec::new(),
      scene_textures: Vec::new(),
      usage: UsageFlags::empty(),
      diagnostics: Vec::new(),
      evaluating: HashSet::new(),
    }
  }

  pub fn with_config(mut self, config: GeneratorConfig) -> Self {
    self.config = config;
    self.config.max_interpolants = self.config.max_interpolants.min(MAX_INTERPOLANTS);
    self
  }

  /// Limit the number of interpolants; clamped to [`MAX_INTERPOLANTS`].
  pub fn with_max_interpolants(mut self, max: usize) -> Self {
    self.config.max_interpolants = max.min(MAX_INTERPOLANTS);
    self
  }

  pub fn with_comments(mut self, emit_comments: bool) -> Self {
    self.config.emit_comments = emit_comments;
    self
  }

  pub fn config(&self) -> &GeneratorConfig {
    &self.config
  }

  pub fn layer(&self) -> MaterialLayer {
    self.layer
  }

  pub fn stage(&self) -> ShaderStage {
    self.stage
  }

  /// The material graph.
  pub fn graph(&self) -> &Graph {
    &self.graphs[ROOT_GRAPH].graph
  }

  /// Call context of the evaluation.
  pub fn context(&self) -> &CallContext {
    &self.context
  }

  /// Statements written so far in the current stage.
  pub fn statement_count(&self) -> usize {
    self.writer.statement_count()
  }

  /// Code written so far in the current stage.
  pub fn code(&self) -> &str {
    self.writer.code()
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn interpolants(&self) -> &[Interpolant] {
    &self.interpolants
  }

  pub fn usage(&self) -> UsageFlags {
    self.usage
  }

  /// Number of graphs owned by the generator: the material graph and one per instantiated call site.
  pub fn graph_count(&self) -> usize {
    self.graphs.len()
  }

  /// Evaluate an input box of the material graph.
  pub fn evaluate_input(&mut self, node: NodeIndex, box_id: u32) -> Value {
    self.evaluate(BoxKey::root(node, box_id))
  }

  /// Evaluate an output box of the material graph.
  pub fn evaluate_output(&mut self, node: NodeIndex, box_id: u32) -> Value {
    self.eat_box(BoxKey::root(node, box_id))
  }

  /// Generate the code of both stages.
  ///
  /// # Return
  ///
  /// The generated material, diagnostics included, or [`GenerateError::MissingOutputNode`] if the graph has no
  /// material output node.
  pub fn generate(mut self) -> Result<GeneratedMaterial, GenerateError> {
    let output = self
      .graph()
      .find_kind(NodeKind::MaterialOutput)
      .ok_or(GenerateError::MissingOutputNode)?;

    self.begin_stage(ShaderStage::Pixel);
    let outputs = self.write_params(output, ShaderStage::Pixel);
    let pixel = std::mem::take(&mut self.writer).finish(outputs);

    self.begin_stage(ShaderStage::Vertex);
    let mut outputs = self.write_params(output, ShaderStage::Vertex);

    let interpolants = self.interpolants.clone();
    for (slot, interpolant) in interpolants.into_iter().enumerate() {
      let Interpolant {
        node,
        input,
        context,
      } = interpolant;

      let value = self.with_context(context, |gen| {
        let value = gen.try_get_value(input, Value::zero(ValueType::FLOAT4));
        gen.cast_or_report(node, value, ValueType::FLOAT4)
      });

      outputs.push(StageOutput {
        target: format!("CustomVSToPS[{}]", slot),
        value,
      });
    }

    let vertex = std::mem::take(&mut self.writer).finish(outputs);

    log::debug!(
      "material generated: {} interpolants, {} diagnostics",
      self.interpolants.len(),
      self.diagnostics.len()
    );

    Ok(GeneratedMaterial {
      pixel,
      vertex,
      interpolants: self.interpolants.len(),
      scene_textures: self.scene_textures,
      usage: self.usage,
      diagnostics: self.diagnostics,
    })
  }

  fn begin_stage(&mut self, stage: ShaderStage) {
    log::debug!("generating {:?} stage", stage);

    for slot in &mut self.graphs {
      slot.graph.clear_caches();
    }

    self.evaluating.clear();
    self.stage = stage;
  }

  fn write_params(&mut self, output: NodeIndex, stage: ShaderStage) -> Vec<StageOutput> {
    MaterialParam::in_stage(stage)
      .map(|param| {
        let key = BoxKey::root(output, param.box_id());
        let value = self.try_get_value(key, param.default_value());
        let value = self.cast_or_report(key, value, param.ty());

        StageOutput {
          target: param.target().to_owned(),
          value,
        }
      })
      .collect()
  }

  fn graph_box(&self, key: BoxKey) -> Option<&GraphBox> {
    self
      .graphs
      .get(key.graph)?
      .graph
      .node(key.node)?
      .get_box(key.box_id)
  }

  fn graph_box_mut(&mut self, key: BoxKey) -> Option<&mut GraphBox> {
    self
      .graphs
      .get_mut(key.graph)?
      .graph
      .node_mut(key.node)?
      .get_box_mut(key.box_id)
  }

  fn site(&self, key: BoxKey) -> Option<Site> {
    let node = self.graphs.get(key.graph)?.graph.node(key.node)?;

    Some(Site {
      key,
      id: node.id(),
      kind: node.kind(),
      params: node.params().to_vec(),
    })
  }

  fn is_connected(&self, key: BoxKey) -> bool {
    self.graph_box(key).map_or(false, GraphBox::has_connection)
  }

  /// Declared type of a box; scalar float for unknown boxes.
  fn box_type(&self, key: BoxKey) -> ValueType {
    self.graph_box(key).map_or(ValueType::FLOAT, GraphBox::ty)
  }

  /// Value of an input box: the value of the connected output box, or zero of the declared type.
  fn evaluate(&mut self, key: BoxKey) -> Value {
    let connection = match self.graph_box(key) {
      Some(b) => b.connection(),
      None => return Value::float_zero(),
    };

    match connection {
      Some(c) => self.eat_box(BoxKey {
        graph: key.graph,
        node: c.node,
        box_id: c.box_id,
      }),
      None => Value::zero(self.box_type(key)),
    }
  }

  /// Value of an input box if connected, `default` otherwise.
  fn try_get_value(&mut self, key: BoxKey, default: Value) -> Value {
    if self.is_connected(key) {
      self.evaluate(key)
    } else {
      default
    }
  }

  /// Value of an output box, computed on first use and cached afterwards.
  fn eat_box(&mut self, key: BoxKey) -> Value {
    if let Some(value) = self.graph_box(key).and_then(GraphBox::cache) {
      return value.clone();
    }

    let site = match self.site(key) {
      Some(site) => site,
      None => return Value::float_zero(),
    };

    // a node can be re-entered through any of its boxes, not only the requested one
    if !self.evaluating.insert((key.graph, key.node)) {
      self.report_error(
        key,
        ErrorKind::RecursiveOrMalformedCall(format!("node {} depends on itself", site.id)),
      );
      return Value::zero(self.box_type(key));
    }

    log::trace!("evaluating {} {} box {}", site.kind, site.id, key.box_id);
    let value = self.process(&site);
    self.evaluating.remove(&(key.graph, key.node));

    if let Some(b) = self.graph_box_mut(key) {
      if b.cache.is_none() {
        b.cache = Some(value.clone());
      }
    }

    value
  }

  /// Value of an input box if connected, else the literal parameter `param`, else zero of the declared type.
  fn input_or_param(&mut self, site: &Site, box_id: u32, param: usize) -> Value {
    let key = site.input(box_id);
    let default = site
      .param(param)
      .and_then(ParamValue::to_value)
      .unwrap_or_else(|| Value::zero(self.box_type(key)));

    self.try_get_value(key, default)
  }

  fn write_local(&mut self, ty: ValueType, init: &str) -> Value {
    self.writer.write_local(ty, init)
  }

  fn declare_local(&mut self, ty: ValueType) -> Value {
    self.writer.declare_local(ty)
  }

  fn write_comment(&mut self, comment: &str) {
    if self.config.emit_comments {
      self.writer.write_comment(comment);
    }
  }

  /// Cast a value, reporting a diagnostic and substituting zero if the cast is invalid.
  fn cast_or_report(&mut self, key: BoxKey, value: Value, ty: ValueType) -> Value {
    match value.cast(ty) {
      Ok(value) => value,
      Err(kind) => {
        self.report_error(key, kind);
        Value::zero(ty)
      }
    }
  }

  /// Register a scene texture, once.
  fn find_or_add_scene_texture(&mut self, texture: SceneTexture) -> &'static str {
    if !self.scene_textures.contains(&texture) {
      self.scene_textures.push(texture);
    }

    texture.shader_name()
  }

  fn report_error(&mut self, key: BoxKey, kind: ErrorKind) {
    let slot = self.graphs.get(key.graph);
    let diagnostic = Diagnostic {
      function: slot
        .and_then(|slot| slot.function.as_ref())
        .map(|function| function.id()),
      call_path: slot.map_or_else(Vec::new, |slot| slot.call_path.clone()),
      node: slot
        .and_then(|slot| slot.graph.node(key.node))
        .map_or(NodeId(0), |node| node.id()),
      box_id: key.box_id,
      kind,
    };

    // the vertex stage walks nodes already walked by the pixel stage
    if !self.diagnostics.contains(&diagnostic) {
      log::warn!("{}", diagnostic);
      self.diagnostics.push(diagnostic);
    }
  }

  /// Run `f` with another call context, restoring the current one afterwards.
  fn with_context<T>(&mut self, context: CallContext, f: impl FnOnce(&mut Self) -> T) -> T {
    let saved = std::mem::replace(&mut self.context, context);
    let result = f(self);
    self.context = saved;
    result
  }
}
