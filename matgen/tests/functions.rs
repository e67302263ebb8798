use matgen::{
  asset::{AssetId, FunctionLibrary, MaterialFunction},
  error::ErrorKind,
  generator::MaterialGenerator,
  graph::{BoxId, Graph, NodeId, NodeIndex},
  layer::{MaterialDomain, MaterialLayer, MaterialParam, UsageFlags},
  node::{function_call, NodeKind, ParamValue},
};

/// `x * 3`, with `x` defaulting to 2.
fn scale_function() -> MaterialFunction {
  let mut graph = Graph::new();
  let input = graph
    .add_node(
      NodeId(1),
      NodeKind::FunctionInput,
      vec![ParamValue::from("x"), ParamValue::Float(2.)],
    )
    .unwrap();
  let mul = graph
    .add_node(
      NodeId(2),
      NodeKind::Multiply,
      vec![ParamValue::Float(0.), ParamValue::Float(3.)],
    )
    .unwrap();
  let output = graph
    .add_node(NodeId(3), NodeKind::FunctionOutput, vec![ParamValue::from("y")])
    .unwrap();
  graph.connect(input, 0, mul, 0).unwrap();
  graph.connect(mul, 2, output, 0).unwrap();

  MaterialFunction::new(AssetId::new_v4(), graph, vec![NodeId(1)], vec![NodeId(3)])
}

/// A function calling `callee` and returning its result.
fn calling_function(id: AssetId, callee: AssetId) -> MaterialFunction {
  let mut graph = Graph::new();
  let call = graph
    .add_node(NodeId(1), NodeKind::MaterialFunction, vec![callee.into()])
    .unwrap();
  let output = graph
    .add_node(NodeId(2), NodeKind::FunctionOutput, Vec::new())
    .unwrap();
  graph
    .connect(call, function_call::FIRST_OUTPUT, output, 0)
    .unwrap();

  MaterialFunction::new(id, graph, Vec::new(), vec![NodeId(2)])
}

fn with_output() -> (Graph, NodeIndex) {
  let mut graph = Graph::new();
  let output = graph.add(NodeKind::MaterialOutput, Vec::new());
  (graph, output)
}

fn surface() -> MaterialLayer {
  MaterialLayer::new(MaterialDomain::Surface)
}

#[test]
fn connected_and_default_inputs() {
  let mut lib = FunctionLibrary::new();
  let scale = lib.insert(scale_function());

  let (mut graph, output) = with_output();
  let depth = graph.add(NodeKind::Depth, Vec::new());
  let connected = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);
  let unconnected = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);
  graph
    .connect(depth, 0, connected, function_call::FIRST_INPUT)
    .unwrap();
  graph
    .connect(
      connected,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Roughness.box_id(),
    )
    .unwrap();
  graph
    .connect(
      unconnected,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Metalness.box_id(),
    )
    .unwrap();

  let material = MaterialGenerator::new(graph, surface(), &lib)
    .generate()
    .unwrap();

  assert!(material.is_clean());
  assert!(material.usage.contains(UsageFlags::USE_FUNCTIONS));

  // metalness comes first in the material output
  assert_eq!(
    material.pixel.code,
    "  float local0 = 2.0 * 3.0;
  float local1 = distance(ViewPos, input.WorldPosition.xyz);
  float local2 = local1 * 3.0;
"
  );
  assert_eq!(
    material.pixel.output("Metalness").map(|v| v.code().into_owned()),
    Some("local0".to_owned())
  );
  assert_eq!(
    material.pixel.output("Roughness").map(|v| v.code().into_owned()),
    Some("local2".to_owned())
  );
}

#[test]
fn instances_are_per_call_site() {
  let mut lib = FunctionLibrary::new();
  let scale = lib.insert(scale_function());

  let mut graph = Graph::new();
  let a = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);
  let b = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  gen.evaluate_output(a, function_call::FIRST_OUTPUT);
  gen.evaluate_output(a, function_call::FIRST_OUTPUT);
  assert_eq!(gen.graph_count(), 2);

  gen.evaluate_output(b, function_call::FIRST_OUTPUT);
  assert_eq!(gen.graph_count(), 3);
  assert_eq!(gen.statement_count(), 2);
}

#[test]
fn nested_calls_of_the_same_function() {
  let mut lib = FunctionLibrary::new();
  let scale = lib.insert(scale_function());

  let (mut graph, output) = with_output();
  let depth = graph.add(NodeKind::Depth, Vec::new());
  let inner = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);
  let outer = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);
  graph
    .connect(depth, 0, inner, function_call::FIRST_INPUT)
    .unwrap();
  graph
    .connect(
      inner,
      function_call::FIRST_OUTPUT,
      outer,
      function_call::FIRST_INPUT,
    )
    .unwrap();
  graph
    .connect(
      outer,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Roughness.box_id(),
    )
    .unwrap();

  let material = MaterialGenerator::new(graph, surface(), &lib)
    .generate()
    .unwrap();

  assert!(material.is_clean());
  assert_eq!(
    material.pixel.code,
    "  float local0 = distance(ViewPos, input.WorldPosition.xyz);
  float local1 = local0 * 3.0;
  float local2 = local1 * 3.0;
"
  );
}

#[test]
fn missing_function() {
  let missing = AssetId::new_v4();

  let (mut graph, output) = with_output();
  let call = graph.add(NodeKind::MaterialFunction, vec![missing.into()]);
  let camera = graph.add(NodeKind::CameraVector, Vec::new());
  graph
    .connect(
      call,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Roughness.box_id(),
    )
    .unwrap();
  graph
    .connect(camera, 0, output, MaterialParam::Emissive.box_id())
    .unwrap();

  let material = MaterialGenerator::new(graph, surface(), FunctionLibrary::new())
    .generate()
    .unwrap();

  assert_eq!(material.diagnostics.len(), 1);
  assert_eq!(
    material.diagnostics[0].kind,
    ErrorKind::MissingOrInvalidAsset(missing)
  );
  assert_eq!(material.diagnostics[0].node, NodeId(2));
  assert_eq!(
    material.pixel.output("Roughness").map(|v| v.code().into_owned()),
    Some("0.0".to_owned())
  );
  assert_eq!(
    material.pixel.output("Emissive").map(|v| v.code().into_owned()),
    Some("local0".to_owned())
  );
}

#[test]
fn broken_function() {
  let mut lib = FunctionLibrary::new();
  let broken = AssetId::new_v4();
  lib.insert_broken(broken, "truncated surface");

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![broken.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  assert_eq!(gen.evaluate_output(call, function_call::FIRST_OUTPUT).code(), "0.0");
  assert_eq!(
    gen.diagnostics()[0].kind,
    ErrorKind::MissingOrInvalidAsset(broken)
  );
}

#[test]
fn invalid_output_box() {
  let mut lib = FunctionLibrary::new();
  let scale = lib.insert(scale_function());

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![scale.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  let value = gen.evaluate_output(call, function_call::FIRST_OUTPUT + 1);

  assert_eq!(value.code(), "0.0");
  assert_eq!(
    gen.diagnostics()[0].kind,
    ErrorKind::InvalidOutputIndex(BoxId(function_call::FIRST_OUTPUT + 1))
  );
}

#[test]
fn direct_recursion() {
  let mut lib = FunctionLibrary::new();
  let id = AssetId::new_v4();
  lib.insert(calling_function(id, id));

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![id.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  let value = gen.evaluate_output(call, function_call::FIRST_OUTPUT);

  assert_eq!(value.code(), "0.0");
  assert_eq!(gen.diagnostics().len(), 1);
  assert!(matches!(
    gen.diagnostics()[0].kind,
    ErrorKind::RecursiveOrMalformedCall(_)
  ));
  assert_eq!(gen.diagnostics()[0].function, Some(id));
  assert_eq!(gen.context().depth(), 0);
  assert_eq!(gen.context().graphs(), &[0]);
}

#[test]
fn indirect_recursion() {
  let mut lib = FunctionLibrary::new();
  let a = AssetId::new_v4();
  let b = AssetId::new_v4();
  lib.insert(calling_function(a, b));
  lib.insert(calling_function(b, a));

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![a.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  gen.evaluate_output(call, function_call::FIRST_OUTPUT);

  assert_eq!(gen.diagnostics().len(), 1);
  assert_eq!(gen.diagnostics()[0].function, Some(b));
  assert!(matches!(
    gen.diagnostics()[0].kind,
    ErrorKind::RecursiveOrMalformedCall(_)
  ));
  assert_eq!(gen.context().depth(), 0);
}

#[test]
fn function_input_outside_of_a_call() {
  let mut graph = Graph::new();
  let input = graph.add(NodeKind::FunctionInput, vec![ParamValue::from("x")]);

  let mut gen = MaterialGenerator::new(graph, surface(), FunctionLibrary::new());

  assert_eq!(gen.evaluate_output(input, 0).code(), "0.0");
  assert!(matches!(
    gen.diagnostics()[0].kind,
    ErrorKind::RecursiveOrMalformedCall(_)
  ));
}

#[test]
fn undeclared_function_input() {
  let mut function_graph = Graph::new();
  let input = function_graph.add(NodeKind::FunctionInput, Vec::new());
  let output = function_graph.add(NodeKind::FunctionOutput, Vec::new());
  function_graph.connect(input, 0, output, 0).unwrap();

  let mut lib = FunctionLibrary::new();
  let id = lib.insert(MaterialFunction::new(
    AssetId::new_v4(),
    function_graph,
    Vec::new(),
    vec![NodeId(2)],
  ));

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![id.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  gen.evaluate_output(call, function_call::FIRST_OUTPUT);

  assert_eq!(
    gen.diagnostics()[0].kind,
    ErrorKind::InvalidInputIndex(NodeId(1))
  );
  assert_eq!(gen.diagnostics()[0].function, Some(id));
}

/// A function forwarding its input `x` to `inner`, through an interpolant if `interpolate` is set.
fn wrapping_function(inner: AssetId, interpolate: bool) -> MaterialFunction {
  let mut graph = Graph::new();
  let input = graph
    .add_node(NodeId(1), NodeKind::FunctionInput, vec![ParamValue::from("x")])
    .unwrap();
  let call = graph
    .add_node(NodeId(2), NodeKind::MaterialFunction, vec![inner.into()])
    .unwrap();
  let output = graph
    .add_node(NodeId(3), NodeKind::FunctionOutput, Vec::new())
    .unwrap();

  if interpolate {
    let interp = graph
      .add_node(NodeId(4), NodeKind::InterpolateVsToPs, Vec::new())
      .unwrap();
    graph.connect(input, 0, interp, 0).unwrap();
    graph
      .connect(interp, 1, call, function_call::FIRST_INPUT)
      .unwrap();
  } else {
    graph
      .connect(input, 0, call, function_call::FIRST_INPUT)
      .unwrap();
  }

  graph
    .connect(call, function_call::FIRST_OUTPUT, output, 0)
    .unwrap();

  MaterialFunction::new(AssetId::new_v4(), graph, vec![NodeId(1)], vec![NodeId(3)])
}

#[test]
fn inputs_forwarded_through_nested_calls() {
  let mut lib = FunctionLibrary::new();
  let scale = lib.insert(scale_function());
  let wrap = lib.insert(wrapping_function(scale, false));

  let (mut graph, output) = with_output();
  let depth = graph.add(NodeKind::Depth, Vec::new());
  let call = graph.add(NodeKind::MaterialFunction, vec![wrap.into()]);
  graph
    .connect(depth, 0, call, function_call::FIRST_INPUT)
    .unwrap();
  graph
    .connect(
      call,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Roughness.box_id(),
    )
    .unwrap();

  let material = MaterialGenerator::new(graph, surface(), &lib)
    .generate()
    .unwrap();

  assert!(material.is_clean());
  assert_eq!(
    material.pixel.code,
    "  float local0 = distance(ViewPos, input.WorldPosition.xyz);
  float local1 = local0 * 3.0;
"
  );
  assert_eq!(
    material.pixel.output("Roughness").map(|v| v.code().into_owned()),
    Some("local1".to_owned())
  );
}

fn interpolated_call(lib: &mut FunctionLibrary) -> (Graph, NodeIndex) {
  let scale = lib.insert(scale_function());
  let wrap = lib.insert(wrapping_function(scale, true));

  let (mut graph, output) = with_output();
  let position = graph.add(NodeKind::PreSkinnedLocalPosition, Vec::new());
  let call = graph.add(NodeKind::MaterialFunction, vec![wrap.into()]);
  graph
    .connect(position, 0, call, function_call::FIRST_INPUT)
    .unwrap();
  graph
    .connect(
      call,
      function_call::FIRST_OUTPUT,
      output,
      MaterialParam::Emissive.box_id(),
    )
    .unwrap();

  (graph, call)
}

#[test]
fn interpolant_allocated_in_a_function() {
  let mut lib = FunctionLibrary::new();
  let (graph, call) = interpolated_call(&mut lib);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  gen.evaluate_output(call, function_call::FIRST_OUTPUT);

  assert_eq!(gen.interpolants().len(), 1);
  let interpolant = &gen.interpolants()[0];
  // allocated in the graph instantiated for the wrapping function
  assert_eq!(interpolant.input().graph, 1);
  assert_eq!(interpolant.input().box_id, BoxId(0));
  assert_eq!(interpolant.node().box_id, BoxId(1));
  assert_eq!(gen.context().depth(), 0);
}

#[test]
fn interpolant_in_a_function_reads_the_caller_in_the_vertex_stage() {
  let mut lib = FunctionLibrary::new();
  let (graph, _) = interpolated_call(&mut lib);

  let material = MaterialGenerator::new(graph, surface(), &lib)
    .generate()
    .unwrap();

  assert!(material.is_clean());
  assert_eq!(material.interpolants, 1);
  assert!(material
    .usage
    .contains(UsageFlags::USE_INTERPOLANTS | UsageFlags::USE_FUNCTIONS));

  assert_eq!(
    material.pixel.code,
    "  float4 local0 = input.CustomVSToPS[0] * float4(3.0, 3.0, 3.0, 3.0);\n"
  );
  assert_eq!(
    material.pixel.output("Emissive").map(|v| v.code().into_owned()),
    Some("local0.xyz".to_owned())
  );

  assert_eq!(material.vertex.code, "");
  assert_eq!(
    material
      .vertex
      .output("CustomVSToPS[0]")
      .map(|v| v.code().into_owned()),
    Some("float4(input.PreSkinnedPosition.xyz, 0.0)".to_owned())
  );
}

#[test]
fn diagnostics_tell_call_sites_apart() {
  let mut function_graph = Graph::new();
  let input = function_graph.add(NodeKind::FunctionInput, Vec::new());
  let output = function_graph.add(NodeKind::FunctionOutput, Vec::new());
  function_graph.connect(input, 0, output, 0).unwrap();

  let mut lib = FunctionLibrary::new();
  let id = lib.insert(MaterialFunction::new(
    AssetId::new_v4(),
    function_graph,
    Vec::new(),
    vec![NodeId(2)],
  ));

  let mut graph = Graph::new();
  let a = graph.add(NodeKind::MaterialFunction, vec![id.into()]);
  let b = graph.add(NodeKind::MaterialFunction, vec![id.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  gen.evaluate_output(a, function_call::FIRST_OUTPUT);
  gen.evaluate_output(b, function_call::FIRST_OUTPUT);

  assert_eq!(gen.diagnostics().len(), 2);
  assert_eq!(gen.diagnostics()[0].call_path, vec![NodeId(1)]);
  assert_eq!(gen.diagnostics()[1].call_path, vec![NodeId(2)]);
  assert_eq!(gen.diagnostics()[0].node, gen.diagnostics()[1].node);
}

#[test]
fn inputs_past_the_call_boxes() {
  let mut function_graph = Graph::new();
  let inputs = (0..=function_call::INPUTS)
    .map(|_| function_graph.add(NodeKind::FunctionInput, Vec::new()))
    .collect::<Vec<_>>();
  let output = function_graph.add(NodeKind::FunctionOutput, Vec::new());
  let last = inputs[inputs.len() - 1];
  function_graph.connect(last, 0, output, 0).unwrap();

  let input_ids = (1..=function_call::INPUTS + 1).map(NodeId).collect();
  let output_id = NodeId(function_call::INPUTS + 2);

  let mut lib = FunctionLibrary::new();
  let id = lib.insert(MaterialFunction::new(
    AssetId::new_v4(),
    function_graph,
    input_ids,
    vec![output_id],
  ));

  let mut graph = Graph::new();
  let call = graph.add(NodeKind::MaterialFunction, vec![id.into()]);

  let mut gen = MaterialGenerator::new(graph, surface(), &lib);
  let value = gen.evaluate_output(call, function_call::FIRST_OUTPUT);

  assert_eq!(value.code(), "0.0");
  assert_eq!(
    gen.diagnostics()[0].kind,
    ErrorKind::InvalidInputIndex(NodeId(function_call::INPUTS + 1))
  );
}
