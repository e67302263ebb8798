use matgen::{
  asset::FunctionLibrary,
  error::ErrorKind,
  generator::MaterialGenerator,
  graph::{Graph, NodeId},
  layer::{MaterialDomain, MaterialLayer, MaterialParam, UsageFlags},
  node::{custom_code, NodeKind, ParamValue},
};

fn generator(graph: Graph) -> MaterialGenerator<FunctionLibrary> {
  MaterialGenerator::new(
    graph,
    MaterialLayer::new(MaterialDomain::Surface),
    FunctionLibrary::new(),
  )
}

#[test]
fn placeholders_are_whole_identifiers() {
  let mut graph = Graph::new();
  let output = graph.add(NodeKind::MaterialOutput, Vec::new());
  let position = graph.add(NodeKind::WorldPosition, Vec::new());
  let code = graph.add(
    NodeKind::CustomCode,
    vec![ParamValue::from(
      "Output0 = Input0 * 2; float4 MyInput0 = Input01;\n",
    )],
  );
  graph
    .connect(position, 0, code, custom_code::FIRST_INPUT)
    .unwrap();
  graph
    .connect(
      code,
      custom_code::FIRST_OUTPUT,
      output,
      MaterialParam::Emissive.box_id(),
    )
    .unwrap();

  let material = generator(graph).generate().unwrap();

  assert!(material.is_clean());
  assert!(material.usage.contains(UsageFlags::USE_CUSTOM_CODE));
  assert_eq!(
    material.pixel.code,
    "  float4 local0 = float4(0.0, 0.0, 0.0, 0.0);
  {
local0 = float4(input.WorldPosition.xyz.xyz, 0.0) * 2; float4 MyInput0 = Input01;
  }
"
  );
  assert_eq!(
    material.pixel.output("Emissive").map(|v| v.code().into_owned()),
    Some("local0.xyz".to_owned())
  );
}

#[test]
fn block_is_written_once() {
  let mut graph = Graph::new();
  let output = graph.add(NodeKind::MaterialOutput, Vec::new());
  let code = graph.add(
    NodeKind::CustomCode,
    vec![ParamValue::from("Output0 = 1; Output1 = 2; Output2 = 3;")],
  );
  graph
    .connect(
      code,
      custom_code::FIRST_OUTPUT,
      output,
      MaterialParam::Emissive.box_id(),
    )
    .unwrap();
  graph
    .connect(
      code,
      custom_code::FIRST_OUTPUT + 1,
      output,
      MaterialParam::Color.box_id(),
    )
    .unwrap();

  let material = generator(graph).generate().unwrap();

  assert_eq!(material.pixel.code.matches('{').count(), 1);
  assert_eq!(
    material.pixel.code,
    "  float4 local0 = float4(0.0, 0.0, 0.0, 0.0);
  float4 local1 = float4(0.0, 0.0, 0.0, 0.0);
  {
local0 = 1; local1 = 2; Output2 = 3;
  }
"
  );
  assert_eq!(
    material.pixel.output("Color").map(|v| v.code().into_owned()),
    Some("local1.xyz".to_owned())
  );
  assert_eq!(
    material.pixel.output("Emissive").map(|v| v.code().into_owned()),
    Some("local0.xyz".to_owned())
  );
}

#[test]
fn unconnected_inputs_are_zero() {
  let mut graph = Graph::new();
  let code = graph.add(
    NodeKind::CustomCode,
    vec![ParamValue::from("Output3 = Input7;")],
  );
  let sink = graph.add(NodeKind::Abs, Vec::new());
  graph
    .connect(code, custom_code::FIRST_OUTPUT + 3, sink, 0)
    .unwrap();

  let mut gen = generator(graph);
  let value = gen.evaluate_output(code, custom_code::FIRST_OUTPUT + 3);

  assert_eq!(value.code(), "local0");
  assert_eq!(
    gen.code(),
    "  float4 local0 = float4(0.0, 0.0, 0.0, 0.0);
  {
local0 = float4(0.0, 0.0, 0.0, 0.0);
  }
"
  );
}

#[test]
fn empty_code() {
  let mut graph = Graph::new();
  let code = graph.add(NodeKind::CustomCode, vec![ParamValue::from("  \n")]);

  let mut gen = generator(graph);
  let value = gen.evaluate_output(code, custom_code::FIRST_OUTPUT);

  assert_eq!(value.code(), "0.0");
  assert_eq!(gen.statement_count(), 0);
  assert!(!gen.usage().contains(UsageFlags::USE_CUSTOM_CODE));
}

#[test]
fn cycle_through_a_sibling_output() {
  let mut graph = Graph::new();
  let code = graph.add(
    NodeKind::CustomCode,
    vec![ParamValue::from("Output0 = Input0; Output1 = 1;")],
  );
  let sink = graph.add(NodeKind::Abs, Vec::new());
  graph
    .connect(code, custom_code::FIRST_OUTPUT, sink, 0)
    .unwrap();
  graph
    .connect(code, custom_code::FIRST_OUTPUT + 1, code, custom_code::FIRST_INPUT)
    .unwrap();

  let mut gen = generator(graph);
  let value = gen.evaluate_output(code, custom_code::FIRST_OUTPUT);

  assert_eq!(value.code(), "local0");
  assert_eq!(gen.code().matches('{').count(), 1);
  assert_eq!(
    gen.code(),
    "  float4 local0 = float4(0.0, 0.0, 0.0, 0.0);
  float4 local1 = float4(0.0, 0.0, 0.0, 0.0);
  {
local0 = float4(0.0, 0.0, 0.0, 0.0); local1 = 1;
  }
"
  );

  assert_eq!(gen.diagnostics().len(), 1);
  assert_eq!(gen.diagnostics()[0].node, NodeId(1));
  assert!(matches!(
    gen.diagnostics()[0].kind,
    ErrorKind::RecursiveOrMalformedCall(_)
  ));
}
