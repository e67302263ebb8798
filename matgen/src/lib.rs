//! Matgen, a material graph to shader source generator.
//!
//! Materials are authored as graphs: nodes (world position, camera vectors, math operations, custom code, calls to
//! reusable material functions, …) connected through typed boxes, all ending up in a single material output node.
//! This crate translates such a graph into the HLSL code of the vertex and pixel stages of the material.
//!
//! Generation is a small compiler pass:
//!
//! - Boxes are evaluated lazily, starting from the material output node and walking connections backwards. Every
//!   output box is evaluated once per stage and its value cached, so that statements are never duplicated.
//! - Material functions are inlined: each call site instantiates its own copy of the function graph, and function
//!   inputs read the argument connected at the call site. Recursive calls are detected and reported.
//! - Vertex to pixel interpolants are allocated from a fixed set of slots when a pixel stage value is requested from
//!   the vertex stage.
//! - Some nodes only make sense in some material domains (terrain weights, interpolants, …); they degrade to neutral
//!   values elsewhere.
//!
//! Problems found in the graph never stop generation. They are reported as [`Diagnostic`](error::Diagnostic)s, and the
//! faulty node evaluates to a neutral value so that the rest of the graph still generates.
//!
//! # Example
//!
//! ```rust
//! use matgen::{
//!   asset::FunctionLibrary,
//!   generator::MaterialGenerator,
//!   graph::Graph,
//!   layer::{MaterialDomain, MaterialLayer, MaterialParam},
//!   node::NodeKind,
//! };
//!
//! let mut graph = Graph::new();
//! let output = graph.add(NodeKind::MaterialOutput, Vec::new());
//! let camera = graph.add(NodeKind::CameraVector, Vec::new());
//! graph.connect(camera, 0, output, MaterialParam::Emissive.box_id()).unwrap();
//!
//! let layer = MaterialLayer::new(MaterialDomain::Surface);
//! let material = MaterialGenerator::new(graph, layer, FunctionLibrary::new())
//!   .generate()
//!   .unwrap();
//!
//! assert!(material.is_clean());
//! assert_eq!(
//!   material.pixel.code,
//!   "  float3 local0 = normalize(ViewPos - input.WorldPosition.xyz);\n"
//! );
//! println!("{}", material.to_hlsl().unwrap());
//! ```

pub mod asset;
pub mod error;
pub mod generator;
pub mod graph;
pub mod layer;
pub mod node;
pub mod template;
pub mod types;
pub mod value;
pub mod writer;
