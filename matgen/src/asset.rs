//! Material function assets.
//!
//! Loading assets is the job of the asset subsystem; the generator only needs a way to get a loaded function from its
//! identifier, blocking until it is ready. That contract is [`FunctionResolver`]. [`FunctionLibrary`] is an
//! in-memory implementation, handy for tools and tests.

use std::{collections::HashMap, fmt, sync::Arc};

use uuid::Uuid;

use crate::{
  error::LoadError,
  graph::{Graph, NodeId},
};

/// Identifier of an asset.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AssetId(pub Uuid);

impl AssetId {
  /// Generate a new random identifier.
  pub fn new_v4() -> Self {
    AssetId(Uuid::new_v4())
  }

  /// The nil identifier, referencing no asset.
  pub const fn nil() -> Self {
    AssetId(Uuid::nil())
  }

  pub fn is_nil(&self) -> bool {
    self.0.is_nil()
  }
}

impl fmt::Display for AssetId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

/// A reusable graph, called from materials (or other functions) with the material function node.
///
/// The graph declares its inputs and outputs as lists of node ids: the n-th input of the function is the n-th
/// function input node of [`MaterialFunction::inputs`], and the n-th output is the function output node of
/// [`MaterialFunction::outputs`].
#[derive(Clone, Debug)]
pub struct MaterialFunction {
  id: AssetId,
  graph: Graph,
  inputs: Vec<NodeId>,
  outputs: Vec<NodeId>,
}

impl MaterialFunction {
  pub fn new(id: AssetId, graph: Graph, inputs: Vec<NodeId>, outputs: Vec<NodeId>) -> Self {
    MaterialFunction {
      id,
      graph,
      inputs,
      outputs,
    }
  }

  pub fn id(&self) -> AssetId {
    self.id
  }

  /// The saved surface of the function, instantiated once per call site.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Function input nodes, in argument order.
  pub fn inputs(&self) -> &[NodeId] {
    &self.inputs
  }

  /// Function output nodes, in result order.
  pub fn outputs(&self) -> &[NodeId] {
    &self.outputs
  }
}

/// Resolve function assets, waiting for them to be loaded.
///
/// This is the only blocking operation of a generation run. There is no cancellation: the call returns once the asset
/// is loaded or failed to.
pub trait FunctionResolver {
  fn load_function(&self, id: AssetId) -> Result<Arc<MaterialFunction>, LoadError>;
}

impl<R> FunctionResolver for &'_ R
where
  R: FunctionResolver + ?Sized,
{
  fn load_function(&self, id: AssetId) -> Result<Arc<MaterialFunction>, LoadError> {
    (**self).load_function(id)
  }
}

/// In-memory [`FunctionResolver`].
#[derive(Debug, Default)]
pub struct FunctionLibrary {
  functions: HashMap<AssetId, Result<Arc<MaterialFunction>, String>>,
}

impl FunctionLibrary {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a function, replacing any function with the same id.
  pub fn insert(&mut self, function: MaterialFunction) -> AssetId {
    let id = function.id();
    self.functions.insert(id, Ok(Arc::new(function)));
    id
  }

  /// Register an asset that exists but fails to load.
  pub fn insert_broken(&mut self, id: AssetId, reason: impl Into<String>) {
    self.functions.insert(id, Err(reason.into()));
  }

  pub fn len(&self) -> usize {
    self.functions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.functions.is_empty()
  }
}

impl FunctionResolver for FunctionLibrary {
  fn load_function(&self, id: AssetId) -> Result<Arc<MaterialFunction>, LoadError> {
    match self.functions.get(&id) {
      Some(Ok(function)) => Ok(function.clone()),
      Some(Err(reason)) => Err(LoadError::Failed(id, reason.clone())),
      None => Err(LoadError::NotFound(id)),
    }
  }
}
