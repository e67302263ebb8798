//! Errors and diagnostics.
//!
//! Two families of errors live here:
//!
//! - Hard errors, returned as [`Result`]: building a graph ([`GraphError`]), loading a function asset
//!   ([`LoadError`]) or starting a generation run ([`GenerateError`]).
//! - Diagnostics ([`Diagnostic`]), collected while generating code. A diagnostic never stops generation: the node
//!   that raised it evaluates to a neutral value and the run goes on, so that a single pass reports every problem of a
//!   graph at once.

use std::fmt;

use crate::{
  asset::AssetId,
  graph::{BoxId, NodeId},
  node::NodeTypeId,
  types::ValueType,
};

/// Kind of a generation diagnostic.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind {
  /// A function reference could not be resolved or failed to load.
  #[error("missing or invalid function {0}")]
  MissingOrInvalidAsset(AssetId),

  /// A function calls itself, or a function input was evaluated without a matching call.
  #[error("{0}")]
  RecursiveOrMalformedCall(String),

  /// A requested output box does not exist on the node or function.
  #[error("invalid output box {0}")]
  InvalidOutputIndex(BoxId),

  /// A function input node is not declared by its function.
  #[error("invalid function input {0}")]
  InvalidInputIndex(NodeId),

  /// No more vertex to pixel interpolants can be allocated.
  #[error("too many VS to PS interpolants used (at most {0})")]
  CapacityExceeded(usize),

  /// The construct is not legal for the current domain or stage.
  #[error("{0}")]
  UnsupportedInContext(String),

  /// A literal parameter is out of range.
  #[error("{0}")]
  InvalidParameter(String),

  /// A value cannot be converted to the requested type.
  #[error("cannot cast {from} to {to}")]
  TypeMismatch { from: ValueType, to: ValueType },
}

/// A non-fatal problem found while generating code, keyed to the node and box that caused it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
  /// Function asset owning the graph of the node; `None` for the material graph.
  pub function: Option<AssetId>,

  /// Call nodes leading to the graph of the node, outermost first; empty for the material graph.
  ///
  /// Tells apart the call sites of a function.
  pub call_path: Vec<NodeId>,

  /// Node that raised the diagnostic.
  pub node: NodeId,

  /// Box being evaluated when the diagnostic was raised.
  pub box_id: BoxId,

  /// What went wrong.
  pub kind: ErrorKind,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    if let Some(function) = self.function {
      write!(f, "function {}", function)?;

      for (i, call) in self.call_path.iter().enumerate() {
        let sep = if i == 0 { " called from " } else { " > " };
        write!(f, "{}{}", sep, call)?;
      }

      f.write_str(", ")?;
    }

    write!(f, "node {}, box {}: {}", self.node, self.box_id, self.kind)
  }
}

/// Errors raised while building a [`Graph`](crate::graph::Graph).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GraphError {
  #[error("node {0} already exists")]
  DuplicateNode(NodeId),

  #[error("no node at index {0}")]
  UnknownIndex(usize),

  #[error("unknown node type {0}")]
  UnknownType(NodeTypeId),

  #[error("node {node} has no box {box_id}")]
  UnknownBox { node: NodeId, box_id: BoxId },

  #[error("box {box_id} of node {node} is not an output")]
  NotAnOutput { node: NodeId, box_id: BoxId },

  #[error("box {box_id} of node {node} is not an input")]
  NotAnInput { node: NodeId, box_id: BoxId },

  #[error("box {box_id} of node {node} is already connected")]
  AlreadyConnected { node: NodeId, box_id: BoxId },
}

/// Errors raised by a [`FunctionResolver`](crate::asset::FunctionResolver).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum LoadError {
  #[error("function {0} not found")]
  NotFound(AssetId),

  #[error("function {0} failed to load: {1}")]
  Failed(AssetId, String),
}

/// Errors preventing a generation run from starting at all.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GenerateError {
  #[error("the material graph has no material output node")]
  MissingOutputNode,
}
