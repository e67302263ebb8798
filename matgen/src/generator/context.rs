//! Call context of function inlining.
//!
//! Entering a function pushes a [`CallFrame`] and the instantiated graph of the call site. Function inputs look for
//! the frame whose graph is the current one, and read their argument in the caller by popping the current graph for
//! the time of a single evaluation.

use std::sync::Arc;

use crate::{asset::MaterialFunction, generator::GraphIndex, graph::NodeIndex};

/// An active function call.
#[derive(Clone, Debug)]
pub struct CallFrame {
  /// Graph holding the call node.
  pub caller: GraphIndex,

  /// The call node.
  pub call_site: NodeIndex,

  /// Graph instantiated from the function for this call site.
  pub graph: GraphIndex,

  pub function: Arc<MaterialFunction>,
}

/// Stack of active calls and stack of graphs being evaluated.
#[derive(Clone, Debug)]
pub struct CallContext {
  frames: Vec<CallFrame>,
  graphs: Vec<GraphIndex>,
}

impl CallContext {
  /// Context of the material graph, with no active call.
  pub fn root(graph: GraphIndex) -> Self {
    CallContext {
      frames: Vec::new(),
      graphs: vec![graph],
    }
  }

  /// Graph being evaluated.
  pub fn current_graph(&self) -> Option<GraphIndex> {
    self.graphs.last().copied()
  }

  pub fn graphs(&self) -> &[GraphIndex] {
    &self.graphs
  }

  pub fn frames(&self) -> &[CallFrame] {
    &self.frames
  }

  /// Number of active calls.
  pub fn depth(&self) -> usize {
    self.frames.len()
  }

  pub(crate) fn enter(&mut self, frame: CallFrame) {
    self.graphs.push(frame.graph);
    self.frames.push(frame);
  }

  pub(crate) fn leave(&mut self) -> Option<CallFrame> {
    self.graphs.pop();
    self.frames.pop()
  }

  /// Nearest active call whose instantiated graph is the current graph.
  pub fn current_frame(&self) -> Option<&CallFrame> {
    let graph = self.current_graph()?;
    self.frames.iter().rev().find(|frame| frame.graph == graph)
  }

  /// Run `f` with the current graph popped, so that it evaluates in the caller.
  ///
  /// The popped graph is pushed back before returning.
  pub(crate) fn in_caller_context<S, T>(
    state: &mut S,
    context: impl Fn(&mut S) -> &mut CallContext,
    f: impl FnOnce(&mut S) -> T,
  ) -> T {
    let popped = context(state).graphs.pop();
    let result = f(state);

    if let Some(graph) = popped {
      context(state).graphs.push(graph);
    }

    result
  }
}
