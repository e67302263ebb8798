//! Material graphs.
//!
//! A [`Graph`] is an arena of [`Node`]s addressed by [`NodeIndex`]. Each node owns its boxes; an input box stores at
//! most one incoming [`Connection`] (the producer node and box), while an output box can feed any number of inputs.
//! Boxes also carry the value cache filled by the generator.

use std::fmt;

use crate::{
  error::GraphError,
  node::{Direction, NodeKind, NodeTypeId, ParamValue},
  types::ValueType,
  value::Value,
};

/// Author-visible identifier of a node, unique within its graph.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Identifier of a box, unique within its node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BoxId(pub u32);

impl fmt::Display for BoxId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u32> for BoxId {
  fn from(id: u32) -> Self {
    BoxId(id)
  }
}

/// Position of a node in its graph.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeIndex(pub usize);

/// Incoming connection of an input box: the producing node and its output box.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Connection {
  pub node: NodeIndex,
  pub box_id: BoxId,
}

/// A typed port of a node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GraphBox {
  id: BoxId,
  direction: Direction,
  ty: ValueType,
  connection: Option<Connection>,
  #[cfg_attr(feature = "serde", serde(skip))]
  pub(crate) cache: Option<Value>,
}

impl GraphBox {
  pub fn id(&self) -> BoxId {
    self.id
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  /// Declared type, used for the value of unconnected inputs.
  pub fn ty(&self) -> ValueType {
    self.ty
  }

  /// Producer feeding this box, if any; always `None` for outputs.
  pub fn connection(&self) -> Option<Connection> {
    self.connection
  }

  pub fn has_connection(&self) -> bool {
    self.connection.is_some()
  }

  /// Cached value, set once the box has been evaluated during the current stage.
  pub fn cache(&self) -> Option<&Value> {
    self.cache.as_ref()
  }
}

/// An operation instance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
  id: NodeId,
  kind: NodeKind,
  params: Vec<ParamValue>,
  boxes: Vec<GraphBox>,
}

impl Node {
  fn new(id: NodeId, kind: NodeKind, params: Vec<ParamValue>) -> Self {
    let boxes = kind
      .boxes()
      .iter()
      .map(|decl| GraphBox {
        id: BoxId(decl.id),
        direction: decl.direction,
        ty: decl.ty,
        connection: None,
        cache: None,
      })
      .collect();

    Node {
      id,
      kind,
      params,
      boxes,
    }
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  pub fn kind(&self) -> NodeKind {
    self.kind
  }

  pub fn params(&self) -> &[ParamValue] {
    &self.params
  }

  pub fn param(&self, index: usize) -> Option<&ParamValue> {
    self.params.get(index)
  }

  pub fn boxes(&self) -> &[GraphBox] {
    &self.boxes
  }

  pub fn get_box(&self, id: BoxId) -> Option<&GraphBox> {
    self.boxes.iter().find(|b| b.id == id)
  }

  pub(crate) fn get_box_mut(&mut self, id: BoxId) -> Option<&mut GraphBox> {
    self.boxes.iter_mut().find(|b| b.id == id)
  }
}

/// Ordered collection of nodes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
  nodes: Vec<Node>,
}

impl Graph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a node with an explicit id.
  pub fn add_node(
    &mut self,
    id: NodeId,
    kind: NodeKind,
    params: Vec<ParamValue>,
  ) -> Result<NodeIndex, GraphError> {
    if self.find(id).is_some() {
      return Err(GraphError::DuplicateNode(id));
    }

    self.nodes.push(Node::new(id, kind, params));
    Ok(NodeIndex(self.nodes.len() - 1))
  }

  /// Add a node from its stored type identifier.
  pub fn add_node_by_type(
    &mut self,
    id: NodeId,
    ty: NodeTypeId,
    params: Vec<ParamValue>,
  ) -> Result<NodeIndex, GraphError> {
    let kind = NodeKind::from_type_id(ty).ok_or(GraphError::UnknownType(ty))?;
    self.add_node(id, kind, params)
  }

  /// Add a node, picking the next free id.
  pub fn add(&mut self, kind: NodeKind, params: Vec<ParamValue>) -> NodeIndex {
    let id = self.nodes.iter().map(|node| node.id.0 + 1).max().unwrap_or(1);
    self.nodes.push(Node::new(NodeId(id), kind, params));
    NodeIndex(self.nodes.len() - 1)
  }

  /// Connect the output box `from_box` of `from` to the input box `to_box` of `to`.
  ///
  /// An input accepts a single connection; connecting an already connected input fails.
  pub fn connect(
    &mut self,
    from: NodeIndex,
    from_box: u32,
    to: NodeIndex,
    to_box: u32,
  ) -> Result<(), GraphError> {
    let from_box = BoxId(from_box);
    let to_box = BoxId(to_box);

    let producer = self.try_node(from)?;
    match producer.get_box(from_box) {
      Some(b) if b.direction == Direction::Out => (),
      Some(_) => {
        return Err(GraphError::NotAnOutput {
          node: producer.id,
          box_id: from_box,
        })
      }
      None => {
        return Err(GraphError::UnknownBox {
          node: producer.id,
          box_id: from_box,
        })
      }
    }

    let consumer = self
      .nodes
      .get_mut(to.0)
      .ok_or(GraphError::UnknownIndex(to.0))?;
    let consumer_id = consumer.id;
    let input = consumer.get_box_mut(to_box).ok_or(GraphError::UnknownBox {
      node: consumer_id,
      box_id: to_box,
    })?;

    if input.direction != Direction::In {
      return Err(GraphError::NotAnInput {
        node: consumer_id,
        box_id: to_box,
      });
    }

    if input.connection.is_some() {
      return Err(GraphError::AlreadyConnected {
        node: consumer_id,
        box_id: to_box,
      });
    }

    input.connection = Some(Connection {
      node: from,
      box_id: from_box,
    });

    Ok(())
  }

  fn try_node(&self, index: NodeIndex) -> Result<&Node, GraphError> {
    self.nodes.get(index.0).ok_or(GraphError::UnknownIndex(index.0))
  }

  pub fn node(&self, index: NodeIndex) -> Option<&Node> {
    self.nodes.get(index.0)
  }

  pub(crate) fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
    self.nodes.get_mut(index.0)
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Find a node by id.
  pub fn find(&self, id: NodeId) -> Option<NodeIndex> {
    self.nodes.iter().position(|node| node.id == id).map(NodeIndex)
  }

  /// Find the first node of a given kind.
  pub fn find_kind(&self, kind: NodeKind) -> Option<NodeIndex> {
    self
      .nodes
      .iter()
      .position(|node| node.kind == kind)
      .map(NodeIndex)
  }

  /// Whether an output box feeds at least one input.
  pub fn has_consumers(&self, node: NodeIndex, box_id: BoxId) -> bool {
    let target = Connection { node, box_id };

    self
      .nodes
      .iter()
      .flat_map(|node| node.boxes.iter())
      .any(|b| b.connection == Some(target))
  }

  /// Forget every cached value.
  pub(crate) fn clear_caches(&mut self) {
    for b in self.nodes.iter_mut().flat_map(|node| node.boxes.iter_mut()) {
      b.cache = None;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn float(graph: &mut Graph, x: f32) -> NodeIndex {
    graph.add(NodeKind::Float, vec![x.into()])
  }

  #[test]
  fn add_assigns_ids() {
    let mut graph = Graph::new();
    let a = float(&mut graph, 1.);
    let b = float(&mut graph, 2.);

    assert_eq!(graph.node(a).map(Node::id), Some(NodeId(1)));
    assert_eq!(graph.node(b).map(Node::id), Some(NodeId(2)));
    assert_eq!(graph.find(NodeId(2)), Some(b));
  }

  #[test]
  fn duplicate_ids() {
    let mut graph = Graph::new();
    graph.add_node(NodeId(7), NodeKind::Depth, Vec::new()).unwrap();

    assert_eq!(
      graph.add_node(NodeId(7), NodeKind::Depth, Vec::new()),
      Err(GraphError::DuplicateNode(NodeId(7)))
    );
  }

  #[test]
  fn add_by_type_id() {
    let mut graph = Graph::new();
    let n = graph
      .add_node_by_type(NodeId(1), NodeTypeId::new(1, 2), Vec::new())
      .unwrap();

    assert_eq!(graph.node(n).map(Node::kind), Some(NodeKind::WorldPosition));
    assert_eq!(
      graph.add_node_by_type(NodeId(2), NodeTypeId::new(42, 1), Vec::new()),
      Err(GraphError::UnknownType(NodeTypeId::new(42, 1)))
    );
  }

  #[test]
  fn single_incoming_connection() {
    let mut graph = Graph::new();
    let a = float(&mut graph, 1.);
    let b = float(&mut graph, 2.);
    let add = graph.add(NodeKind::Add, Vec::new());

    graph.connect(a, 0, add, 0).unwrap();
    assert_eq!(
      graph.connect(b, 0, add, 0),
      Err(GraphError::AlreadyConnected {
        node: NodeId(3),
        box_id: BoxId(0)
      })
    );

    // fan-out is fine
    graph.connect(a, 0, add, 1).unwrap();
    assert!(graph.has_consumers(a, BoxId(0)));
    assert!(!graph.has_consumers(b, BoxId(0)));
  }

  #[test]
  fn connection_directions() {
    let mut graph = Graph::new();
    let a = float(&mut graph, 1.);
    let add = graph.add(NodeKind::Add, Vec::new());

    assert_eq!(
      graph.connect(add, 0, a, 0),
      Err(GraphError::NotAnOutput {
        node: NodeId(2),
        box_id: BoxId(0)
      })
    );
    assert_eq!(
      graph.connect(a, 0, add, 2),
      Err(GraphError::NotAnInput {
        node: NodeId(2),
        box_id: BoxId(2)
      })
    );
    assert_eq!(
      graph.connect(a, 5, add, 0),
      Err(GraphError::UnknownBox {
        node: NodeId(1),
        box_id: BoxId(5)
      })
    );
  }
}
