//! Material function calls and function inputs.
//!
//! A call node instantiates the graph of its function once, evaluates the requested function output inside a new
//! call frame and returns its value. Function input nodes read the argument connected to the call node, evaluated
//! in the caller; unconnected arguments fall back to the default of the input node.

use std::sync::Arc;

use crate::{
  asset::{AssetId, FunctionResolver, MaterialFunction},
  error::ErrorKind,
  generator::{BoxKey, CallContext, CallFrame, GraphIndex, GraphSlot, MaterialGenerator, Site},
  layer::UsageFlags,
  node::{function_call, ParamValue},
  value::Value,
};

impl<R> MaterialGenerator<R>
where
  R: FunctionResolver,
{
  pub(super) fn process_function_call(&mut self, site: &Site) -> Value {
    self.usage |= UsageFlags::USE_FUNCTIONS;

    let asset = site
      .param(0)
      .and_then(ParamValue::as_asset)
      .unwrap_or_else(AssetId::nil);

    let function = match self.resolver.load_function(asset) {
      Ok(function) => function,
      Err(err) => {
        log::debug!("cannot load function: {}", err);
        self.report_error(site.key, ErrorKind::MissingOrInvalidAsset(asset));
        return Value::float_zero();
      }
    };

    if self.is_calling(asset) {
      self.report_error(
        site.key,
        ErrorKind::RecursiveOrMalformedCall(format!("recursive call to function {}", asset)),
      );
      return Value::float_zero();
    }

    let graph = self.instantiate(site, &function);

    let output = site
      .box_id()
      .checked_sub(function_call::FIRST_OUTPUT)
      .filter(|&index| index < function_call::OUTPUTS)
      .and_then(|index| function.outputs().get(index as usize))
      .and_then(|&id| self.graphs[graph].graph.find(id));
    let output = match output {
      Some(output) => output,
      None => {
        self.report_error(site.key, ErrorKind::InvalidOutputIndex(site.key.box_id));
        return Value::float_zero();
      }
    };

    let frame = CallFrame {
      caller: site.key.graph,
      call_site: site.key.node,
      graph,
      function,
    };

    self.with_frame(frame, |gen| {
      gen.try_get_value(BoxKey::new(graph, output, 0), Value::float_zero())
    })
  }

  pub(super) fn process_function_input(&mut self, site: &Site) -> Value {
    let frame = match self.context.current_frame() {
      Some(frame) if frame.graph == site.key.graph => frame.clone(),
      _ => {
        self.report_error(
          site.key,
          ErrorKind::RecursiveOrMalformedCall("missing calling function node".to_owned()),
        );
        return Value::float_zero();
      }
    };

    // inputs past the boxes of the call node cannot be wired
    let index = frame
      .function
      .inputs()
      .iter()
      .position(|&id| id == site.id)
      .filter(|&index| (index as u32) < function_call::INPUTS);
    let index = match index {
      Some(index) => index,
      None => {
        self.report_error(site.key, ErrorKind::InvalidInputIndex(site.id));
        return Value::float_zero();
      }
    };

    let argument = BoxKey::new(
      frame.caller,
      frame.call_site,
      function_call::FIRST_INPUT + index as u32,
    );

    if self.is_connected(argument) {
      self.in_caller_context(|gen| gen.evaluate(argument))
    } else {
      self.input_or_param(site, 1, 1)
    }
  }

  /// Whether a graph instantiated from `asset` is being evaluated.
  fn is_calling(&self, asset: AssetId) -> bool {
    self.context.graphs().iter().any(|&graph| {
      self.graphs[graph]
        .function
        .as_ref()
        .map_or(false, |function| function.id() == asset)
    })
  }

  /// Graph of a function for a call site, instantiated on first call.
  fn instantiate(&mut self, site: &Site, function: &Arc<MaterialFunction>) -> GraphIndex {
    let call_site = (site.key.graph, site.key.node);
    if let Some(&graph) = self.instances.get(&call_site) {
      return graph;
    }

    let graph = self.graphs.len();
    log::debug!("instantiating function {} as graph {}", function.id(), graph);

    let mut call_path = self
      .graphs
      .get(site.key.graph)
      .map_or_else(Vec::new, |slot| slot.call_path.clone());
    call_path.push(site.id);

    self.graphs.push(GraphSlot {
      graph: function.graph().clone(),
      function: Some(function.clone()),
      call_path,
    });
    self.instances.insert(call_site, graph);

    graph
  }

  /// Evaluate inside a function call, leaving the call on every path.
  fn with_frame<T>(&mut self, frame: CallFrame, f: impl FnOnce(&mut Self) -> T) -> T {
    self.context.enter(frame);
    let result = f(self);
    self.context.leave();
    result
  }

  fn in_caller_context<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
    CallContext::in_caller_context(self, |gen| &mut gen.context, f)
  }
}
