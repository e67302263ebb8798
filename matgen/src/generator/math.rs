//! Math nodes.
//!
//! Binary nodes read their operands from boxes 0 and 1, falling back to parameters 0 and 1. The result type is the
//! widest of both operand types. Every result is written to a local.

use crate::{
  asset::FunctionResolver,
  generator::{MaterialGenerator, Site},
  types::ValueType,
  value::Value,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum BinaryOp {
  Add,
  Subtract,
  Multiply,
  Divide,
  Min,
  Max,
  Dot,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum UnaryOp {
  Abs,
  Saturate,
  Normalize,
}

impl UnaryOp {
  fn name(self) -> &'static str {
    match self {
      UnaryOp::Abs => "abs",
      UnaryOp::Saturate => "saturate",
      UnaryOp::Normalize => "normalize",
    }
  }
}

impl<R> MaterialGenerator<R>
where
  R: FunctionResolver,
{
  pub(super) fn process_binary(&mut self, site: &Site, op: BinaryOp) -> Value {
    let a = self.input_or_param(site, 0, 0);
    let b = self.input_or_param(site, 1, 1);

    let ty = a.ty().widest(b.ty());
    let a = self.cast_or_report(site.key, a, ty);
    let b = self.cast_or_report(site.key, b, ty);

    let (ty, init) = match op {
      BinaryOp::Add => (ty, format!("{} + {}", a, b)),
      BinaryOp::Subtract => (ty, format!("{} - {}", a, b)),
      BinaryOp::Multiply => (ty, format!("{} * {}", a, b)),
      BinaryOp::Divide => (ty, format!("{} / {}", a, b)),
      BinaryOp::Min => (ty, format!("min({}, {})", a, b)),
      BinaryOp::Max => (ty, format!("max({}, {})", a, b)),
      BinaryOp::Dot => (ValueType::FLOAT, format!("dot({}, {})", a, b)),
    };

    self.write_local(ty, &init)
  }

  pub(super) fn process_unary(&mut self, site: &Site, op: UnaryOp) -> Value {
    let x = self.input_or_param(site, 0, 0);
    self.write_local(x.ty(), &format!("{}({})", op.name(), x))
  }
}
