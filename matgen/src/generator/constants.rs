//! Constant nodes.

use crate::{
  asset::FunctionResolver,
  generator::{MaterialGenerator, Site},
  node::ParamValue,
  value::Value,
};

impl<R> MaterialGenerator<R>
where
  R: FunctionResolver,
{
  /// Literal of parameter 0, converted to the type of the output box.
  pub(super) fn process_constant(&mut self, site: &Site) -> Value {
    let ty = self.box_type(site.key);

    match site.param(0).and_then(ParamValue::to_value) {
      Some(value) => self.cast_or_report(site.key, value, ty),
      None => Value::zero(ty),
    }
  }
}
