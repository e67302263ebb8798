//! Shader code writers.
//!
//! [`ShaderWriter`] is the statement buffer the generator emits into while evaluating a stage. Once a stage is
//! done, its buffer is turned into a [`StageSource`]; the [`hlsl`] module assembles the stage sources of a material
//! into the final text.

pub mod hlsl;

use crate::{types::ValueType, value::Value};

/// Statement buffer of one shader stage.
///
/// Every statement is written at one indent level, as the body of the stage function. Locals are named `localN`,
/// with `N` increasing for the whole lifetime of the writer.
#[derive(Debug, Default)]
pub struct ShaderWriter {
  code: String,
  statements: usize,
  next_local: usize,
}

impl ShaderWriter {
  pub fn new() -> Self {
    Self::default()
  }

  fn fresh_local(&mut self) -> String {
    let name = format!("local{}", self.next_local);
    self.next_local += 1;
    name
  }

  fn push_indent(&mut self) {
    self.code.push_str(&" ".repeat(hlsl::INDENT_SPACES));
  }

  fn begin_statement(&mut self) {
    self.statements += 1;
    self.push_indent();
  }

  /// Declare a new local initialized with `init` and return its value.
  pub fn write_local(&mut self, ty: ValueType, init: &str) -> Value {
    let name = self.fresh_local();

    self.begin_statement();
    self.code.push_str(&format!("{} {} = {};\n", ty, name, init));

    Value::new(ty, name)
  }

  /// Declare a new zero-initialized local and return its value.
  pub fn declare_local(&mut self, ty: ValueType) -> Value {
    let zero = Value::zero(ty);
    self.write_local(ty, &zero.code())
  }

  /// Write a scoped block of raw code.
  pub fn write_block(&mut self, body: &str) {
    self.begin_statement();
    self.code.push_str("{\n");
    self.code.push_str(body);

    if !body.ends_with('\n') {
      self.code.push('\n');
    }

    self.push_indent();
    self.code.push_str("}\n");
  }

  /// Write a one-line comment; comments are not statements.
  pub fn write_comment(&mut self, comment: &str) {
    self.push_indent();
    self.code.push_str(&format!("// {}\n", comment));
  }

  /// Number of statements written so far.
  pub fn statement_count(&self) -> usize {
    self.statements
  }

  /// Code written so far.
  pub fn code(&self) -> &str {
    &self.code
  }

  /// Turn the written statements and the stage outputs into a [`StageSource`].
  pub fn finish(self, outputs: Vec<StageOutput>) -> StageSource {
    StageSource {
      code: self.code,
      outputs,
    }
  }
}

/// Assignment of a value to a field of the material structure, such as `Color` or `CustomVSToPS[0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct StageOutput {
  pub target: String,
  pub value: Value,
}

/// Generated code of a single shader stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageSource {
  /// Statements, one per line, indented as a function body.
  pub code: String,

  /// Material fields written once the statements have run, in writing order.
  pub outputs: Vec<StageOutput>,
}

impl StageSource {
  /// Find the value written to a material field.
  pub fn output(&self, target: &str) -> Option<&Value> {
    self
      .outputs
      .iter()
      .find(|output| output.target == target)
      .map(|output| &output.value)
  }
}
