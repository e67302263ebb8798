//! Custom code templates.
//!
//! The custom code node carries raw shader code referencing its inputs as `Input0` … `Input7` and its outputs as
//! `Output0` … `Output3`. The code is parsed once into a [`CodeTemplate`]: a list of text segments and placeholder
//! slots. Placeholders are whole identifiers only, so `MyInput0` or `Input01` stay plain text.

use crate::node::custom_code;

/// A piece of a [`CodeTemplate`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
  Text(String),
  Input(usize),
  Output(usize),
}

/// Parsed custom code.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodeTemplate {
  segments: Vec<Segment>,
}

impl CodeTemplate {
  /// Parse custom code.
  pub fn parse(code: &str) -> Self {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = code;

    while let Some(c) = rest.chars().next() {
      let len = if is_ident_char(c) {
        rest.find(|c| !is_ident_char(c)).unwrap_or(rest.len())
      } else {
        c.len_utf8()
      };
      let (token, tail) = rest.split_at(len);
      rest = tail;

      match placeholder(token) {
        Some(segment) => {
          if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
          }

          segments.push(segment);
        }

        None => text.push_str(token),
      }
    }

    if !text.is_empty() {
      segments.push(Segment::Text(text));
    }

    CodeTemplate { segments }
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  /// Render the code, replacing placeholders by slot.
  ///
  /// A slot bound to `None` renders its placeholder name unchanged.
  pub fn render<I, O>(&self, inputs: &[Option<I>], outputs: &[Option<O>]) -> String
  where
    I: AsRef<str>,
    O: AsRef<str>,
  {
    let mut code = String::new();

    for segment in &self.segments {
      match segment {
        Segment::Text(text) => code.push_str(text),

        Segment::Input(slot) => match inputs.get(*slot) {
          Some(Some(value)) => code.push_str(value.as_ref()),
          _ => code.push_str(&format!("Input{}", slot)),
        },

        Segment::Output(slot) => match outputs.get(*slot) {
          Some(Some(value)) => code.push_str(value.as_ref()),
          _ => code.push_str(&format!("Output{}", slot)),
        },
      }
    }

    code
  }
}

fn is_ident_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

fn placeholder(token: &str) -> Option<Segment> {
  let slot = |digits: &str, max: u32| -> Option<usize> {
    match digits.as_bytes() {
      [d] if d.is_ascii_digit() && u32::from(d - b'0') < max => Some(usize::from(d - b'0')),
      _ => None,
    }
  };

  if let Some(digits) = token.strip_prefix("Input") {
    slot(digits, custom_code::INPUTS).map(Segment::Input)
  } else if let Some(digits) = token.strip_prefix("Output") {
    slot(digits, custom_code::OUTPUTS).map(Segment::Output)
  } else {
    None
  }
}
