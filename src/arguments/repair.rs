//! Best-effort structural repair of model-generated JSON.
//!
//! Models sometimes emit argument text that is almost JSON. The repair pass
//! parses it leniently and re-serializes it, fixing:
//!
//! - single-quoted strings and unquoted keys
//! - trailing commas and missing commas between members
//! - unterminated strings, objects and arrays at end of input
//! - Python-style `True`, `False` and `None`
//! - markdown code fences and prose around the value
//! - bare words in value position (kept as strings)
//!
//! Nothing semantic is changed: values are never reinterpreted against a
//! schema here. That happens in validation.

use serde_json::{Map, Number, Value};

/// Deepest nesting the repair pass will descend into; matches serde_json.
const MAX_DEPTH: usize = 128;

/// Repairs `input` into valid JSON text.
///
/// Returns `None` when no JSON value can be recovered at all.
#[must_use]
pub fn repair_json(input: &str) -> Option<String> {
    repair_value(input).map(|v| v.to_string())
}

/// Repairs `input` and returns the recovered value.
#[must_use]
pub fn repair_value(input: &str) -> Option<Value> {
    let body = strip_code_fence(input.trim());
    let start = body.find(['{', '['])?;
    let mut parser = LenientParser::new(&body[start..]);
    let value = parser.parse_value();
    if parser.too_deep {
        tracing::debug!(max_depth = MAX_DEPTH, "Arguments nest too deeply to repair");
        return None;
    }
    value
}

fn strip_code_fence(input: &str) -> &str {
    let Some(rest) = input.strip_prefix("```") else {
        return input;
    };
    // Drop the info string (```json) up to the first newline.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    match rest.rfind("```") {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

struct LenientParser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    too_deep: bool,
}

impl LenientParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
            too_deep: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '/' && self.chars.get(self.pos + 1) == Some(&'/') {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        match self.peek()? {
            c @ ('{' | '[') => {
                if self.depth >= MAX_DEPTH {
                    self.too_deep = true;
                    return None;
                }
                self.depth += 1;
                let value = if c == '{' {
                    self.parse_object()
                } else {
                    self.parse_array()
                };
                self.depth -= 1;
                Some(value)
            }
            '"' | '\'' => Some(Value::String(self.parse_string())),
            _ => self.parse_bare(),
        }
    }

    fn parse_object(&mut self) -> Value {
        self.bump();
        let mut map = Map::new();
        while !self.too_deep {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                // A stray closing bracket ends the object as well.
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) => {}
            }

            let key = match self.peek() {
                Some('"') | Some('\'') => self.parse_string(),
                _ => self.parse_bare_key(),
            };
            if key.is_empty() {
                // Unrecognizable token; skip it to guarantee progress.
                self.bump();
                continue;
            }

            self.skip_whitespace();
            if self.peek() == Some(':') {
                self.bump();
            }
            self.skip_whitespace();
            let value = match self.peek() {
                None | Some(',') | Some('}') => Value::Null,
                _ => self.parse_value().unwrap_or(Value::Null),
            };
            map.insert(key, value);
        }
        Value::Object(map)
    }

    fn parse_array(&mut self) -> Value {
        self.bump();
        let mut items = Vec::new();
        while !self.too_deep {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(']') | Some('}') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }
            let before = self.pos;
            match self.parse_value() {
                Some(value) => items.push(value),
                None => {
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        Value::Array(items)
    }

    fn parse_string(&mut self) -> String {
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return out;
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{0008}'),
                Some('f') => out.push('\u{000C}'),
                Some('u') => {
                    let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push_str("\\u");
                            out.push_str(&hex);
                        }
                    }
                }
                Some(other) => out.push(other),
                None => break,
            }
        }
        // Unterminated string: keep what was read.
        out
    }

    fn parse_bare_key(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == ':' || c == ',' || c == '}' || c.is_whitespace() {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }

    fn parse_bare(&mut self) -> Option<Value> {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, ',' | '}' | ']' | '\n') {
                break;
            }
            token.push(c);
            self.pos += 1;
        }
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(match token {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" | "undefined" => Value::Null,
            _ => parse_number(token).unwrap_or_else(|| Value::String(token.to_string())),
        })
    }
}

fn parse_number(token: &str) -> Option<Value> {
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    let f = token.parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}
