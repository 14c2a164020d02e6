//! Free-form per-layer arguments.
//!
//! Each argument is one line of the form `"<keyword> <values...>"`, e.g.
//! `"grid_color 1 1 1 0.5"` or `"point 10.5 0.25"`. Renderers look up the
//! lines they understand by prefix; everything else is ignored.

use thiserror::Error;

use crate::canvas::Rgba;

/// Errors raised while interpreting a layer argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgError {
    /// A colour argument did not carry exactly four numbers.
    #[error("Argument \"{line}\": expected 4 numbers, got {count}")]
    RgbaCount { line: String, count: usize },

    /// A required argument is absent.
    #[error("Missing required argument '{keyword}'")]
    Missing { keyword: &'static str },

    /// The argument is present but its values make no sense.
    #[error("Argument \"{line}\": {reason}")]
    Invalid { line: String, reason: String },
}

/// Ordered list of argument lines shared by every layer of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerArgs {
    lines: Vec<String>,
}

impl LayerArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from argument lines, dropping blank ones.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = Self::new();
        for line in lines {
            args.push(line);
        }
        args
    }

    /// Append one argument line. Surrounding whitespace is trimmed, the
    /// keyword is separated from its values by a single space, and blank
    /// lines are ignored.
    pub fn push(&mut self, line: impl Into<String>) {
        let line: String = line.into();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        let normalized = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => format!("{} {}", keyword, rest.trim_start()),
            None => trimmed.to_string(),
        };
        self.lines.push(normalized);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First whole line starting with `prefix`.
    pub fn first_of_type(&self, prefix: &str) -> Option<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .find(|line| line.starts_with(prefix))
    }

    /// The remainder (after `prefix`) of every line starting with `prefix`.
    pub fn all_of_type(&self, prefix: &str) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix(prefix))
            .collect()
    }

    /// Like [`all_of_type`](Self::all_of_type) for several prefixes at once,
    /// keeping line order and reporting which prefix matched.
    ///
    /// A line matching more than one prefix is reported once per prefix.
    pub fn all_of_types<'p>(&self, prefixes: &[&'p str]) -> Vec<(&'p str, &str)> {
        let mut out = Vec::new();
        for line in &self.lines {
            for &prefix in prefixes {
                if let Some(rest) = line.strip_prefix(prefix) {
                    out.push((prefix, rest));
                }
            }
        }
        out
    }

    /// Value of the first `prefix` line, or `default` if there is none or it
    /// does not parse.
    pub fn first_double_of_type(&self, prefix: &str, default: f64) -> f64 {
        self.first_of_type(prefix)
            .map_or(default, |line| double_arg(line, default))
    }

    /// Leading number of every `prefix` line. Lines whose value does not
    /// parse are skipped.
    pub fn doubles_of_type(&self, prefix: &str) -> Vec<f64> {
        self.all_of_type(prefix)
            .into_iter()
            .filter_map(|rest| rest.split_whitespace().next()?.parse().ok())
            .collect()
    }

    /// Colour from the first `prefix` line, if present.
    ///
    /// # Errors
    ///
    /// Returns `ArgError::RgbaCount` if the line is present but malformed.
    pub fn first_rgba_of_type(&self, prefix: &str) -> Result<Option<Rgba>, ArgError> {
        self.first_of_type(prefix).map(parse_rgba).transpose()
    }
}

/// The text after the keyword of `line`, if any.
fn values(line: &str) -> Option<&str> {
    line.split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim_start())
}

/// Integer following the keyword, or `default`.
///
/// Accepts decimal and `0x` hexadecimal values.
pub fn int_arg(line: &str, default: i64) -> i64 {
    let Some(token) = values(line).and_then(|v| v.split_whitespace().next()) else {
        return default;
    };
    let (digits, negative) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token.strip_prefix('+').unwrap_or(token), false),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    };
    match parsed {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => default,
    }
}

/// Number following the keyword, or `default`.
pub fn double_arg(line: &str, default: f64) -> f64 {
    values(line)
        .and_then(|v| v.split_whitespace().next())
        .and_then(|t| t.parse().ok())
        .unwrap_or(default)
}

/// Every number following the keyword, stopping at the first token that is
/// not a number.
pub fn doubles(line: &str) -> Vec<f64> {
    values(line)
        .map(|v| {
            v.split_whitespace()
                .map_while(|t| t.parse::<f64>().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `"<keyword> r g b a"` into a colour.
///
/// # Errors
///
/// Returns `ArgError::RgbaCount` unless exactly four numbers follow the keyword.
pub fn parse_rgba(line: &str) -> Result<Rgba, ArgError> {
    match doubles(line).as_slice() {
        &[r, g, b, a] => Ok(Rgba::new(r, g, b, a)),
        other => Err(ArgError::RgbaCount {
            line: line.to_string(),
            count: other.len(),
        }),
    }
}

/// Opaque colour for a single-letter code: `r b m y g c w k`.
pub fn parse_color_code(code: char) -> Option<Rgba> {
    let (r, g, b) = match code {
        'r' => (1.0, 0.0, 0.0),
        'b' => (0.0, 0.0, 1.0),
        'm' => (1.0, 0.0, 1.0),
        'y' => (1.0, 1.0, 0.0),
        'g' => (0.0, 1.0, 0.0),
        'c' => (0.0, 1.0, 1.0),
        'w' => (1.0, 1.0, 1.0),
        'k' => (0.0, 0.0, 0.0),
        _ => return None,
    };
    Some(Rgba::rgb(r, g, b))
}
