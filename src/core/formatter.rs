//! Record formatters
//!
//! A [`Formatter`] is compiled once from a template and renders every record
//! that passes through a handler. Three placeholder styles are understood:
//!
//! - `%`: `%(asctime)s - %(levelname)-8s - %(message)s`
//! - `{`: `{asctime} - {levelname:<8} - {message}`
//! - `$`: `$asctime - ${levelname} - $message`
//!
//! Unknown fields, malformed placeholders, and numeric conversions applied to
//! text fields are rejected at compile time so a loaded configuration can
//! never fail while rendering.

use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Template used when a formatter does not specify one
pub const DEFAULT_FORMAT: &str = "%(message)s";

/// Placeholder syntax of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatStyle {
    #[default]
    Percent,
    Brace,
    Dollar,
}

impl FromStr for FormatStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "%" => Ok(FormatStyle::Percent),
            "{" => Ok(FormatStyle::Brace),
            "$" => Ok(FormatStyle::Dollar),
            _ => Err(format!("style must be one of '%', '{{', '$', found '{}'", s)),
        }
    }
}

/// Record attribute addressable from a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Name,
    LevelName,
    LevelNo,
    Message,
    Asctime,
    Created,
    Msecs,
    Thread,
    ThreadName,
    Process,
    Filename,
    Pathname,
    Module,
    Lineno,
}

impl RecordField {
    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key {
            "name" => RecordField::Name,
            "levelname" => RecordField::LevelName,
            "levelno" => RecordField::LevelNo,
            "message" => RecordField::Message,
            "asctime" => RecordField::Asctime,
            "created" => RecordField::Created,
            "msecs" => RecordField::Msecs,
            "thread" => RecordField::Thread,
            "threadName" => RecordField::ThreadName,
            "process" => RecordField::Process,
            "filename" => RecordField::Filename,
            "pathname" => RecordField::Pathname,
            "module" => RecordField::Module,
            "lineno" => RecordField::Lineno,
            _ => return None,
        };
        Some(field)
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            RecordField::LevelNo
                | RecordField::Created
                | RecordField::Msecs
                | RecordField::Process
                | RecordField::Lineno
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Repr,
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSpec {
    fill: char,
    align: Option<Align>,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            zero: false,
            width: 0,
            precision: None,
            conversion: Conversion::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(RecordField, FieldSpec),
}

enum Value<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    Float(f64),
}

/// Compiled record template
///
/// # Examples
///
/// ```
/// use rust_log_config::core::{Formatter, FormatStyle, LogEntry, LogLevel};
/// use chrono::Utc;
///
/// let formatter = Formatter::new("%(levelname)-8s| %(name)s: %(message)s", FormatStyle::Percent, None)
///     .unwrap();
/// let entry = LogEntry::new("solar", LogLevel::Info, "charging at 16A", Utc::now());
/// assert_eq!(formatter.format(&entry), "INFO    | solar: charging at 16A");
/// ```
#[derive(Debug, Clone)]
pub struct Formatter {
    template: String,
    style: FormatStyle,
    datefmt: Option<String>,
    segments: Vec<Segment>,
    timestamp_format: TimestampFormat,
}

impl Formatter {
    /// Compile `template` in the given style, with an optional strftime `datefmt`
    pub fn new(template: &str, style: FormatStyle, datefmt: Option<&str>) -> Result<Self, String> {
        let segments = match style {
            FormatStyle::Percent => parse_percent(template)?,
            FormatStyle::Brace => parse_brace(template)?,
            FormatStyle::Dollar => parse_dollar(template)?,
        };
        let timestamp_format = match datefmt {
            Some(pattern) => TimestampFormat::custom(pattern)?,
            None => TimestampFormat::Default,
        };

        Ok(Self {
            template: template.to_string(),
            style,
            datefmt: datefmt.map(String::from),
            segments,
            timestamp_format,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn style(&self) -> FormatStyle {
        self.style
    }

    pub fn datefmt(&self) -> Option<&str> {
        self.datefmt.as_deref()
    }

    /// Render a record without a trailing line terminator
    pub fn format(&self, entry: &LogEntry) -> String {
        let mut out = String::with_capacity(self.template.len() + entry.message.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field, spec) => {
                    let value = self.value_of(*field, entry);
                    out.push_str(&render(value, spec));
                }
            }
        }
        out
    }

    fn value_of<'a>(&self, field: RecordField, entry: &'a LogEntry) -> Value<'a> {
        let location = entry.location.as_ref();
        match field {
            RecordField::Name => Value::Text(Cow::Borrowed(&entry.logger)),
            RecordField::LevelName => Value::Text(Cow::Borrowed(entry.level.to_str())),
            RecordField::LevelNo => Value::Int(i64::from(entry.level.as_u8())),
            RecordField::Message => Value::Text(Cow::Borrowed(&entry.message)),
            RecordField::Asctime => {
                Value::Text(Cow::Owned(self.timestamp_format.format(&entry.timestamp)))
            }
            RecordField::Created => Value::Float(
                entry.timestamp.timestamp() as f64
                    + f64::from(entry.timestamp.timestamp_subsec_micros()) / 1_000_000.0,
            ),
            RecordField::Msecs => {
                Value::Float(f64::from(entry.timestamp.timestamp_subsec_micros()) / 1_000.0)
            }
            RecordField::Thread => Value::Text(Cow::Borrowed(&entry.thread_id)),
            RecordField::ThreadName => Value::Text(Cow::Borrowed(entry.thread_label())),
            RecordField::Process => Value::Int(i64::from(entry.process_id)),
            RecordField::Filename => Value::Text(match location {
                Some(loc) => Cow::Borrowed(
                    std::path::Path::new(&loc.file)
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(&loc.file),
                ),
                None => Cow::Borrowed("(unknown file)"),
            }),
            RecordField::Pathname => Value::Text(match location {
                Some(loc) => Cow::Borrowed(&loc.file),
                None => Cow::Borrowed("(unknown file)"),
            }),
            RecordField::Module => Value::Text(match location {
                Some(loc) => Cow::Borrowed(&loc.module_path),
                None => Cow::Borrowed("(unknown module)"),
            }),
            RecordField::Lineno => Value::Int(location.map_or(0, |loc| i64::from(loc.line))),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            template: DEFAULT_FORMAT.to_string(),
            style: FormatStyle::Percent,
            datefmt: None,
            segments: vec![Segment::Field(RecordField::Message, FieldSpec::default())],
            timestamp_format: TimestampFormat::Default,
        }
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn render(value: Value<'_>, spec: &FieldSpec) -> String {
    let (body, numeric) = match (spec.conversion, value) {
        (Conversion::Int, Value::Int(n)) => (n.to_string(), true),
        (Conversion::Int, Value::Float(x)) => ((x.trunc() as i64).to_string(), true),
        (Conversion::Float, Value::Int(n)) => (
            format!("{:.*}", spec.precision.unwrap_or(6), n as f64),
            true,
        ),
        (Conversion::Float, Value::Float(x)) => {
            (format!("{:.*}", spec.precision.unwrap_or(6), x), true)
        }
        (conversion, value) => {
            let numeric = !matches!(value, Value::Text(_));
            let text = match value {
                Value::Text(text) => text.into_owned(),
                Value::Int(n) => n.to_string(),
                Value::Float(x) => x.to_string(),
            };
            let text = match spec.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text,
            };
            if conversion == Conversion::Repr {
                (format!("'{}'", text), false)
            } else {
                (text, numeric)
            }
        }
    };
    pad(body, spec, numeric)
}

fn pad(body: String, spec: &FieldSpec, numeric: bool) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body;
    }
    let missing = spec.width - len;

    if spec.zero && numeric && spec.align != Some(Align::Left) {
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", body.as_str()),
        };
        return format!("{}{}{}", sign, "0".repeat(missing), digits);
    }

    let fill = |n: usize| spec.fill.to_string().repeat(n);
    let align = spec
        .align
        .unwrap_or(if numeric { Align::Right } else { Align::Left });
    match align {
        Align::Left => format!("{}{}", body, fill(missing)),
        Align::Right => format!("{}{}", fill(missing), body),
        Align::Center => {
            let left = missing / 2;
            format!("{}{}{}", fill(left), body, fill(missing - left))
        }
    }
}

fn resolve_field(key: &str, spec: &FieldSpec) -> Result<RecordField, String> {
    let field =
        RecordField::from_key(key).ok_or_else(|| format!("unknown record field '{}'", key))?;
    if matches!(spec.conversion, Conversion::Int | Conversion::Float) && !field.is_numeric() {
        return Err(format!("field '{}' is text and cannot use a numeric conversion", key));
    }
    Ok(field)
}

fn push_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn take_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

fn parse_percent(template: &str) -> Result<Vec<Segment>, String> {
    let chars: Vec<char> = template.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('%') => {
                literal.push('%');
                i += 2;
                continue;
            }
            Some('(') => {}
            _ => return Err(format!("expected '%(field)' at position {}", i)),
        }

        let key_start = i + 2;
        let key_end = chars[key_start..]
            .iter()
            .position(|c| *c == ')')
            .map(|offset| key_start + offset)
            .ok_or_else(|| format!("unterminated '%(' at position {}", i))?;
        let key: String = chars[key_start..key_end].iter().collect();
        i = key_end + 1;

        let mut spec = FieldSpec::default();
        let mut left = false;
        while let Some(flag) = chars.get(i) {
            match flag {
                '-' => left = true,
                '0' => spec.zero = true,
                ' ' | '+' | '#' => {}
                _ => break,
            }
            i += 1;
        }
        spec.width = take_number(&chars, &mut i).unwrap_or(0);
        if chars.get(i) == Some(&'.') {
            i += 1;
            spec.precision = Some(take_number(&chars, &mut i).unwrap_or(0));
        }
        spec.conversion = match chars.get(i) {
            Some('s') => Conversion::Str,
            Some('r') => Conversion::Repr,
            Some('d') | Some('i') => Conversion::Int,
            Some('f') => Conversion::Float,
            Some(other) => {
                return Err(format!("unsupported conversion '{}' for field '{}'", other, key))
            }
            None => return Err(format!("missing conversion for field '{}'", key)),
        };
        i += 1;
        spec.align = Some(if left { Align::Left } else { Align::Right });
        if left {
            spec.zero = false;
        }

        let field = resolve_field(&key, &spec)?;
        push_literal(&mut segments, &mut literal);
        segments.push(Segment::Field(field, spec));
    }

    push_literal(&mut segments, &mut literal);
    Ok(segments)
}

fn parse_brace(template: &str) -> Result<Vec<Segment>, String> {
    let chars: Vec<char> = template.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '}' => return Err(format!("single '}}' at position {}", i)),
            '{' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| format!("unterminated '{{' at position {}", i))?;
                let inner: String = chars[i + 1..end].iter().collect();
                let (head, spec_text) = match inner.split_once(':') {
                    Some((head, spec)) => (head, Some(spec)),
                    None => (inner.as_str(), None),
                };
                let (key, repr) = match head.split_once('!') {
                    Some((key, "r")) => (key, true),
                    Some((key, "s")) => (key, false),
                    Some((_, other)) => return Err(format!("unsupported conversion '!{}'", other)),
                    None => (head, false),
                };
                let mut spec = match spec_text {
                    Some(text) => parse_brace_spec(text)?,
                    None => FieldSpec::default(),
                };
                if repr {
                    spec.conversion = Conversion::Repr;
                }
                let field = resolve_field(key, &spec)?;
                push_literal(&mut segments, &mut literal);
                segments.push(Segment::Field(field, spec));
                i = end + 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    push_literal(&mut segments, &mut literal);
    Ok(segments)
}

fn parse_brace_spec(text: &str) -> Result<FieldSpec, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut spec = FieldSpec::default();
    let mut i = 0;
    let align_of = |c: char| match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    };

    if let Some(align) = chars.get(1).and_then(|c| align_of(*c)) {
        spec.fill = chars[0];
        spec.align = Some(align);
        i = 2;
    } else if let Some(align) = chars.first().and_then(|c| align_of(*c)) {
        spec.align = Some(align);
        i = 1;
    }
    if matches!(chars.get(i), Some('+') | Some('-') | Some(' ')) {
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        spec.zero = spec.align.is_none();
        i += 1;
    }
    spec.width = take_number(&chars, &mut i).unwrap_or(0);
    if chars.get(i) == Some(&'.') {
        i += 1;
        spec.precision = Some(
            take_number(&chars, &mut i).ok_or_else(|| format!("missing precision in '{}'", text))?,
        );
    }
    spec.conversion = match chars.get(i) {
        None => Conversion::Str,
        Some('s') => Conversion::Str,
        Some('d') => Conversion::Int,
        Some('f') => Conversion::Float,
        Some(other) => return Err(format!("unsupported format type '{}' in '{}'", other, text)),
    };
    if chars.get(i).is_some() {
        i += 1;
    }
    if i != chars.len() {
        return Err(format!("invalid format spec '{}'", text));
    }
    Ok(spec)
}

fn parse_dollar(template: &str) -> Result<Vec<Segment>, String> {
    let chars: Vec<char> = template.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '$' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        let key = match chars.get(i + 1) {
            Some('$') => {
                literal.push('$');
                i += 2;
                continue;
            }
            Some('{') => {
                let end = chars[i + 2..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| i + 2 + offset)
                    .ok_or_else(|| format!("unterminated '${{' at position {}", i))?;
                let key: String = chars[i + 2..end].iter().collect();
                i = end + 1;
                key
            }
            Some(c) if c.is_ascii_alphabetic() || *c == '_' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                i = end;
                chars[start..end].iter().collect()
            }
            _ => return Err(format!("invalid placeholder at position {}", i)),
        };

        let spec = FieldSpec::default();
        let field = resolve_field(&key, &spec)?;
        push_literal(&mut segments, &mut literal);
        segments.push(Segment::Field(field, spec));
    }

    push_literal(&mut segments, &mut literal);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::{TimeZone, Utc};

    fn entry() -> LogEntry {
        let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap()
            + chrono::Duration::microseconds(7_250);
        LogEntry::new("solar.home", LogLevel::Warning, "battery low", at)
            .with_location("src/home/charger.rs", 88, "solar::home")
    }

    #[test]
    fn test_percent_style_fields() {
        let f = Formatter::new(
            "%(name)s|%(levelname)s|%(levelno)d|%(message)s",
            FormatStyle::Percent,
            None,
        )
        .unwrap();
        assert_eq!(f.format(&entry()), "solar.home|WARNING|30|battery low");
    }

    #[test]
    fn test_percent_width_and_alignment() {
        let f = Formatter::new("[%(levelname)-8s][%(lineno)5d]", FormatStyle::Percent, None).unwrap();
        assert_eq!(f.format(&entry()), "[WARNING ][   88]");
    }

    #[test]
    fn test_percent_literal_and_msecs() {
        let f = Formatter::new("100%% %(msecs)03d", FormatStyle::Percent, None).unwrap();
        assert_eq!(f.format(&entry()), "100% 007");
    }

    #[test]
    fn test_location_fields() {
        let f = Formatter::new("%(filename)s:%(lineno)d %(module)s", FormatStyle::Percent, None)
            .unwrap();
        assert_eq!(f.format(&entry()), "charger.rs:88 solar::home");

        let bare = LogEntry::new("x", LogLevel::Info, "m", Utc::now());
        assert_eq!(f.format(&bare), "(unknown file):0 (unknown module)");
    }

    #[test]
    fn test_datefmt_applies_to_asctime() {
        let f = Formatter::new("%(asctime)s", FormatStyle::Percent, Some("%Y")).unwrap();
        let e = entry();
        let expected = e.timestamp.with_timezone(&chrono::Local).format("%Y").to_string();
        assert_eq!(f.format(&e), expected);
    }

    #[test]
    fn test_brace_style() {
        let f = Formatter::new("{{{levelname:*^9}}} {message!r} {created:.1f}", FormatStyle::Brace, None)
            .unwrap();
        assert_eq!(f.format(&entry()), "{*WARNING*} 'battery low' 1736332245.0");
    }

    #[test]
    fn test_dollar_style() {
        let f = Formatter::new("$$ ${levelname}: $message", FormatStyle::Dollar, None).unwrap();
        assert_eq!(f.format(&entry()), "$ WARNING: battery low");
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = Formatter::new("%(user)s", FormatStyle::Percent, None).unwrap_err();
        assert!(err.contains("unknown record field 'user'"));
    }

    #[test]
    fn test_rejects_numeric_conversion_on_text() {
        assert!(Formatter::new("%(message)d", FormatStyle::Percent, None).is_err());
        assert!(Formatter::new("{name:d}", FormatStyle::Brace, None).is_err());
    }

    #[test]
    fn test_rejects_malformed_templates() {
        assert!(Formatter::new("%(message", FormatStyle::Percent, None).is_err());
        assert!(Formatter::new("%s", FormatStyle::Percent, None).is_err());
        assert!(Formatter::new("{message", FormatStyle::Brace, None).is_err());
        assert!(Formatter::new("message}", FormatStyle::Brace, None).is_err());
        assert!(Formatter::new("$1", FormatStyle::Dollar, None).is_err());
    }

    #[test]
    fn test_default_formatter_is_message_only() {
        assert_eq!(Formatter::default().format(&entry()), "battery low");
        assert_eq!(Formatter::default().template(), DEFAULT_FORMAT);
    }
}
