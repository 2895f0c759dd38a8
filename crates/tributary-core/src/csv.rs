//! `source,target,value` CSV input.
//!
//! One record per line; fields may be double-quoted (with `""` as an escaped quote) to carry
//! commas. Lines starting with `%%` are comments. An optional leading `sankey` /
//! `sankey-beta` header line is skipped so Mermaid-style sankey sources load unchanged, as is a
//! `source,target,value` column header.

use crate::{Error, FlowData, FlowLink, FlowNode, Result};
use rustc_hash::FxHashMap;

pub fn parse_flow_csv(text: &str) -> Result<FlowData> {
    let prepared = prepare_text(text);
    let mut body = prepared.as_str();
    let mut first_line = 1usize;
    let (header, rest) = body.split_once('\n').unwrap_or((body, ""));
    if is_sankey_header(header) {
        body = rest;
        first_line = 2;
    }

    let mut records = parse_csv_records(body, first_line)?;
    if records.first().is_some_and(is_column_header) {
        records.remove(0);
    }

    let mut data = FlowData::default();
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut node_for = |data: &mut FlowData, id: String| {
        if !seen.contains_key(&id) {
            seen.insert(id.clone(), data.nodes.len());
            data.nodes.push(FlowNode::new(id));
        }
    };

    for record in records {
        let source = normalize_field_value(&record.source);
        let target = normalize_field_value(&record.target);
        let value = parse_value(&record.value).ok_or_else(|| Error::Csv {
            line: record.line,
            message: format!("invalid value {:?}", record.value.trim()),
        })?;

        node_for(&mut data, source.clone());
        node_for(&mut data, target.clone());
        data.links.push(FlowLink::new(source, target, value));
    }

    Ok(data)
}

fn is_sankey_header(header: &str) -> bool {
    let h = header.trim().to_ascii_lowercase();
    h == "sankey" || h == "sankey-beta"
}

fn is_column_header(record: &CsvRecord) -> bool {
    record.source.trim().eq_ignore_ascii_case("source")
        && record.target.trim().eq_ignore_ascii_case("target")
        && record.value.trim().eq_ignore_ascii_case("value")
}

fn normalize_field_value(s: &str) -> String {
    s.trim().to_string()
}

fn parse_value(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Drops comment lines and trailing whitespace, keeping line numbering intact.
fn prepare_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim_start().starts_with("%%") {
                ""
            } else {
                line.trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug)]
struct CsvRecord {
    line: usize,
    source: String,
    target: String,
    value: String,
}

fn parse_csv_records(input: &str, first_line: usize) -> Result<Vec<CsvRecord>> {
    let mut p = CsvParser::new(input, first_line);
    let mut records = Vec::new();
    p.consume_newlines();
    while !p.eof() {
        let line = p.line;
        let source = p.parse_field()?;
        p.consume_char(',')?;
        let target = p.parse_field()?;
        p.consume_char(',')?;
        let value = p.parse_field()?;

        if p.try_consume_newline() {
            p.consume_newlines();
        } else if !p.eof() {
            return Err(p.error("expected end of record"));
        }

        records.push(CsvRecord {
            line,
            source,
            target,
            value,
        });
    }
    Ok(records)
}

struct CsvParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> CsvParser<'a> {
    fn new(input: &'a str, first_line: usize) -> Self {
        Self {
            input,
            pos: 0,
            line: first_line,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::Csv {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume_char(&mut self, ch: char) -> Result<()> {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{ch}'")))
        }
    }

    fn consume_newlines(&mut self) {
        while self.try_consume_newline() {}
    }

    fn try_consume_newline(&mut self) -> bool {
        match self.peek_char() {
            Some('\n') => {
                self.pos += 1;
                self.line += 1;
                true
            }
            Some('\r') => {
                self.pos += 1;
                if self.peek_char() == Some('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        // Leading blanks before an opening quote are insignificant.
        let skipped = self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
        if self.rest()[skipped..].starts_with('"') {
            self.pos += skipped;
        }
        match self.peek_char() {
            Some('"') => self.parse_quoted_field(),
            Some('\n' | '\r') | None => Ok(String::new()),
            _ => Ok(self.parse_unquoted_field()),
        }
    }

    fn parse_unquoted_field(&mut self) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ',' || ch == '\n' || ch == '\r' {
                break;
            }
            out.push(ch);
            self.pos += ch.len_utf8();
        }
        out
    }

    fn parse_quoted_field(&mut self) -> Result<String> {
        self.consume_char('"')?;
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
            match ch {
                '"' if self.peek_char() == Some('"') => {
                    self.pos += 1;
                    out.push('"');
                }
                '"' => {
                    // Blanks between the closing quote and the delimiter are dropped.
                    let skipped =
                        self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
                    self.pos += skipped;
                    return Ok(out);
                }
                '\n' => {
                    self.line += 1;
                    out.push(ch);
                }
                _ => out.push(ch),
            }
        }
        Err(self.error("unterminated quoted field"))
    }
}
