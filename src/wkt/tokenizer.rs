//! WKT tokenizer: turns the input text into a tree of keyword nodes.
//!
//! Both `[` and `(` bracket styles are accepted. Quoted strings may
//! escape an embedded quote by doubling it. Numeric literals use the C
//! locale (decimal point). Whitespace outside quotes is insignificant.

use crate::error::{GeorefError, Result};

/// A child of a WKT node: a nested node, a quoted string, a number, or
/// a bare enumeration keyword (e.g. `NORTH`, `ellipsoidal`).
#[derive(Clone, Debug, PartialEq)]
pub enum WktValue {
    Node(WktNode),
    Text(String),
    Number(f64),
    Keyword(String),
}

impl WktValue {
    pub fn as_node(&self) -> Option<&WktNode> {
        match self {
            WktValue::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            WktValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            WktValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            WktValue::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Code-like children appear both quoted (`"4326"`) and bare
    /// (`4326`); normalize either to a string.
    pub fn as_code(&self) -> Option<String> {
        match self {
            WktValue::Text(t) => Some(t.clone()),
            WktValue::Number(n) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{n}"))
                }
            }
            _ => None,
        }
    }
}

/// A `KEYWORD[child, child, ...]` production.
#[derive(Clone, Debug, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub children: Vec<WktValue>,
    /// Byte offset of the keyword in the source text, for error
    /// reporting.
    pub offset: usize,
}

impl WktNode {
    pub fn new(keyword: impl Into<String>) -> WktNode {
        WktNode {
            keyword: keyword.into(),
            children: Vec::new(),
            offset: 0,
        }
    }

    pub fn keyword_is(&self, name: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(name)
    }

    /// First child node with one of the given keywords.
    pub fn child_node<'a>(&'a self, names: &[&str]) -> Option<&'a WktNode> {
        self.children.iter().find_map(|c| {
            let n = c.as_node()?;
            names
                .iter()
                .any(|name| n.keyword_is(name))
                .then_some(n)
        })
    }

    /// All child nodes with one of the given keywords, in order.
    pub fn child_nodes<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a WktNode> {
        self.children.iter().filter_map(move |c| {
            let n = c.as_node()?;
            names
                .iter()
                .any(|name| n.keyword_is(name))
                .then_some(n)
        })
    }

    pub fn text_child(&self, index: usize) -> Option<&str> {
        self.children.get(index)?.as_text()
    }

    pub fn number_child(&self, index: usize) -> Option<f64> {
        self.children.get(index)?.as_number()
    }
}

/// Tokenize a WKT string into its node tree.
pub fn tokenize(input: &str) -> Result<WktNode> {
    let mut lexer = Lexer {
        input: input.as_bytes(),
        pos: 0,
    };
    lexer.skip_whitespace();
    let node = lexer.parse_node()?;
    lexer.skip_whitespace();
    if lexer.pos != lexer.input.len() {
        return Err(GeorefError::parse(
            "unexpected trailing content after WKT node",
            lexer.pos,
        ));
    }
    Ok(node)
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn parse_node(&mut self) -> Result<WktNode> {
        let start = self.pos;
        let keyword = self.parse_bare_word()?;
        if keyword.is_empty() {
            return Err(GeorefError::parse("expected a WKT keyword", start));
        }
        self.skip_whitespace();
        let open = self.peek();
        if open != Some(b'[') && open != Some(b'(') {
            return Err(GeorefError::parse(
                format!("expected '[' after keyword {keyword:?}"),
                self.pos,
            ));
        }
        let close = if open == Some(b'[') { b']' } else { b')' };
        self.pos += 1;

        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(GeorefError::parse(
                        format!("unterminated {keyword:?} node"),
                        start,
                    ))
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                // Tolerate the mismatched bracket style on close
                Some(b']') | Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                }
                _ => {
                    children.push(self.parse_value()?);
                }
            }
        }
        Ok(WktNode {
            keyword,
            children,
            offset: start,
        })
    }

    fn parse_value(&mut self) -> Result<WktValue> {
        match self.peek() {
            Some(b'"') => Ok(WktValue::Text(self.parse_quoted()?)),
            Some(c) if c == b'-' || c == b'+' || c == b'.' || c.is_ascii_digit() => {
                Ok(WktValue::Number(self.parse_number()?))
            }
            _ => {
                let start = self.pos;
                let word = self.parse_bare_word()?;
                if word.is_empty() {
                    return Err(GeorefError::parse("expected a WKT value", start));
                }
                self.skip_whitespace();
                if matches!(self.peek(), Some(b'[') | Some(b'(')) {
                    self.pos = start;
                    Ok(WktValue::Node(self.parse_node()?))
                } else {
                    Ok(WktValue::Keyword(word))
                }
            }
        }
    }

    fn parse_bare_word(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(GeorefError::parse("unterminated quoted string", start)),
                Some(b'"') => {
                    // A doubled quote is an escaped quote
                    if self.input.get(self.pos + 1) == Some(&b'"') {
                        bytes.push(b'"');
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(String::from_utf8_lossy(&bytes).into_owned());
                    }
                }
                Some(c) => {
                    bytes.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<f64> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit()
                || c == b'.'
                || c == b'-'
                || c == b'+'
                || c == b'e'
                || c == b'E'
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| GeorefError::parse("invalid number", start))?;
        text.parse::<f64>()
            .map_err(|_| GeorefError::parse(format!("invalid number {text:?}"), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_node() {
        let node = tokenize("UNIT[\"degree\",0.0174532925199433]").unwrap();
        assert!(node.keyword_is("UNIT"));
        assert_eq!(node.text_child(0), Some("degree"));
        assert_eq!(node.number_child(1), Some(0.0174532925199433));
    }

    #[test]
    fn test_nested_and_bare_keywords() {
        let node =
            tokenize("AXIS[\"Latitude\",NORTH,ORDER[1]]").unwrap();
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[1].as_keyword(), Some("NORTH"));
        let order = node.child_node(&["ORDER"]).unwrap();
        assert_eq!(order.number_child(0), Some(1.0));
    }

    #[test]
    fn test_parentheses_accepted() {
        let node = tokenize("GEOGCS(\"WGS 84\",DATUM(\"WGS_1984\"))").unwrap();
        assert!(node.keyword_is("GEOGCS"));
        assert!(node.child_node(&["DATUM"]).is_some());
    }

    #[test]
    fn test_escaped_quote() {
        let node = tokenize("UNIT[\"say \"\"hi\"\"\",1]").unwrap();
        assert_eq!(node.text_child(0), Some("say \"hi\""));
    }

    #[test]
    fn test_error_has_offset() {
        let err = tokenize("GEOGCS[\"WGS 84\"").unwrap_err();
        match err {
            GeorefError::Parse { offset, .. } => assert_eq!(offset, 0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert!(tokenize("UNIT[\"m\",1] trailing").is_err());
    }

    #[test]
    fn test_code_child_both_forms() {
        let quoted = tokenize("AUTHORITY[\"EPSG\",\"4326\"]").unwrap();
        assert_eq!(quoted.children[1].as_code().as_deref(), Some("4326"));
        let bare = tokenize("ID[\"EPSG\",4326]").unwrap();
        assert_eq!(bare.children[1].as_code().as_deref(), Some("4326"));
    }
}
