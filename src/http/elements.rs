//! Header value decomposition into elements and parameters.
//!
//! A header value such as `text/html;level=1, text/plain;q=0.5` splits into
//! comma-separated elements, each a `name[=value]` pair followed by
//! semicolon-separated `name[=value]` parameters.

use std::iter::Peekable;
use std::str::Chars;

/// A `name[=value]` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameValuePair {
    pub name: String,
    pub value: Option<String>,
}

impl NameValuePair {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// One comma-separated element of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderElement {
    pub name: String,
    pub value: Option<String>,
    pub parameters: Vec<NameValuePair>,
}

const ELEMENT_DELIMITER: char = ',';
const PARAM_DELIMITER: char = ';';

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            chars: raw.chars().peekable(),
        }
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    /// Parse one pair, consuming its terminating delimiter if any.
    fn pair(&mut self) -> (NameValuePair, Option<char>) {
        let mut name = String::new();
        let mut has_value = false;
        let mut terminator = None;

        while let Some(c) = self.chars.next() {
            match c {
                '=' => {
                    has_value = true;
                    break;
                }
                ELEMENT_DELIMITER | PARAM_DELIMITER => {
                    terminator = Some(c);
                    break;
                }
                _ => name.push(c),
            }
        }
        let name = name.trim().to_string();

        if !has_value {
            return (NameValuePair { name, value: None }, terminator);
        }

        let (value, terminator) = self.value();
        (
            NameValuePair {
                name,
                value: Some(value),
            },
            terminator,
        )
    }

    /// Read a value up to the next delimiter. Quoted sections are unquoted,
    /// delimiters inside them are literal, surrounding whitespace is dropped
    /// and each run of whitespace between unquoted tokens becomes one space.
    fn value(&mut self) -> (String, Option<char>) {
        let mut value = String::new();
        let mut pending_space = false;
        let mut terminator = None;

        while let Some(c) = self.chars.next() {
            match c {
                ELEMENT_DELIMITER | PARAM_DELIMITER => {
                    terminator = Some(c);
                    break;
                }
                c if c.is_whitespace() => pending_space = true,
                c => {
                    if pending_space && !value.is_empty() {
                        value.push(' ');
                    }
                    pending_space = false;
                    if c == '"' {
                        self.quoted(&mut value);
                    } else {
                        value.push(c);
                    }
                }
            }
        }

        (value, terminator)
    }

    fn quoted(&mut self, out: &mut String) {
        while let Some(c) = self.chars.next() {
            match c {
                '"' => return,
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        out.push(escaped);
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn element(&mut self) -> HeaderElement {
        let (head, mut terminator) = self.pair();
        let mut parameters = Vec::new();

        while terminator == Some(PARAM_DELIMITER) && !self.at_end() {
            let (param, next) = self.pair();
            parameters.push(param);
            terminator = next;
        }

        HeaderElement {
            name: head.name,
            value: head.value,
            parameters,
        }
    }
}

/// Split a raw header value into its elements.
///
/// Elements with neither a name nor a value (e.g. from `a,,b`) are skipped.
pub fn parse_elements(raw: &str) -> Vec<HeaderElement> {
    let mut cursor = Cursor::new(raw);
    let mut elements = Vec::new();

    while !cursor.at_end() {
        let element = cursor.element();
        if !(element.name.is_empty() && element.value.is_none()) {
            elements.push(element);
        }
    }

    elements
}

/// Render elements in the request-trace layout.
///
/// The first element contributes only its name. Every later element writes
/// its own `=value` and `;name[=value]` parameters, then a comma, then its
/// name. Existing trace consumers depend on this exact ordering.
pub fn render_elements(elements: &[HeaderElement]) -> String {
    let mut out = String::new();

    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            if let Some(value) = &element.value {
                out.push('=');
                out.push_str(value);
            }
            for param in &element.parameters {
                out.push(';');
                out.push_str(&param.name);
                if let Some(value) = &param.value {
                    out.push('=');
                    out.push_str(value);
                }
            }
            out.push(',');
        }
        out.push_str(&element.name);
    }

    out
}
