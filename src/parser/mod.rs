//! Schema Parser
//!
//! Parses schema-definition files into a [`Document`] using a PEST grammar
//! (`sdl.pest`). Every definition keeps its byte span so callers can slice the
//! exact source text back out (embeds are propagated verbatim).

pub mod ast;

use std::fmt;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

pub use ast::{
    Definition, Directive, Document, FieldDefinition, NamedDefinition, ObjectType, Span,
    TypeRef, Value,
};

/// PEST parser for the schema definition language
#[derive(Parser)]
#[grammar = "parser/sdl.pest"]
pub struct SdlParser;

/// A syntax error with its 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxError {}

impl From<pest::error::Error<Rule>> for SyntaxError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        Self {
            line,
            column,
            message: err.variant.message().into_owned(),
        }
    }
}

type ParseResult<T> = std::result::Result<T, SyntaxError>;

/// Parse a complete schema document
pub fn parse_document(source: &str) -> ParseResult<Document> {
    let mut pairs = SdlParser::parse(Rule::document, source)?;
    let document = pairs
        .next()
        .ok_or_else(|| internal("empty parse result"))?;

    let mut definitions = Vec::new();
    for pair in document.into_inner() {
        let definition = match pair.as_rule() {
            Rule::object_type => Definition::Object(build_object(pair)?),
            Rule::interface_type => Definition::Interface(build_object(pair)?),
            Rule::input_type => Definition::Input(build_named(pair)?),
            Rule::enum_type => Definition::Enum(build_named(pair)?),
            Rule::scalar_type => Definition::Scalar(build_named(pair)?),
            Rule::union_type => Definition::Union(build_named(pair)?),
            Rule::EOI => continue,
            other => return Err(internal(&format!("unexpected rule {:?}", other))),
        };
        definitions.push(definition);
    }

    Ok(Document { definitions })
}

fn internal(message: &str) -> SyntaxError {
    SyntaxError {
        line: 0,
        column: 0,
        message: message.to_string(),
    }
}

/// Span of a definition with trailing insignificant characters dropped
fn trimmed_span(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let text = span.as_str().trim_end_matches(|c: char| c.is_whitespace() || c == ',');
    Span::new(span.start(), span.start() + text.len())
}

fn build_object(pair: Pair<Rule>) -> ParseResult<ObjectType> {
    let span = trimmed_span(&pair);
    let mut object = ObjectType {
        name: String::new(),
        description: None,
        implements: Vec::new(),
        directives: Vec::new(),
        fields: Vec::new(),
        span,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::description => object.description = Some(build_description(inner)?),
            Rule::name => object.name = inner.as_str().to_string(),
            Rule::implements => {
                object.implements = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::named_type)
                    .map(|p| p.as_str().trim().to_string())
                    .collect();
            }
            Rule::directives => object.directives = build_directives(inner)?,
            Rule::fields => {
                for field in inner.into_inner() {
                    object.fields.push(build_field(field)?);
                }
            }
            _ => {}
        }
    }

    Ok(object)
}

fn build_named(pair: Pair<Rule>) -> ParseResult<NamedDefinition> {
    let span = trimmed_span(&pair);
    let mut name = String::new();
    let mut directives = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name if name.is_empty() => name = inner.as_str().to_string(),
            Rule::directives => directives = build_directives(inner)?,
            _ => {}
        }
    }
    Ok(NamedDefinition {
        name,
        directives,
        span,
    })
}

fn build_field(pair: Pair<Rule>) -> ParseResult<FieldDefinition> {
    let span = trimmed_span(&pair);
    let mut name = String::new();
    let mut ty = None;
    let mut directives = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = inner.as_str().to_string(),
            Rule::type_ref => ty = Some(build_type_ref(inner)?),
            Rule::directives => directives = build_directives(inner)?,
            _ => {}
        }
    }

    let ty = ty.ok_or_else(|| internal(&format!("field {} has no type", name)))?;
    Ok(FieldDefinition {
        name,
        ty,
        directives,
        span,
    })
}

fn build_type_ref(pair: Pair<Rule>) -> ParseResult<TypeRef> {
    let mut base = None;
    let mut non_null = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::named_type => base = Some(TypeRef::Named(inner.as_str().trim().to_string())),
            Rule::list_type => {
                let element = inner
                    .into_inner()
                    .next()
                    .ok_or_else(|| internal("list type without element"))?;
                base = Some(TypeRef::List(Box::new(build_type_ref(element)?)));
            }
            Rule::non_null => non_null = true,
            _ => {}
        }
    }
    let base = base.ok_or_else(|| internal("type reference without a type"))?;
    Ok(if non_null {
        TypeRef::NonNull(Box::new(base))
    } else {
        base
    })
}

fn build_directives(pair: Pair<Rule>) -> ParseResult<Vec<Directive>> {
    pair.into_inner().map(build_directive).collect()
}

fn build_directive(pair: Pair<Rule>) -> ParseResult<Directive> {
    let mut name = String::new();
    let mut arguments = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = inner.as_str().to_string(),
            Rule::arguments => {
                for argument in inner.into_inner() {
                    arguments.push(build_named_value(argument)?);
                }
            }
            _ => {}
        }
    }
    Ok(Directive { name, arguments })
}

/// `name: value` pairs used by both arguments and object fields
fn build_named_value(pair: Pair<Rule>) -> ParseResult<(String, Value)> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| internal("argument without a name"))?
        .as_str()
        .to_string();
    let value = inner
        .next()
        .ok_or_else(|| internal(&format!("argument {} without a value", name)))?;
    Ok((name, build_value(value)?))
}

fn build_value(pair: Pair<Rule>) -> ParseResult<Value> {
    let pair = match pair.as_rule() {
        Rule::value => pair
            .into_inner()
            .next()
            .ok_or_else(|| internal("empty value"))?,
        _ => pair,
    };

    Ok(match pair.as_rule() {
        Rule::string_value => Value::String(build_string(pair)?),
        Rule::int_value => Value::Int(pair.as_str().to_string()),
        Rule::float_value => Value::Float(pair.as_str().to_string()),
        Rule::boolean_value => Value::Boolean(pair.as_str() == "true"),
        Rule::null_value => Value::Null,
        Rule::enum_literal => Value::Enum(pair.as_str().to_string()),
        Rule::list_value => Value::List(
            pair.into_inner()
                .map(build_value)
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        Rule::object_value => Value::Object(
            pair.into_inner()
                .map(build_named_value)
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        other => return Err(internal(&format!("unexpected value rule {:?}", other))),
    })
}

fn build_description(pair: Pair<Rule>) -> ParseResult<String> {
    let string = pair
        .into_inner()
        .next()
        .ok_or_else(|| internal("empty description"))?;
    build_string(string)
}

fn build_string(pair: Pair<Rule>) -> ParseResult<String> {
    let literal = pair
        .into_inner()
        .next()
        .ok_or_else(|| internal("empty string literal"))?;
    let raw = literal.as_str();
    match literal.as_rule() {
        Rule::block_string => Ok(block_string_value(&raw[3..raw.len() - 3])),
        _ => unescape(&raw[1..raw.len() - 1]),
    }
}

fn block_string_value(raw: &str) -> String {
    raw.replace("\\\"\"\"", "\"\"\"").trim().to_string()
}

fn unescape(raw: &str) -> ParseResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| internal(&format!("invalid unicode escape \\u{}", hex)))?;
                out.push(code);
            }
            other => {
                return Err(internal(&format!("invalid escape sequence \\{:?}", other)));
            }
        }
    }
    Ok(out)
}
