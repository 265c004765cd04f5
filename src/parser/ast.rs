//! Syntax tree for schema files
//!
//! Only the parts of the schema language the pipeline inspects are modelled in
//! detail (object types, their directives and fields). Other definitions keep
//! their name and span so they can still be sliced out of the source.

use std::fmt;

/// Byte range of a node within its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Slice this span out of the text it was parsed from
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A parsed schema file
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Iterate object type definitions in declaration order
    pub fn object_types(&self) -> impl Iterator<Item = &ObjectType> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Object(object) => Some(object),
            _ => None,
        })
    }

    /// Find an object type by name
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.object_types().find(|o| o.name == name)
    }
}

/// Top-level definition kinds
#[derive(Debug, Clone)]
pub enum Definition {
    Object(ObjectType),
    Interface(ObjectType),
    Input(NamedDefinition),
    Enum(NamedDefinition),
    Scalar(NamedDefinition),
    Union(NamedDefinition),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Object(o) | Definition::Interface(o) => &o.name,
            Definition::Input(d)
            | Definition::Enum(d)
            | Definition::Scalar(d)
            | Definition::Union(d) => &d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Definition::Object(o) | Definition::Interface(o) => o.span,
            Definition::Input(d)
            | Definition::Enum(d)
            | Definition::Scalar(d)
            | Definition::Union(d) => d.span,
        }
    }
}

/// A definition the pipeline does not look inside
#[derive(Debug, Clone)]
pub struct NamedDefinition {
    pub name: String,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// An object (or interface) type definition
#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub implements: Vec<String>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

impl ObjectType {
    /// Names of attached directives, in source order
    pub fn directive_names(&self) -> Vec<&str> {
        self.directives.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }
}

/// A field of an object type
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub directives: Vec<Directive>,
    pub span: Span,
}

impl FieldDefinition {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }
}

/// A directive application, e.g. `@createModel(description: "...")`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
}

impl Directive {
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }

    /// String-valued argument, if present and a string
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        match self.argument(name) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// A type reference such as `String`, `[Post]` or `StreamID!`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// The innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::Named(_) => false,
            TypeRef::List(_) => true,
            TypeRef::NonNull(inner) => inner.is_list(),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// Constant values appearing in directive arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(String),
    Float(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}
