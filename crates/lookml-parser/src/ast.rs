use lookml_core::{FieldKind, LookmlError, Result};

/// A parsed LookML value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Bare word, number, or yes/no.
    Scalar(String),
    /// Double-quoted string, unescaped; may contain newlines.
    Quoted(String),
    /// Raw `sql_*`/`html` value, text up to the `;;` terminator, trimmed.
    Sql(String),
    /// Bracketed list of scalars.
    List(Vec<String>),
}

impl Value {
    /// Textual content for scalar-like values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) | Value::Quoted(s) | Value::Sql(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

/// A named or anonymous brace-delimited record, e.g. `dimension: city { ... }`
/// or `derived_table: { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: String,
    pub name: Option<String>,
    pub pairs: Vec<(String, Value)>,
    pub blocks: Vec<Block>,
}

impl Block {
    pub fn pair(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }
}

/// One parsed LookML file: top-level pairs (`connection`, `include`, ...) and
/// blocks (`view`, `explore`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookmlFile {
    pub pairs: Vec<(String, Value)>,
    pub blocks: Vec<Block>,
}

impl LookmlFile {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.blocks.is_empty()
    }

    pub fn views(&self) -> Vec<View<'_>> {
        self.blocks
            .iter()
            .filter(|b| b.kind == "view")
            .map(|block| View {
                name: block.name.as_deref().unwrap_or(""),
                block,
            })
            .collect()
    }

    /// Top-level explores, as found in model files.
    pub fn explores(&self) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.kind == "explore").collect()
    }

    /// Enforce the one-view-per-file coding standard.
    pub fn single_view(&self) -> Result<View<'_>> {
        let views = self.views();
        match views.as_slice() {
            [view] => Ok(*view),
            other => Err(LookmlError::Format(format!(
                "expected exactly 1 view per file, found {}",
                other.len()
            ))),
        }
    }
}

/// Borrowed projection of a `view` block.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub name: &'a str,
    pub block: &'a Block,
}

impl<'a> View<'a> {
    pub fn property(&self, key: &str) -> Option<&'a Value> {
        self.block.pair(key)
    }

    pub fn fields(&self, kind: FieldKind) -> impl Iterator<Item = Field<'a>> {
        self.block
            .blocks
            .iter()
            .filter(move |b| b.kind == kind.as_str())
            .map(move |block| Field {
                kind,
                name: block.name.as_deref().unwrap_or(""),
                block,
            })
    }

    pub fn all_fields(&self) -> Vec<Field<'a>> {
        FieldKind::ALL
            .into_iter()
            .flat_map(|kind| self.fields(kind))
            .collect()
    }

    pub fn field(&self, kind: FieldKind, name: &str) -> Option<Field<'a>> {
        self.fields(kind).find(|f| f.name == name)
    }
}

/// Borrowed projection of a dimension, dimension_group, or measure block.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub kind: FieldKind,
    pub name: &'a str,
    pub block: &'a Block,
}

impl<'a> Field<'a> {
    pub fn property(&self, key: &str) -> Option<&'a Value> {
        self.block.pair(key)
    }

    pub fn description(&self) -> Option<&'a str> {
        self.property("description").and_then(Value::as_text)
    }
}
