use std::collections::{HashMap, HashSet};

/// How a column's cells are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

/// A canonical column and the historical spellings accepted for it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn required(canonical: &'static str, kind: ColumnKind) -> Self {
        Self {
            canonical,
            aliases: &[],
            kind,
            required: true,
        }
    }

    pub const fn optional(canonical: &'static str, kind: ColumnKind) -> Self {
        Self {
            canonical,
            aliases: &[],
            kind,
            required: false,
        }
    }

    pub const fn or(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    fn candidates(&self) -> impl Iterator<Item = &'static str> {
        let aliases: &'static [&'static str] = self.aliases;
        std::iter::once(self.canonical).chain(aliases.iter().copied())
    }
}

/// Canonical vocabulary of one source file.
#[derive(Debug, Clone, Copy)]
pub struct LayerSchema {
    pub layer: &'static str,
    pub columns: &'static [ColumnSpec],
    pub latitude: &'static str,
    pub longitude: &'static str,
}

/// Where a canonical column was found in the source header, if anywhere.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnBinding {
    pub(crate) spec: &'static ColumnSpec,
    pub(crate) index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MissingColumn {
    pub(crate) column: String,
    pub(crate) found: Vec<String>,
}

fn header_key(value: &str) -> String {
    value.replace('\u{feff}', "").trim().to_lowercase()
}

/// Bind every column of `schema` to a header position.
///
/// Each source column binds at most once; the first matching spelling wins.
/// Optional columns that are absent bind to `None`.
pub(crate) fn resolve_columns(
    schema: &'static LayerSchema,
    headers: &[String],
) -> Result<Vec<ColumnBinding>, MissingColumn> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        positions.entry(header_key(header)).or_insert(index);
    }

    let mut taken: HashSet<usize> = HashSet::new();
    let mut bindings = Vec::with_capacity(schema.columns.len());

    for spec in schema.columns {
        let index = spec
            .candidates()
            .filter_map(|name| positions.get(&header_key(name)).copied())
            .find(|index| !taken.contains(index));

        match index {
            Some(index) => {
                taken.insert(index);
            }
            None if spec.required => {
                return Err(MissingColumn {
                    column: spec.canonical.to_string(),
                    found: headers.to_vec(),
                });
            }
            None => {}
        }

        bindings.push(ColumnBinding { spec, index });
    }

    Ok(bindings)
}
