use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::field::{Field, FieldList};
use crate::rule::AccessRule;

/// Name of the implicit primary key column of every record table.
pub const ID_COLUMN: &str = "id";

/// Key a serialized record uses for its collection name.
pub const COLLECTION_NAME_KEY: &str = "collectionName";

/// A store-maintained index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
    /// SQL predicate of a partial index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// Descriptor of a base collection: its fields, indexes and access rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub name: String,
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
    pub fields: FieldList,
    pub indexes: Vec<Index>,
}

impl Collection {
    /// An empty collection with every rule locked.
    pub fn new_base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list_rule: None,
            view_rule: None,
            create_rule: None,
            update_rule: None,
            delete_rule: None,
            fields: FieldList::default(),
            indexes: Vec::new(),
        }
    }

    /// Register an index. `columns` is a comma separated column list and
    /// `options` an optional partial-index predicate (empty for none).
    ///
    /// An index with the same name is replaced.
    pub fn add_index(&mut self, name: &str, unique: bool, columns: &str, options: &str) {
        let index = Index {
            name: name.to_owned(),
            unique,
            columns: columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
            options: Some(options.trim())
                .filter(|o| !o.is_empty())
                .map(str::to_owned),
        };
        match self.indexes.iter_mut().find(|i| i.name == index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter().filter(|i| i.unique)
    }

    pub fn list_access(&self) -> Result<AccessRule, StoreError> {
        self.parse_rule("list", self.list_rule.as_deref())
    }

    pub fn view_access(&self) -> Result<AccessRule, StoreError> {
        self.parse_rule("view", self.view_rule.as_deref())
    }

    fn parse_rule(&self, which: &str, rule: Option<&str>) -> Result<AccessRule, StoreError> {
        AccessRule::parse(rule)
            .map_err(|e| StoreError::invalid_collection(&self.name, format!("{which} rule: {e}")))
    }

    /// Check the descriptor before it is persisted.
    pub fn validate(&self) -> Result<(), StoreError> {
        let fail = |reason: String| Err(StoreError::invalid_collection(&self.name, reason));

        if !is_identifier(&self.name) {
            return fail("name must be non-empty and contain only letters, digits and `_`".into());
        }
        if self.name.starts_with('_') {
            return fail("names starting with `_` are reserved".into());
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            let name = field.name();
            if !is_identifier(name) {
                return fail(format!("invalid field name `{name}`"));
            }
            if name == ID_COLUMN || name == COLLECTION_NAME_KEY {
                return fail(format!("field name `{name}` is reserved"));
            }
            if !names.insert(name) {
                return fail(format!("duplicated field name `{name}`"));
            }
            if let Err(reason) = field.check_definition() {
                return fail(reason);
            }
        }

        let mut index_names = HashSet::new();
        for index in &self.indexes {
            if !is_identifier(&index.name) {
                return fail(format!("invalid index name `{}`", index.name));
            }
            if !index_names.insert(index.name.as_str()) {
                return fail(format!("duplicated index name `{}`", index.name));
            }
            if index.columns.is_empty() {
                return fail(format!("index `{}` has no columns", index.name));
            }
            if let Some(col) = index
                .columns
                .iter()
                .find(|c| c.as_str() != ID_COLUMN && !names.contains(c.as_str()))
            {
                return fail(format!(
                    "index `{}` references unknown field `{col}`",
                    index.name
                ));
            }
        }

        for (which, rule) in [
            ("list", &self.list_rule),
            ("view", &self.view_rule),
            ("create", &self.create_rule),
            ("update", &self.update_rule),
            ("delete", &self.delete_rule),
        ] {
            self.parse_rule(which, rule.as_deref())?;
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
