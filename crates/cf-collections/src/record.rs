use serde::Serialize;
use serde_json::{Map, Value};

use cf_domain::pagination::Sort;

use crate::collection::{Collection, ID_COLUMN};
use crate::error::StoreError;

/// A stored row of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub collection_name: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// One page of a record listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub items: Vec<Record>,
}

/// Ordering of a record listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSort {
    pub field: String,
    pub direction: Sort,
}

impl RecordSort {
    /// Parse `field` / `-field` (descending) and check the field exists.
    pub fn parse(expr: &str, collection: &Collection) -> Result<Self, StoreError> {
        let expr = expr.trim();
        let (field, direction) = match expr.strip_prefix('-') {
            Some(rest) => (rest, Sort::Desc),
            None => (expr.strip_prefix('+').unwrap_or(expr), Sort::Asc),
        };
        if field != ID_COLUMN && collection.field(field).is_none() {
            return Err(StoreError::InvalidSort(expr.to_owned()));
        }
        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }

    /// Newest first when the collection has a `created` field, else by id.
    pub fn default_for(collection: &Collection) -> Self {
        let field = if collection.field("created").is_some() {
            "created"
        } else {
            ID_COLUMN
        };
        Self {
            field: field.to_owned(),
            direction: Sort::Desc,
        }
    }
}
