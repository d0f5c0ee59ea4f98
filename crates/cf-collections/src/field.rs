//! Field descriptors: the typed, constrained columns of a collection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::QueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cf_core::time::to_rfc3339_ms;

use crate::error::{FieldError, StoreError};

/// Max chars of a text field without an explicit `max`.
pub const DEFAULT_TEXT_MAX: usize = 5000;

/// Max serialized bytes of a json field without an explicit `max_size`.
pub const DEFAULT_JSON_MAX_SIZE: usize = 1 << 20;

/// Free-form text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextField {
    pub name: String,
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
    /// Minimum char count of a non-empty value.
    pub min: Option<usize>,
    /// Maximum char count; [`DEFAULT_TEXT_MAX`] when unset.
    pub max: Option<usize>,
}

/// Email address, optionally restricted to (or from) a set of domains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailField {
    pub name: String,
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
    pub only_domains: Vec<String>,
    pub except_domains: Vec<String>,
}

/// Floating point number with optional bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberField {
    pub name: String,
    /// Present and non-null; zero is a valid value.
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub no_decimal: bool,
}

/// One (`max_select == 1`) or several values out of a fixed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectField {
    pub name: String,
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
    pub max_select: usize,
    pub values: Vec<String>,
}

impl Default for SelectField {
    fn default() -> Self {
        Self {
            name: String::new(),
            required: false,
            presentable: false,
            system: false,
            max_select: 1,
            values: Vec::new(),
        }
    }
}

impl SelectField {
    pub fn is_multiple(&self) -> bool {
        self.max_select > 1
    }
}

/// Point in time, stored as RFC 3339 UTC with millisecond precision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateField {
    pub name: String,
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
}

/// Arbitrary JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonField {
    pub name: String,
    pub required: bool,
    pub presentable: bool,
    pub system: bool,
    /// Max serialized bytes; [`DEFAULT_JSON_MAX_SIZE`] when unset.
    pub max_size: Option<usize>,
}

/// Timestamp stamped by the store on create and/or update. Client values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutodateField {
    pub name: String,
    pub presentable: bool,
    pub system: bool,
    pub on_create: bool,
    pub on_update: bool,
}

/// A typed field descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Field {
    Text(TextField),
    Email(EmailField),
    Number(NumberField),
    Select(SelectField),
    Date(DateField),
    Json(JsonField),
    Autodate(AutodateField),
}

macro_rules! impl_from_field {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Field {
                fn from(field: $ty) -> Self {
                    Field::$variant(field)
                }
            }
        )*
    };
}

impl_from_field! {
    TextField => Text,
    EmailField => Email,
    NumberField => Number,
    SelectField => Select,
    DateField => Date,
    JsonField => Json,
    AutodateField => Autodate,
}

/// How a field's values are laid out in its record table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Text,
    Double,
    /// JSON serialized into a text column.
    Json,
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Self::Text(f) => &f.name,
            Self::Email(f) => &f.name,
            Self::Number(f) => &f.name,
            Self::Select(f) => &f.name,
            Self::Date(f) => &f.name,
            Self::Json(f) => &f.name,
            Self::Autodate(f) => &f.name,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::Text(f) => f.required,
            Self::Email(f) => f.required,
            Self::Number(f) => f.required,
            Self::Select(f) => f.required,
            Self::Date(f) => f.required,
            Self::Json(f) => f.required,
            Self::Autodate(_) => false,
        }
    }

    pub fn is_presentable(&self) -> bool {
        match self {
            Self::Text(f) => f.presentable,
            Self::Email(f) => f.presentable,
            Self::Number(f) => f.presentable,
            Self::Select(f) => f.presentable,
            Self::Date(f) => f.presentable,
            Self::Json(f) => f.presentable,
            Self::Autodate(f) => f.presentable,
        }
    }

    pub fn is_system(&self) -> bool {
        match self {
            Self::Text(f) => f.system,
            Self::Email(f) => f.system,
            Self::Number(f) => f.system,
            Self::Select(f) => f.system,
            Self::Date(f) => f.system,
            Self::Json(f) => f.system,
            Self::Autodate(f) => f.system,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Email(_) => "email",
            Self::Number(_) => "number",
            Self::Select(_) => "select",
            Self::Date(_) => "date",
            Self::Json(_) => "json",
            Self::Autodate(_) => "autodate",
        }
    }

    pub(crate) fn column_kind(&self) -> ColumnKind {
        match self {
            Self::Number(_) => ColumnKind::Double,
            Self::Json(_) => ColumnKind::Json,
            Self::Select(f) if f.is_multiple() => ColumnKind::Json,
            _ => ColumnKind::Text,
        }
    }

    /// Check the descriptor's own options. Returns a human readable reason on failure.
    pub(crate) fn check_definition(&self) -> Result<(), String> {
        let name = self.name();
        match self {
            Self::Text(f) => {
                if let (Some(min), Some(max)) = (f.min, f.max) {
                    if min > max {
                        return Err(format!("field `{name}`: min {min} exceeds max {max}"));
                    }
                }
                if f.max == Some(0) {
                    return Err(format!("field `{name}`: max must be positive"));
                }
            }
            Self::Number(f) => {
                for bound in [f.min, f.max].into_iter().flatten() {
                    if !bound.is_finite() {
                        return Err(format!("field `{name}`: bounds must be finite"));
                    }
                }
                if let (Some(min), Some(max)) = (f.min, f.max) {
                    if min > max {
                        return Err(format!("field `{name}`: min {min} exceeds max {max}"));
                    }
                }
            }
            Self::Select(f) => {
                if f.values.is_empty() {
                    return Err(format!("field `{name}`: select needs at least one value"));
                }
                if f.max_select == 0 || f.max_select > f.values.len() {
                    return Err(format!(
                        "field `{name}`: max_select must be between 1 and {}",
                        f.values.len()
                    ));
                }
                let mut seen = std::collections::HashSet::new();
                if let Some(dup) = f.values.iter().find(|v| !seen.insert(v.as_str())) {
                    return Err(format!("field `{name}`: duplicated select value `{dup}`"));
                }
            }
            Self::Autodate(f) => {
                if !f.on_create && !f.on_update {
                    return Err(format!(
                        "field `{name}`: autodate needs on_create or on_update"
                    ));
                }
            }
            Self::Email(_) | Self::Date(_) | Self::Json(_) => {}
        }
        Ok(())
    }

    /// Validate a client-supplied value and return its normalized form.
    ///
    /// `Value::Null` stands for both an absent key and an explicit null.
    /// Autodate fields accept anything and yield null; the store stamps them.
    pub fn normalize(&self, value: &Value) -> Result<Value, FieldError> {
        match self {
            Self::Text(f) => normalize_text(f, value),
            Self::Email(f) => normalize_email(f, value),
            Self::Number(f) => normalize_number(f, value),
            Self::Select(f) => normalize_select(f, value),
            Self::Date(f) => normalize_date(f.required, value),
            Self::Json(f) => normalize_json(f, value),
            Self::Autodate(_) => Ok(Value::Null),
        }
    }

    /// Convert a normalized value into the bound column value.
    pub(crate) fn to_db_value(&self, value: &Value) -> sea_orm::Value {
        match self.column_kind() {
            ColumnKind::Text => value.as_str().map(str::to_owned).into(),
            ColumnKind::Double => value.as_f64().into(),
            ColumnKind::Json => (!value.is_null()).then(|| value.to_string()).into(),
        }
    }

    /// Read this field's column out of a record row.
    pub(crate) fn read_column(&self, row: &QueryResult) -> Result<Value, StoreError> {
        let name = self.name();
        let value = match self.column_kind() {
            ColumnKind::Text => row
                .try_get::<Option<String>>("", name)?
                .map_or(Value::Null, Value::String),
            ColumnKind::Double => row
                .try_get::<Option<f64>>("", name)?
                .map_or(Value::Null, number_value),
            ColumnKind::Json => match row.try_get::<Option<String>>("", name)? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            },
        };
        Ok(value)
    }
}

/// Render a float as a JSON number, integral values without a fraction.
pub(crate) fn number_value(n: f64) -> Value {
    const MAX_SAFE_INT: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INT {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn blank(required: bool) -> Result<Value, FieldError> {
    if required {
        Err(FieldError::Required)
    } else {
        Ok(Value::Null)
    }
}

fn normalize_text(f: &TextField, value: &Value) -> Result<Value, FieldError> {
    let s = match value {
        Value::Null => "",
        Value::String(s) => s.as_str(),
        _ => return Err(FieldError::InvalidType),
    };
    if s.is_empty() {
        return blank(f.required);
    }
    let len = s.chars().count();
    if let Some(min) = f.min {
        if len < min {
            return Err(FieldError::TooShort(min));
        }
    }
    let max = f.max.unwrap_or(DEFAULT_TEXT_MAX);
    if len > max {
        return Err(FieldError::TooLong(max));
    }
    Ok(Value::String(s.to_owned()))
}

fn normalize_email(f: &EmailField, value: &Value) -> Result<Value, FieldError> {
    let s = match value {
        Value::Null => "",
        Value::String(s) => s.trim(),
        _ => return Err(FieldError::InvalidType),
    };
    if s.is_empty() {
        return blank(f.required);
    }
    let Some(domain) = email_domain(s) else {
        return Err(FieldError::InvalidEmail);
    };
    let domain = domain.to_ascii_lowercase();
    let listed = |list: &[String]| list.iter().any(|d| d.eq_ignore_ascii_case(&domain));
    if !f.only_domains.is_empty() && !listed(&f.only_domains) {
        return Err(FieldError::EmailDomainNotAllowed);
    }
    if listed(&f.except_domains) {
        return Err(FieldError::EmailDomainNotAllowed);
    }
    Ok(Value::String(s.to_owned()))
}

/// Return the domain part of a syntactically plausible address.
fn email_domain(s: &str) -> Option<&str> {
    let (local, domain) = s.rsplit_once('@')?;
    if local.is_empty() || local.len() > 64 || domain.len() > 255 {
        return None;
    }
    if local.contains('@') || local.starts_with('.') || local.ends_with('.') {
        return None;
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let label_ok = |l: &&str| {
        !l.is_empty()
            && !l.starts_with('-')
            && !l.ends_with('-')
            && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    labels.iter().all(label_ok).then_some(domain)
}

fn normalize_number(f: &NumberField, value: &Value) -> Result<Value, FieldError> {
    let n = match value {
        Value::Null => return blank(f.required),
        Value::Number(n) => n.as_f64().ok_or(FieldError::NotANumber)?,
        _ => return Err(FieldError::NotANumber),
    };
    if !n.is_finite() {
        return Err(FieldError::NotANumber);
    }
    if f.no_decimal && n.fract() != 0.0 {
        return Err(FieldError::NotAnInteger);
    }
    if let Some(min) = f.min {
        if n < min {
            return Err(FieldError::BelowMin(min));
        }
    }
    if let Some(max) = f.max {
        if n > max {
            return Err(FieldError::AboveMax(max));
        }
    }
    Ok(number_value(n))
}

fn normalize_select(f: &SelectField, value: &Value) -> Result<Value, FieldError> {
    let check = |v: &str| {
        if f.values.iter().any(|allowed| allowed == v) {
            Ok(())
        } else {
            Err(FieldError::InvalidValue(v.to_owned()))
        }
    };

    if !f.is_multiple() {
        return match value {
            Value::Null => blank(f.required),
            Value::String(s) if s.is_empty() => blank(f.required),
            Value::String(s) => {
                check(s)?;
                Ok(Value::String(s.clone()))
            }
            _ => Err(FieldError::InvalidType),
        };
    }

    let picked: Vec<&str> = match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or(FieldError::InvalidType))
            .collect::<Result<_, _>>()?,
        _ => return Err(FieldError::InvalidType),
    };
    if picked.is_empty() {
        return blank(f.required);
    }
    let mut seen = std::collections::HashSet::new();
    if picked.iter().any(|v| !seen.insert(*v)) {
        return Err(FieldError::DuplicateValues);
    }
    if picked.len() > f.max_select {
        return Err(FieldError::TooManyValues(f.max_select));
    }
    for v in &picked {
        check(v)?;
    }
    Ok(Value::Array(
        picked.into_iter().map(|v| Value::String(v.to_owned())).collect(),
    ))
}

fn normalize_date(required: bool, value: &Value) -> Result<Value, FieldError> {
    let s = match value {
        Value::Null => "",
        Value::String(s) => s.trim(),
        _ => return Err(FieldError::InvalidType),
    };
    if s.is_empty() {
        return blank(required);
    }
    let parsed = parse_datetime(s).ok_or(FieldError::InvalidDate)?;
    Ok(Value::String(to_rfc3339_ms(&parsed)))
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff][Z]` (UTC) and bare `YYYY-MM-DD`.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = s.strip_suffix('Z').unwrap_or(s);
    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn normalize_json(f: &JsonField, value: &Value) -> Result<Value, FieldError> {
    if value.is_null() {
        return blank(f.required);
    }
    let max = f.max_size.unwrap_or(DEFAULT_JSON_MAX_SIZE);
    if value.to_string().len() > max {
        return Err(FieldError::JsonTooLarge(max));
    }
    Ok(value.clone())
}

/// Ordered field descriptors of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(Vec<Field>);

impl FieldList {
    /// Append `field`, or replace in place an existing field with the same name.
    pub fn add(&mut self, field: impl Into<Field>) {
        let field = field.into();
        match self.0.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.0.push(field),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Field::name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
