use std::collections::BTreeMap;

use serde::Serialize;

/// Errors returned by the collection store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection `{0}` already exists")]
    CollectionExists(String),
    #[error("collection `{0}` not found")]
    CollectionNotFound(String),
    #[error("invalid collection `{name}`: {reason}")]
    InvalidCollection { name: String, reason: String },
    #[error("record `{0}` not found")]
    RecordNotFound(String),
    #[error("invalid sort field `{0}`")]
    InvalidSort(String),
    #[error("failed to validate record data")]
    Validation(ValidationErrors),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("query build error: {0}")]
    Query(#[from] sea_orm::sea_query::error::Error),
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn invalid_collection(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCollection {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Why a single field value was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("Cannot be blank.")]
    Required,
    #[error("Invalid value type.")]
    InvalidType,
    #[error("Must be at least {0} character(s).")]
    TooShort(usize),
    #[error("Must be no more than {0} character(s).")]
    TooLong(usize),
    #[error("Must be a valid email address.")]
    InvalidEmail,
    #[error("Email domain is not allowed.")]
    EmailDomainNotAllowed,
    #[error("Must be a valid number.")]
    NotANumber,
    #[error("Must be larger than {0}.")]
    BelowMin(f64),
    #[error("Must be less than {0}.")]
    AboveMax(f64),
    #[error("Decimal numbers are not allowed.")]
    NotAnInteger,
    #[error("Invalid value `{0}`.")]
    InvalidValue(String),
    #[error("Duplicated values are not allowed.")]
    DuplicateValues,
    #[error("Select no more than {0} value(s).")]
    TooManyValues(usize),
    #[error("Must be a valid date.")]
    InvalidDate,
    #[error("The maximum allowed JSON size is {0} bytes.")]
    JsonTooLarge(usize),
    #[error("Value must be unique.")]
    NotUnique,
}

impl FieldError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "validation_required",
            Self::InvalidType => "validation_invalid_type",
            Self::TooShort(_) => "validation_min_text_constraint",
            Self::TooLong(_) => "validation_max_text_constraint",
            Self::InvalidEmail => "validation_is_email",
            Self::EmailDomainNotAllowed => "validation_email_domain_not_allowed",
            Self::NotANumber => "validation_not_a_number",
            Self::BelowMin(_) => "validation_min_number_constraint",
            Self::AboveMax(_) => "validation_max_number_constraint",
            Self::NotAnInteger => "validation_no_decimal_constraint",
            Self::InvalidValue(_) => "validation_invalid_value",
            Self::DuplicateValues => "validation_duplicated_values",
            Self::TooManyValues(_) => "validation_too_many_values",
            Self::InvalidDate => "validation_invalid_date",
            Self::JsonTooLarge(_) => "validation_json_size_limit",
            Self::NotUnique => "validation_not_unique",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FieldErrorBody {
    code: &'static str,
    message: String,
}

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.0.entry(field.into()).or_insert(error);
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), StoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(self))
        }
    }

    /// Render as `{"field": {"code": ..., "message": ...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        let body: BTreeMap<&str, FieldErrorBody> = self
            .0
            .iter()
            .map(|(field, err)| {
                (
                    field.as_str(),
                    FieldErrorBody {
                        code: err.code(),
                        message: err.to_string(),
                    },
                )
            })
            .collect();
        serde_json::to_value(body).unwrap_or_default()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, err) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {err}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_first_error_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("role", FieldError::InvalidValue("admin".into()));
        errors.add("role", FieldError::Required);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("role"),
            Some(&FieldError::InvalidValue("admin".into()))
        );
    }

    #[test]
    fn should_render_code_and_message() {
        let mut errors = ValidationErrors::new();
        errors.add("cost", FieldError::BelowMin(0.0));
        let json = errors.to_json();
        assert_eq!(json["cost"]["code"], "validation_min_number_constraint");
        assert_eq!(json["cost"]["message"], "Must be larger than 0.");
    }

    #[test]
    fn should_convert_empty_errors_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut errors = ValidationErrors::new();
        errors.add("email", FieldError::Required);
        assert!(matches!(
            errors.into_result(),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn should_display_errors_joined() {
        let mut errors = ValidationErrors::new();
        errors.add("b", FieldError::Required);
        errors.add("a", FieldError::InvalidEmail);
        assert_eq!(
            errors.to_string(),
            "a: Must be a valid email address.; b: Cannot be blank."
        );
    }
}
