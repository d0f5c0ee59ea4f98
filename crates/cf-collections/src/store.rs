#![allow(async_fn_in_trait)]

use anyhow::Context as _;
use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, Index as SqlIndex, Order, Query, SelectStatement, SimpleExpr, Table,
};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, QueryResult, SqlErr, TransactionTrait,
};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use cf_core::time::now_rfc3339_ms;
use cf_domain::pagination::{PageRequest, Sort};

use crate::collection::{Collection, ID_COLUMN};
use crate::config::StoreConfig;
use crate::error::{FieldError, StoreError, ValidationErrors};
use crate::field::{ColumnKind, Field};
use crate::record::{Record, RecordPage, RecordSort};

/// Registry table holding one JSON descriptor per collection.
pub const REGISTRY_TABLE: &str = "_collections";

/// Schema-level operations.
pub trait CollectionRepository: Send + Sync {
    async fn find_collection(&self, name: &str) -> Result<Option<Collection>, StoreError>;
    /// All registered collections, oldest first.
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;
    /// Persist a new collection. Fails with `CollectionExists` if the name is taken.
    async fn save(&self, collection: &Collection) -> Result<(), StoreError>;
}

/// Row-level operations on a collection's records.
pub trait RecordRepository: Send + Sync {
    async fn create_record(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    /// Merge `patch` over the stored record and revalidate.
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn find_record(&self, collection: &str, id: &str)
    -> Result<Option<Record>, StoreError>;

    /// `sort` is `field` or `-field`; newest first when absent.
    async fn list_records(
        &self,
        collection: &str,
        page: PageRequest,
        sort: Option<&str>,
    ) -> Result<RecordPage, StoreError>;
}

// ── sea-orm backed store ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCollectionStore {
    pub db: DatabaseConnection,
}

impl DbCollectionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open the database named by `config`, creating the sqlite data dir if needed.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.is_sqlite() {
            tokio::fs::create_dir_all(&config.data_dir)
                .await
                .with_context(|| format!("create data dir {}", config.data_dir.display()))?;
        }
        let db = Database::connect(&config.database_url).await?;
        info!(data_dir = %config.data_dir.display(), "collection store connected");
        Ok(Self::new(db))
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.db.ping().await?;
        Ok(())
    }

    /// Create the collection registry table if it does not exist yet.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        let stmt = Table::create()
            .table(Alias::new(REGISTRY_TABLE))
            .if_not_exists()
            .col(
                ColumnDef::new(Alias::new("name"))
                    .text()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Alias::new("definition")).text().not_null())
            .col(ColumnDef::new(Alias::new("created")).text().not_null())
            .col(ColumnDef::new(Alias::new("updated")).text().not_null())
            .to_owned();
        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn require_collection(&self, name: &str) -> Result<Collection, StoreError> {
        self.find_collection(name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_owned()))
    }

    async fn find_in(
        &self,
        collection: &Collection,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        let mut stmt = select_record_columns(collection);
        stmt.and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id));
        let backend = self.db.get_database_backend();
        match self.db.query_one(backend.build(&stmt)).await? {
            Some(row) => Ok(Some(row_to_record(collection, &row)?)),
            None => Ok(None),
        }
    }

    /// Reject values that would collide on a unique index.
    ///
    /// Partial indexes and indexes over `id` are left to the database.
    async fn check_unique(
        &self,
        collection: &Collection,
        row: &Map<String, Value>,
        exclude_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let backend = self.db.get_database_backend();
        let mut errors = ValidationErrors::new();
        for index in collection.unique_indexes() {
            if index.options.is_some() || index.columns.iter().any(|c| c == ID_COLUMN) {
                continue;
            }
            let mut stmt = Query::select();
            stmt.column(Alias::new(ID_COLUMN))
                .from(Alias::new(&collection.name))
                .limit(1);
            let mut comparable = true;
            for column in &index.columns {
                let (Some(field), Some(value)) = (collection.field(column), row.get(column)) else {
                    comparable = false;
                    break;
                };
                // NULLs never collide in a unique index.
                if value.is_null() {
                    comparable = false;
                    break;
                }
                stmt.and_where(Expr::col(Alias::new(column)).eq(field.to_db_value(value)));
            }
            if !comparable {
                continue;
            }
            if let Some(id) = exclude_id {
                stmt.and_where(Expr::col(Alias::new(ID_COLUMN)).ne(id));
            }
            if self.db.query_one(backend.build(&stmt)).await?.is_some() {
                for column in &index.columns {
                    errors.add(column.as_str(), FieldError::NotUnique);
                }
            }
        }
        errors.into_result()
    }
}

impl CollectionRepository for DbCollectionStore {
    async fn find_collection(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        let stmt = Query::select()
            .column(Alias::new("definition"))
            .from(Alias::new(REGISTRY_TABLE))
            .and_where(Expr::col(Alias::new("name")).eq(name))
            .to_owned();
        let backend = self.db.get_database_backend();
        let Some(row) = self.db.query_one(backend.build(&stmt)).await? else {
            return Ok(None);
        };
        let definition: String = row.try_get("", "definition")?;
        Ok(Some(serde_json::from_str(&definition)?))
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let stmt = Query::select()
            .column(Alias::new("definition"))
            .from(Alias::new(REGISTRY_TABLE))
            .order_by(Alias::new("created"), Order::Asc)
            .order_by(Alias::new("name"), Order::Asc)
            .to_owned();
        let backend = self.db.get_database_backend();
        let rows = self.db.query_all(backend.build(&stmt)).await?;
        rows.iter()
            .map(|row| -> Result<Collection, StoreError> {
                let definition: String = row.try_get("", "definition")?;
                Ok(serde_json::from_str(&definition)?)
            })
            .collect()
    }

    async fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        collection.validate()?;
        let name = collection.name.as_str();
        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;

        let existing = Query::select()
            .column(Alias::new("name"))
            .from(Alias::new(REGISTRY_TABLE))
            .and_where(Expr::col(Alias::new("name")).eq(name))
            .to_owned();
        if txn.query_one(backend.build(&existing)).await?.is_some() {
            return Err(StoreError::CollectionExists(name.to_owned()));
        }

        let now = now_rfc3339_ms();
        let register = Query::insert()
            .into_table(Alias::new(REGISTRY_TABLE))
            .columns([
                Alias::new("name"),
                Alias::new("definition"),
                Alias::new("created"),
                Alias::new("updated"),
            ])
            .values([
                Expr::value(name),
                Expr::value(serde_json::to_string(collection)?),
                Expr::value(now.as_str()),
                Expr::value(now.as_str()),
            ])?
            .to_owned();
        txn.execute(backend.build(&register))
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    StoreError::CollectionExists(name.to_owned())
                }
                _ => StoreError::Db(err),
            })?;

        let mut table = Table::create();
        table.table(Alias::new(name)).col(
            ColumnDef::new(Alias::new(ID_COLUMN))
                .text()
                .not_null()
                .primary_key(),
        );
        for field in &collection.fields {
            let mut column = ColumnDef::new(Alias::new(field.name()));
            match field.column_kind() {
                ColumnKind::Double => column.double(),
                ColumnKind::Text | ColumnKind::Json => column.text(),
            };
            table.col(&mut column);
        }
        txn.execute(backend.build(&table)).await?;

        for index in &collection.indexes {
            let mut create = SqlIndex::create();
            create.name(&index.name).table(Alias::new(name));
            for column in &index.columns {
                create.col(Alias::new(column));
            }
            if index.unique {
                create.unique();
            }
            let mut stmt = backend.build(&create);
            if let Some(predicate) = &index.options {
                stmt.sql.push_str(" WHERE ");
                stmt.sql.push_str(predicate);
            }
            txn.execute(stmt).await?;
        }

        txn.commit().await?;
        info!(
            collection = name,
            fields = collection.fields.len(),
            indexes = collection.indexes.len(),
            "collection saved"
        );
        Ok(())
    }
}

impl RecordRepository for DbCollectionStore {
    async fn create_record(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let collection = self.require_collection(collection).await?;
        let mut row = validate_data(&collection, &data, None)?;
        let now = Value::String(now_rfc3339_ms());
        for field in &collection.fields {
            if let Field::Autodate(f) = field {
                if f.on_create {
                    row.insert(f.name.clone(), now.clone());
                }
            }
        }
        self.check_unique(&collection, &row, None).await?;

        let id = Uuid::now_v7().to_string();
        let mut columns = vec![Alias::new(ID_COLUMN)];
        let mut values: Vec<SimpleExpr> = vec![Expr::value(id.as_str())];
        for field in &collection.fields {
            columns.push(Alias::new(field.name()));
            values.push(Expr::value(field.to_db_value(column_value(&row, field))));
        }
        let stmt = Query::insert()
            .into_table(Alias::new(&collection.name))
            .columns(columns)
            .values(values)?
            .to_owned();
        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&stmt))
            .await
            .map_err(|err| unique_violation(&collection, err))?;

        debug!(collection = %collection.name, id = %id, "record created");
        Ok(Record {
            id,
            collection_name: collection.name,
            data: row,
        })
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let collection = self.require_collection(collection).await?;
        let existing = self
            .find_in(&collection, id)
            .await?
            .ok_or_else(|| StoreError::RecordNotFound(id.to_owned()))?;
        let mut row = validate_data(&collection, &patch, Some(&existing))?;
        let now = Value::String(now_rfc3339_ms());
        for field in &collection.fields {
            if let Field::Autodate(f) = field {
                if f.on_update {
                    row.insert(f.name.clone(), now.clone());
                }
            }
        }
        self.check_unique(&collection, &row, Some(id)).await?;

        let assignments: Vec<(Alias, SimpleExpr)> = collection
            .fields
            .iter()
            .map(|field| {
                (
                    Alias::new(field.name()),
                    Expr::value(field.to_db_value(column_value(&row, field))),
                )
            })
            .collect();
        let stmt = Query::update()
            .table(Alias::new(&collection.name))
            .values(assignments)
            .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id))
            .to_owned();
        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&stmt))
            .await
            .map_err(|err| unique_violation(&collection, err))?;

        debug!(collection = %collection.name, id, "record updated");
        Ok(Record {
            id: existing.id,
            collection_name: collection.name,
            data: row,
        })
    }

    async fn find_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        let collection = self.require_collection(collection).await?;
        self.find_in(&collection, id).await
    }

    async fn list_records(
        &self,
        collection: &str,
        page: PageRequest,
        sort: Option<&str>,
    ) -> Result<RecordPage, StoreError> {
        let collection = self.require_collection(collection).await?;
        let page = page.clamped();
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(expr) => RecordSort::parse(expr, &collection)?,
            None => RecordSort::default_for(&collection),
        };
        let backend = self.db.get_database_backend();

        let count = Query::select()
            .expr_as(Expr::col(Alias::new(ID_COLUMN)).count(), Alias::new("total"))
            .from(Alias::new(&collection.name))
            .to_owned();
        let total_items = match self.db.query_one(backend.build(&count)).await? {
            Some(row) => u64::try_from(row.try_get::<i64>("", "total")?).unwrap_or_default(),
            None => 0,
        };

        let order = match sort.direction {
            Sort::Asc => Order::Asc,
            Sort::Desc => Order::Desc,
        };
        let mut stmt = select_record_columns(&collection);
        stmt.order_by(Alias::new(&sort.field), order.clone());
        if sort.field != ID_COLUMN {
            stmt.order_by(Alias::new(ID_COLUMN), order);
        }
        stmt.limit(u64::from(page.per_page)).offset(page.offset());
        let rows = self.db.query_all(backend.build(&stmt)).await?;
        let items = rows
            .iter()
            .map(|row| row_to_record(&collection, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordPage {
            page: page.page,
            per_page: page.per_page,
            total_items,
            total_pages: page.total_pages(total_items),
            items,
        })
    }
}

/// Validate `input` against every non-autodate field, falling back to
/// `existing` values for keys the input omits. Unknown keys are ignored.
fn validate_data(
    collection: &Collection,
    input: &Map<String, Value>,
    existing: Option<&Record>,
) -> Result<Map<String, Value>, StoreError> {
    let mut errors = ValidationErrors::new();
    let mut row = Map::new();
    for field in &collection.fields {
        let name = field.name();
        let previous = existing.and_then(|r| r.get(name));
        if let Field::Autodate(_) = field {
            row.insert(name.to_owned(), previous.cloned().unwrap_or(Value::Null));
            continue;
        }
        let raw = input.get(name).or(previous).unwrap_or(&Value::Null);
        match field.normalize(raw) {
            Ok(value) => {
                row.insert(name.to_owned(), value);
            }
            Err(err) => errors.add(name, err),
        }
    }
    errors.into_result()?;
    Ok(row)
}

fn column_value<'a>(row: &'a Map<String, Value>, field: &Field) -> &'a Value {
    row.get(field.name()).unwrap_or(&Value::Null)
}

fn unique_violation(collection: &Collection, err: DbErr) -> StoreError {
    if !matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StoreError::Db(err);
    }
    let mut errors = ValidationErrors::new();
    for index in collection.unique_indexes() {
        for column in &index.columns {
            errors.add(column.as_str(), FieldError::NotUnique);
        }
    }
    if errors.is_empty() {
        errors.add(ID_COLUMN, FieldError::NotUnique);
    }
    StoreError::Validation(errors)
}

fn select_record_columns(collection: &Collection) -> SelectStatement {
    let mut stmt = Query::select();
    stmt.column(Alias::new(ID_COLUMN))
        .columns(collection.fields.names().map(Alias::new))
        .from(Alias::new(&collection.name));
    stmt
}

fn row_to_record(collection: &Collection, row: &QueryResult) -> Result<Record, StoreError> {
    let id: String = row.try_get("", ID_COLUMN)?;
    let mut data = Map::new();
    for field in &collection.fields {
        data.insert(field.name().to_owned(), field.read_column(row)?);
    }
    Ok(Record {
        id,
        collection_name: collection.name.clone(),
        data,
    })
}
