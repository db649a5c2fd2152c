// File: src/admin.rs
// Purpose: Admin change-list configuration for a model and the query it produces

use crate::database::{
    build_search_pattern, quote_ident, select_columns, DatabaseType, ModelStore, SqlParams, LIKE_ESCAPE,
};
use crate::error::{DefinitionError, PersistenceResult};
use crate::model::{ColumnType, Entity, ModelSpec, StoredValue};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

const DEFAULT_PER_PAGE: usize = 100;

/// A titled group of fields on the change form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fieldset {
    pub title: Option<String>,
    pub fields: Vec<String>,
}

impl Fieldset {
    pub fn new(title: Option<&str>, fields: &[&str]) -> Self {
        Self {
            title: title.map(str::to_string),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// How a model is listed and searched in the admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSpec {
    pub list_display: Vec<String>,
    pub list_filter: Vec<String>,
    pub search_fields: Vec<String>,
    /// Column names; a leading `-` sorts descending
    pub ordering: Vec<String>,
    pub fieldsets: Vec<Fieldset>,
    pub list_per_page: usize,
}

impl Default for AdminSpec {
    fn default() -> Self {
        Self {
            list_display: vec!["id".to_string()],
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            ordering: Vec::new(),
            fieldsets: Vec::new(),
            list_per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl AdminSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_display(mut self, columns: &[&str]) -> Self {
        self.list_display = owned(columns);
        self
    }

    pub fn list_filter(mut self, columns: &[&str]) -> Self {
        self.list_filter = owned(columns);
        self
    }

    pub fn search_fields(mut self, columns: &[&str]) -> Self {
        self.search_fields = owned(columns);
        self
    }

    pub fn ordering(mut self, columns: &[&str]) -> Self {
        self.ordering = owned(columns);
        self
    }

    pub fn fieldset(mut self, title: Option<&str>, fields: &[&str]) -> Self {
        self.fieldsets.push(Fieldset::new(title, fields));
        self
    }

    pub fn list_per_page(mut self, per_page: usize) -> Self {
        self.list_per_page = per_page.max(1);
        self
    }

    /// Check every referenced name against the model's columns
    pub fn validate(&self, model: &ModelSpec) -> Result<(), DefinitionError> {
        let unknown = |name: &str| DefinitionError::UnknownColumn {
            model: model.name().to_string(),
            name: name.to_string(),
        };

        let ordering = self.ordering.iter().map(|o| o.trim_start_matches('-'));
        let fieldsets = self.fieldsets.iter().flat_map(|f| f.fields.iter().map(String::as_str));
        let referenced = self
            .list_display
            .iter()
            .chain(&self.list_filter)
            .chain(&self.search_fields)
            .map(String::as_str)
            .chain(ordering)
            .chain(fieldsets);

        for name in referenced {
            if !model.has_column(name) {
                return Err(unknown(name));
            }
        }

        for name in &self.search_fields {
            let searchable = model
                .column(name)
                .map(|c| c.column_type() == ColumnType::Text && !c.is_hashed())
                .unwrap_or(false);
            if !searchable {
                return Err(DefinitionError::InapplicableConstraint {
                    field: name.clone(),
                    constraint: "search_fields",
                });
            }
        }

        Ok(())
    }

    /// Read search text, filters and page from query parameters
    ///
    /// `q` is the search text, `p` the zero-based page; other keys are
    /// filters and must be listed in `list_filter`.
    pub fn query_from_params(&self, params: &HashMap<String, String>) -> ChangeListQuery {
        let mut query = ChangeListQuery::default();

        for (key, value) in params {
            match key.as_str() {
                "q" => query.search = Some(value.clone()).filter(|s| !s.is_empty()),
                "p" => query.page = value.parse().unwrap_or(0),
                column if self.list_filter.iter().any(|f| f == column) => {
                    query.filters.push((column.to_string(), value.clone()));
                }
                other => warn!(filter = %other, "ignoring filter not in list_filter"),
            }
        }

        query.filters.sort();
        query
    }

    fn where_clause(&self, model: &ModelSpec, query: &ChangeListQuery, params: &mut SqlParams) -> String {
        let mut conditions = Vec::new();

        let (has_search, pattern) = build_search_pattern(query.search.as_deref());
        if has_search && !self.search_fields.is_empty() {
            let alternatives: Vec<String> = self
                .search_fields
                .iter()
                .map(|field| {
                    format!(
                        "LOWER({}) LIKE LOWER({}) {}",
                        quote_ident(field),
                        params.push(StoredValue::Text(pattern.clone())),
                        LIKE_ESCAPE
                    )
                })
                .collect();
            conditions.push(format!("({})", alternatives.join(" OR ")));
        }

        for (column, raw) in &query.filters {
            if !self.list_filter.contains(column) {
                continue;
            }
            match filter_value(model, column, raw) {
                Some(value) => conditions.push(format!("{} = {}", quote_ident(column), params.push(value))),
                None => warn!(filter = %column, value = %raw, "ignoring unparsable filter value"),
            }
        }

        if conditions.is_empty() {
            "1 = 1".to_string()
        } else {
            conditions.join(" AND ")
        }
    }

    fn order_clause(&self) -> String {
        if self.ordering.is_empty() {
            return format!("{} DESC", quote_ident("id"));
        }
        self.ordering
            .iter()
            .map(|o| match o.strip_prefix('-') {
                Some(column) => format!("{} DESC", quote_ident(column)),
                None => format!("{} ASC", quote_ident(o)),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// SELECT for one page of the change list, plus its WHERE clause
    pub fn change_list_sql(
        &self,
        db_type: DatabaseType,
        model: &ModelSpec,
        query: &ChangeListQuery,
    ) -> (String, String, SqlParams) {
        let mut params = SqlParams::new(db_type);
        let condition = self.where_clause(model, query, &mut params);
        // Pages past the end are empty, never an overflow
        let offset = query
            .page
            .saturating_mul(self.list_per_page)
            .min(i64::MAX as usize);

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            select_columns(model),
            quote_ident(model.table()),
            condition,
            self.order_clause(),
            self.list_per_page,
            offset
        );
        (sql, condition, params)
    }

    /// Fetch one page of the change list
    pub async fn change_list(
        &self,
        store: &ModelStore,
        model: &ModelSpec,
        query: &ChangeListQuery,
    ) -> PersistenceResult<ChangeList> {
        let (sql, condition, params) = self.change_list_sql(store.db_type(), model, query);

        let entities = store.select(model, &sql, params.values()).await?;
        let total = store.count_where(model, &condition, params.values()).await?;

        let rows = entities
            .iter()
            .map(|entity| display_row(&self.list_display, entity))
            .collect();

        Ok(ChangeList {
            columns: self.list_display.clone(),
            rows,
            total,
            page: query.page,
        })
    }
}

/// Search, filters and page requested for a change list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeListQuery {
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
    pub page: usize,
}

/// One page of a change list, shaped by `list_display`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeList {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<StoredValue>>,
    /// Matching entities across all pages
    pub total: i64,
    pub page: usize,
}

fn display_row(columns: &[String], entity: &Entity) -> Vec<StoredValue> {
    columns
        .iter()
        .map(|column| match column.as_str() {
            "id" => StoredValue::Integer(entity.id),
            other => entity.get(other).cloned().unwrap_or(StoredValue::Null),
        })
        .collect()
}

fn filter_value(model: &ModelSpec, column: &str, raw: &str) -> Option<StoredValue> {
    let column_type = if column == "id" {
        ColumnType::Integer
    } else {
        model.column(column)?.column_type()
    };

    match column_type {
        ColumnType::Integer => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Some(StoredValue::Integer(1)),
            "false" | "no" | "off" => Some(StoredValue::Integer(0)),
            other => other.parse().ok().map(StoredValue::Integer),
        },
        ColumnType::Real => raw.parse().ok().map(StoredValue::Real),
        ColumnType::Text => Some(StoredValue::Text(raw.to_string())),
    }
}
