//! Select builder and compilation to a parameterized statement

use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::Result;
use crate::introspect::{describe, validate_identifier, RecordMeta};
use crate::model::{FieldKind, Model, RecordType, Value, ID_COLUMN};

use super::expr::{Aggregate, AggregateFn, Expr, Ordering, Predicate};
use super::rows::Rows;
use super::sql::{quote_ident, render_expr};
use super::QueryExecutor;

/// What a select returns
#[derive(Debug, Clone)]
enum Projection {
    /// `id` followed by every persisted field
    Records,
    Columns(Vec<String>),
    Aggregates(Vec<(AggregateFn, String, String)>),
}

/// Output column of a compiled query, with the kind used to decode it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: String,
    /// `None` when the engine's own type should be kept
    pub kind: Option<FieldKind>,
}

/// A select ready for execution
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub record_type: RecordType,
    pub meta: Arc<RecordMeta>,
    pub sql: String,
    pub params: Vec<Value>,
    pub columns: Vec<OutputColumn>,
}

/// Composable select over the rows of `T`
pub struct Select<T> {
    projection: Projection,
    filter: Option<Expr>,
    group_by: Vec<String>,
    order_by: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> Select<T> {
    fn with_projection(projection: Projection) -> Self {
        Self {
            projection,
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            _model: PhantomData,
        }
    }

    /// Whole records: `id` plus every persisted field
    pub fn records() -> Self {
        Self::with_projection(Projection::Records)
    }

    /// A subset of columns, by name
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_projection(Projection::Columns(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn aggregate(aggregate: Aggregate<T>) -> Self {
        Self::aggregates(vec![aggregate])
    }

    pub fn aggregates(aggregates: Vec<Aggregate<T>>) -> Self {
        Self::with_projection(Projection::Aggregates(
            aggregates
                .into_iter()
                .map(|a| (a.func, a.column, a.alias))
                .collect(),
        ))
    }

    /// Add a condition; repeated calls are AND-combined
    pub fn filter(mut self, predicate: Predicate<T>) -> Self {
        let expr = predicate.into_expr();
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::And(Box::new(existing), Box::new(expr)),
            None => expr,
        });
        self
    }

    /// Group by a column; for aggregate selects the group keys lead the output
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn order_by(mut self, ordering: Ordering<T>) -> Self {
        self.order_by.push((ordering.column, ordering.descending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Validate names against `T` and render the statement
    ///
    /// # Errors
    ///
    /// - `UnknownField` for any column `T` does not declare
    /// - `InvalidIdentifier` for an aggregate alias that is not a plain identifier
    /// - any introspection failure of `T`
    pub fn compile(&self) -> Result<CompiledQuery> {
        let meta = describe::<T>()?;
        let mut columns: Vec<OutputColumn> = Vec::new();
        let mut select_list: Vec<String> = Vec::new();

        match &self.projection {
            Projection::Records => {
                select_list.push(quote_ident(ID_COLUMN));
                columns.push(OutputColumn {
                    name: ID_COLUMN.to_string(),
                    kind: Some(FieldKind::Integer),
                });
                for field in meta.fields() {
                    select_list.push(quote_ident(field.name));
                    columns.push(OutputColumn {
                        name: field.name.to_string(),
                        kind: Some(field.kind),
                    });
                }
            }
            Projection::Columns(names) => {
                for name in names {
                    meta.require_column(name)?;
                    select_list.push(quote_ident(name));
                    columns.push(OutputColumn {
                        name: name.clone(),
                        kind: meta.column_kind(name),
                    });
                }
            }
            Projection::Aggregates(aggregates) => {
                for name in &self.group_by {
                    meta.require_column(name)?;
                    select_list.push(quote_ident(name));
                    columns.push(OutputColumn {
                        name: name.clone(),
                        kind: meta.column_kind(name),
                    });
                }
                for (func, column, alias) in aggregates {
                    meta.require_column(column)?;
                    validate_identifier(alias)?;
                    select_list.push(format!(
                        "{}({}) AS {}",
                        func.sql(),
                        quote_ident(column),
                        quote_ident(alias)
                    ));
                    columns.push(OutputColumn {
                        name: alias.clone(),
                        kind: aggregate_kind(*func, meta.column_kind(column)),
                    });
                }
            }
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            quote_ident(meta.table())
        );
        let mut params = Vec::new();

        if let Some(filter) = &self.filter {
            for column in filter.columns() {
                meta.require_column(column)?;
            }
            sql.push_str(" WHERE ");
            render_expr(filter, &mut sql, &mut params);
        }

        if !self.group_by.is_empty() {
            let mut keys = Vec::with_capacity(self.group_by.len());
            for name in &self.group_by {
                meta.require_column(name)?;
                keys.push(quote_ident(name));
            }
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        if !self.order_by.is_empty() {
            let mut terms = Vec::with_capacity(self.order_by.len());
            for (name, descending) in &self.order_by {
                let is_alias = columns.iter().any(|c| &c.name == name);
                if !is_alias {
                    meta.require_column(name)?;
                }
                terms.push(format!(
                    "{} {}",
                    quote_ident(name),
                    if *descending { "DESC" } else { "ASC" }
                ));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        match (self.limit, self.offset) {
            (None, None) => {}
            (limit, offset) => {
                sql.push_str(" LIMIT ?");
                params.push(Value::Integer(limit.map(clamp_i64).unwrap_or(-1)));
                if let Some(offset) = offset {
                    sql.push_str(" OFFSET ?");
                    params.push(Value::Integer(clamp_i64(offset)));
                }
            }
        }

        Ok(CompiledQuery {
            record_type: RecordType::of::<T>(),
            meta,
            sql,
            params,
            columns,
        })
    }

    /// Compile and run through `executor`
    ///
    /// # Errors
    ///
    /// See [`Select::compile`], plus whatever the executor reports.
    pub fn query<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Rows> {
        let compiled = self.compile()?;
        executor.execute(&compiled)
    }
}

impl<T> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            projection: self.projection.clone(),
            filter: self.filter.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            _model: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select")
            .field("projection", &self.projection)
            .field("filter", &self.filter)
            .field("group_by", &self.group_by)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn aggregate_kind(func: AggregateFn, column: Option<FieldKind>) -> Option<FieldKind> {
    match func {
        AggregateFn::Count => Some(FieldKind::Integer),
        AggregateFn::Avg => Some(FieldKind::Real),
        AggregateFn::Sum => match column {
            Some(FieldKind::Integer) | Some(FieldKind::Boolean) => Some(FieldKind::Integer),
            Some(FieldKind::Real) => Some(FieldKind::Real),
            _ => None,
        },
        AggregateFn::Min | AggregateFn::Max => column,
    }
}
