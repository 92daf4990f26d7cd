//! Expression tree and the fluent column API that builds it

use std::marker::PhantomData;

use crate::errors::Result;
use crate::model::{Model, Value};

use super::rows::Rows;
use super::select::Select;
use super::QueryExecutor;

/// Binary comparison between a column and a bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// Untyped predicate tree
///
/// Column names are checked against the record type when the enclosing
/// query is compiled; values are always bound as parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    InList {
        column: String,
        values: Vec<Value>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Every column name referenced by the tree, in visit order
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Compare { column, .. }
            | Expr::IsNull { column, .. }
            | Expr::InList { column, .. } => out.push(column),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
            Expr::Not(inner) => inner.collect_columns(out),
        }
    }
}

/// Aggregate functions available on a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFn {
    pub fn sql(&self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
            AggregateFn::Avg => "AVG",
        }
    }
}

/// Handle on one column of `T`, the entry point for building expressions
pub struct Column<T> {
    name: String,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> Column<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _model: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(&self, op: CompareOp, value: Value) -> Predicate<T> {
        Predicate::new(Expr::Compare {
            column: self.name.clone(),
            op,
            value,
        })
    }

    /// Equality; comparing with a null value becomes `IS NULL`
    pub fn eq(&self, value: impl Into<Value>) -> Predicate<T> {
        match value.into() {
            Value::Null => self.is_null(),
            value => self.compare(CompareOp::Eq, value),
        }
    }

    /// Inequality; comparing with a null value becomes `IS NOT NULL`
    pub fn ne(&self, value: impl Into<Value>) -> Predicate<T> {
        match value.into() {
            Value::Null => self.is_not_null(),
            value => self.compare(CompareOp::Ne, value),
        }
    }

    pub fn lt(&self, value: impl Into<Value>) -> Predicate<T> {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn le(&self, value: impl Into<Value>) -> Predicate<T> {
        self.compare(CompareOp::Le, value.into())
    }

    pub fn gt(&self, value: impl Into<Value>) -> Predicate<T> {
        self.compare(CompareOp::Gt, value.into())
    }

    pub fn ge(&self, value: impl Into<Value>) -> Predicate<T> {
        self.compare(CompareOp::Ge, value.into())
    }

    /// SQL `LIKE` with `%` and `_` wildcards
    pub fn like(&self, pattern: impl Into<String>) -> Predicate<T> {
        self.compare(CompareOp::Like, Value::Text(pattern.into()))
    }

    pub fn is_null(&self) -> Predicate<T> {
        Predicate::new(Expr::IsNull {
            column: self.name.clone(),
            negated: false,
        })
    }

    pub fn is_not_null(&self) -> Predicate<T> {
        Predicate::new(Expr::IsNull {
            column: self.name.clone(),
            negated: true,
        })
    }

    /// Membership test; an empty list matches nothing
    pub fn in_list<I, V>(&self, values: I) -> Predicate<T>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::new(Expr::InList {
            column: self.name.clone(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    fn aggregate(&self, func: AggregateFn, alias: impl Into<String>) -> Aggregate<T> {
        Aggregate {
            func,
            column: self.name.clone(),
            alias: alias.into(),
            _model: PhantomData,
        }
    }

    /// Count of non-null values, reported under `alias`
    pub fn count(&self, alias: impl Into<String>) -> Aggregate<T> {
        self.aggregate(AggregateFn::Count, alias)
    }

    pub fn sum(&self, alias: impl Into<String>) -> Aggregate<T> {
        self.aggregate(AggregateFn::Sum, alias)
    }

    pub fn min(&self, alias: impl Into<String>) -> Aggregate<T> {
        self.aggregate(AggregateFn::Min, alias)
    }

    pub fn max(&self, alias: impl Into<String>) -> Aggregate<T> {
        self.aggregate(AggregateFn::Max, alias)
    }

    pub fn avg(&self, alias: impl Into<String>) -> Aggregate<T> {
        self.aggregate(AggregateFn::Avg, alias)
    }

    pub fn asc(&self) -> Ordering<T> {
        Ordering {
            column: self.name.clone(),
            descending: false,
            _model: PhantomData,
        }
    }

    pub fn desc(&self) -> Ordering<T> {
        Ordering {
            column: self.name.clone(),
            descending: true,
            _model: PhantomData,
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Column").field(&self.name).finish()
    }
}

/// Boolean condition over the columns of `T`
pub struct Predicate<T> {
    expr: Expr,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> Predicate<T> {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            _model: PhantomData,
        }
    }

    pub fn and(self, other: Predicate<T>) -> Self {
        Self::new(Expr::And(Box::new(self.expr), Box::new(other.expr)))
    }

    pub fn or(self, other: Predicate<T>) -> Self {
        Self::new(Expr::Or(Box::new(self.expr), Box::new(other.expr)))
    }

    pub fn negate(self) -> Self {
        Self::new(Expr::Not(Box::new(self.expr)))
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Rows of `T` matching this predicate
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for a column `T` does not declare, plus whatever
    /// the executor reports.
    pub fn query<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Rows> {
        Select::records().filter(self.clone()).query(executor)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

impl<T: Model> std::ops::BitAnd for Predicate<T> {
    type Output = Predicate<T>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<T: Model> std::ops::BitOr for Predicate<T> {
    type Output = Predicate<T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: Model> std::ops::Not for Predicate<T> {
    type Output = Predicate<T>;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

/// Aggregate over one column of `T`, reported under an alias
pub struct Aggregate<T> {
    pub(crate) func: AggregateFn,
    pub(crate) column: String,
    pub(crate) alias: String,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> Aggregate<T> {
    pub fn func(&self) -> AggregateFn {
        self.func
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// One row holding the aggregate value under its alias
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for an undeclared column and
    /// `InvalidIdentifier` for an alias that is not a plain identifier.
    pub fn query<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Rows> {
        Select::aggregate(self.clone()).query(executor)
    }
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Self {
            func: self.func,
            column: self.column.clone(),
            alias: self.alias.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Aggregate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregate")
            .field("func", &self.func)
            .field("column", &self.column)
            .field("alias", &self.alias)
            .finish()
    }
}

/// Sort key for a select
pub struct Ordering<T> {
    pub(crate) column: String,
    pub(crate) descending: bool,
    _model: PhantomData<fn() -> T>,
}

impl<T> Ordering<T> {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }
}

impl<T> Clone for Ordering<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            descending: self.descending,
            _model: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Ordering<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ordering")
            .field("column", &self.column)
            .field("descending", &self.descending)
            .finish()
    }
}
