//! SQL rendering
//!
//! Every statement is parameterized: values only ever travel as `?` bindings,
//! identifiers are validated at introspection time and double-quoted here.

use crate::introspect::RecordMeta;
use crate::model::{Value, ID_COLUMN};

use super::expr::Expr;

/// A rendered statement with its bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` with the implicit integer primary key
///
/// The key is `AUTOINCREMENT`: ids of deleted rows are never handed out
/// again, so a stale id cannot alias a newer row.
pub fn create_table(meta: &RecordMeta) -> String {
    let mut columns = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_ident(ID_COLUMN)
    )];
    columns.extend(
        meta.fields()
            .iter()
            .map(|f| format!("{} {}", quote_ident(f.name), f.kind.sql_type())),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(meta.table()),
        columns.join(", ")
    )
}

/// Insert of every persisted field, in field order
pub fn insert(meta: &RecordMeta) -> String {
    if meta.fields().is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(meta.table()));
    }
    let names: Vec<String> = meta.field_names().map(quote_ident).collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(meta.table()),
        names.join(", "),
        placeholders
    )
}

/// Update of every persisted field, id bound last
///
/// `None` for a type without persisted fields.
pub fn update(meta: &RecordMeta) -> Option<String> {
    if meta.fields().is_empty() {
        return None;
    }
    let assignments: Vec<String> = meta
        .field_names()
        .map(|name| format!("{} = ?", quote_ident(name)))
        .collect();
    Some(format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(meta.table()),
        assignments.join(", "),
        quote_ident(ID_COLUMN)
    ))
}

pub fn delete_by_id(meta: &RecordMeta) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(meta.table()),
        quote_ident(ID_COLUMN)
    )
}

pub fn exists_by_id(meta: &RecordMeta) -> String {
    format!(
        "SELECT 1 FROM {} WHERE {} = ?",
        quote_ident(meta.table()),
        quote_ident(ID_COLUMN)
    )
}

/// Ids of the rows matching `filter`
pub fn select_ids(meta: &RecordMeta, filter: &Expr) -> Statement {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE ",
        quote_ident(ID_COLUMN),
        quote_ident(meta.table())
    );
    let mut params = Vec::new();
    render_expr(filter, &mut sql, &mut params);
    Statement::new(sql, params)
}

pub fn delete_where(meta: &RecordMeta, filter: &Expr) -> Statement {
    let mut sql = format!("DELETE FROM {} WHERE ", quote_ident(meta.table()));
    let mut params = Vec::new();
    render_expr(filter, &mut sql, &mut params);
    Statement::new(sql, params)
}

/// Append `expr` to `sql`, pushing its values onto `params`
pub fn render_expr(expr: &Expr, sql: &mut String, params: &mut Vec<Value>) {
    match expr {
        Expr::Compare { column, op, value } => {
            sql.push_str(&quote_ident(column));
            sql.push(' ');
            sql.push_str(op.sql());
            sql.push_str(" ?");
            params.push(value.clone());
        }
        Expr::IsNull { column, negated } => {
            sql.push_str(&quote_ident(column));
            sql.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Expr::InList { values, .. } if values.is_empty() => {
            sql.push('0');
        }
        Expr::InList { column, values } => {
            sql.push_str(&quote_ident(column));
            sql.push_str(" IN (");
            sql.push_str(&vec!["?"; values.len()].join(", "));
            sql.push(')');
            params.extend(values.iter().cloned());
        }
        Expr::And(a, b) => render_binary(a, "AND", b, sql, params),
        Expr::Or(a, b) => render_binary(a, "OR", b, sql, params),
        Expr::Not(inner) => {
            sql.push_str("NOT (");
            render_expr(inner, sql, params);
            sql.push(')');
        }
    }
}

fn render_binary(a: &Expr, op: &str, b: &Expr, sql: &mut String, params: &mut Vec<Value>) {
    sql.push('(');
    render_expr(a, sql, params);
    sql.push(' ');
    sql.push_str(op);
    sql.push(' ');
    render_expr(b, sql, params);
    sql.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::CompareOp;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_render_nested_expression() {
        let expr = Expr::Or(
            Box::new(Expr::And(
                Box::new(Expr::Compare {
                    column: "a".into(),
                    op: CompareOp::Gt,
                    value: Value::Integer(1),
                }),
                Box::new(Expr::IsNull {
                    column: "b".into(),
                    negated: true,
                }),
            )),
            Box::new(Expr::Not(Box::new(Expr::InList {
                column: "c".into(),
                values: vec![Value::from("x"), Value::from("y")],
            }))),
        );

        let mut sql = String::new();
        let mut params = Vec::new();
        render_expr(&expr, &mut sql, &mut params);

        assert_eq!(
            sql,
            "((\"a\" > ? AND \"b\" IS NOT NULL) OR NOT (\"c\" IN (?, ?)))"
        );
        assert_eq!(
            params,
            vec![Value::Integer(1), Value::from("x"), Value::from("y")]
        );
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let expr = Expr::InList {
            column: "c".into(),
            values: vec![],
        };
        let mut sql = String::new();
        let mut params = Vec::new();
        render_expr(&expr, &mut sql, &mut params);
        assert_eq!(sql, "0");
        assert!(params.is_empty());
    }
}
