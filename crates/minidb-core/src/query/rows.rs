use crate::model::{RowId, Value, ID_COLUMN};

/// One result row: named values in select order
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    values: Vec<(String, Value)>,
}

impl ResultRow {
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// The row id, when `id` was selected
    pub fn id(&self) -> Option<RowId> {
        self.get(ID_COLUMN).and_then(Value::as_integer)
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    pub fn into_values(self) -> Vec<(String, Value)> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Single-pass sequence of result rows
///
/// Rows are fetched from the engine when the query runs; consuming the
/// sequence cannot be undone, run the query again for a fresh pass.
#[derive(Debug)]
pub struct Rows {
    inner: std::vec::IntoIter<ResultRow>,
}

impl Rows {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self {
            inner: rows.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for Rows {
    type Item = ResultRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Rows {}
