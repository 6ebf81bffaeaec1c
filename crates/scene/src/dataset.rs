use foundation::geometry::Geometry;

/// One observed event. Missing source cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub timestamp: Option<String>,
}

impl Record {
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            category: Some(category.into()),
            sub_category: Some(sub_category.into()),
            timestamp: Some(timestamp.into()),
        }
    }
}

/// A named region; `name` joins against the record category.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    pub geometry: Geometry,
}

/// Everything the explorer needs, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<R = Record> {
    pub records: Vec<R>,
    pub boundaries: Vec<BoundaryFeature>,
}

impl<R> Dataset<R> {
    pub fn new(records: Vec<R>, boundaries: Vec<BoundaryFeature>) -> Self {
        Self {
            records,
            boundaries,
        }
    }
}

/// Key extraction for the three drill-down dimensions.
///
/// The scene core only ever reads records through this trait, so the record
/// type and its source schema stay a loader concern.
pub trait RecordKeys<R> {
    fn category<'r>(&self, record: &'r R) -> Option<&'r str>;
    fn sub_category<'r>(&self, record: &'r R) -> Option<&'r str>;
    fn timestamp<'r>(&self, record: &'r R) -> Option<&'r str>;
}

/// Reads the fields of [`Record`].
#[derive(Debug, Copy, Clone, Default)]
pub struct RecordFields;

impl RecordKeys<Record> for RecordFields {
    fn category<'r>(&self, record: &'r Record) -> Option<&'r str> {
        record.category.as_deref()
    }

    fn sub_category<'r>(&self, record: &'r Record) -> Option<&'r str> {
        record.sub_category.as_deref()
    }

    fn timestamp<'r>(&self, record: &'r Record) -> Option<&'r str> {
        record.timestamp.as_deref()
    }
}

pub type KeyFn<R> = fn(&R) -> Option<&str>;

/// Key extraction from plain function pointers, for record types that do not
/// warrant a dedicated `RecordKeys` impl.
pub struct KeyFns<R> {
    pub category: KeyFn<R>,
    pub sub_category: KeyFn<R>,
    pub timestamp: KeyFn<R>,
}

impl<R> RecordKeys<R> for KeyFns<R> {
    fn category<'r>(&self, record: &'r R) -> Option<&'r str> {
        (self.category)(record)
    }

    fn sub_category<'r>(&self, record: &'r R) -> Option<&'r str> {
        (self.sub_category)(record)
    }

    fn timestamp<'r>(&self, record: &'r R) -> Option<&'r str> {
        (self.timestamp)(record)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyFns, Record, RecordFields, RecordKeys};

    #[test]
    fn record_fields_expose_optional_columns() {
        let full = Record::new("A", "X", "2020-01-01");
        assert_eq!(RecordFields.category(&full), Some("A"));
        assert_eq!(RecordFields.sub_category(&full), Some("X"));
        assert_eq!(RecordFields.timestamp(&full), Some("2020-01-01"));

        let blank = Record::default();
        assert_eq!(RecordFields.category(&blank), None);
    }

    #[test]
    fn key_fns_dispatch_to_pointers() {
        struct Row(&'static str, &'static str);
        let keys: KeyFns<Row> = KeyFns {
            category: |r| Some(r.0),
            sub_category: |r| Some(r.1),
            timestamp: |_| None,
        };
        let row = Row("north", "theft");
        assert_eq!(keys.category(&row), Some("north"));
        assert_eq!(keys.sub_category(&row), Some("theft"));
        assert_eq!(keys.timestamp(&row), None);
    }
}
