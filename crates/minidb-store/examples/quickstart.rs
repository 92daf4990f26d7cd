//! Quickstart
//!
//! Declares a record type, stores a hundred rows and reads them back through
//! the query builder and materializers.
//!
//! Run with `cargo run -p minidb-store --example quickstart`.

use minidb_core::{
    Attribute, ColumnValue, Declared, Instance, MinidbError, Model, RowId, Select, Value,
};
use minidb_store::{InstanceStoreExt, ModelStoreExt, Store, StoreConfig};

#[derive(Debug)]
struct Reading {
    id: Option<RowId>,
    sensor: Option<String>,
    value: Option<f64>,
    // Not persisted
    unit: &'static str,
}

impl Declared for Reading {
    fn attributes() -> Vec<Attribute> {
        vec![Attribute::text("sensor"), Attribute::real("value")]
    }
}

impl Model for Reading {
    type Args = &'static str;

    fn construct(unit: &'static str) -> Self {
        Self {
            id: None,
            sensor: None,
            value: None,
            unit,
        }
    }

    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn column(&self, name: &str) -> Option<Value> {
        match name {
            "sensor" => Some(self.sensor.to_value()),
            "value" => Some(self.value.to_value()),
            _ => None,
        }
    }

    fn set_column(&mut self, name: &str, value: Value) -> Result<(), MinidbError> {
        match name {
            "sensor" => self.sensor = ColumnValue::from_value(name, value)?,
            "value" => self.value = ColumnValue::from_value(name, value)?,
            _ => {
                return Err(MinidbError::UnknownField {
                    type_name: Self::type_name().to_string(),
                    field: name.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(StoreConfig::in_memory().with_autoregister(true))?;

    store.transaction(|tx| {
        for i in 0..100 {
            let reading = Instance::<Reading>::construct("C");
            reading.assign([
                ("sensor", Value::from(if i % 2 == 0 { "north" } else { "south" })),
                ("value", Value::from(f64::from(i) / 4.0)),
            ])?;
            reading.save(tx)?;
        }
        Ok(())
    })?;
    println!("stored {} readings", store.count::<Reading>(None)?);

    let warm = Reading::load_where(
        &store,
        Select::records()
            .filter(Reading::c("value").ge(20.0))
            .order_by(Reading::c("value").desc())
            .limit(3),
    )?;
    for reading in warm.call("C") {
        let reading = reading?;
        let record = reading.read();
        println!(
            "#{:?} {:?}: {:?} {}",
            record.id(),
            record.sensor,
            record.value,
            record.unit
        );
    }

    let per_sensor = Select::<Reading>::aggregate(Reading::c("value").avg("mean"))
        .group_by("sensor")
        .query(&store)?;
    for row in per_sensor {
        println!("{:?}", row.values());
    }

    store.close()?;
    Ok(())
}
