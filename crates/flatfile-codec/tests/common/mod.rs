//! Record types shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use flatfile_codec::{Conversion, FieldLayout, FlatRecord, LineMode, RecordDescription};
use rust_decimal::Decimal;

/// Sequential record: id(5) name(20) birth date(8, yyyyMMdd) salary(10, 2 places).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
    pub salary: Decimal,
}

impl FlatRecord for Person {
    fn describe() -> RecordDescription<Self> {
        RecordDescription::<Self>::new("Person")
            .mode(LineMode::Sequential)
            .field("id", FieldLayout::sequential(1, 5), |p| &p.id, |p| &mut p.id)
            .field("name", FieldLayout::sequential(6, 20), |p| &p.name, |p| &mut p.name)
            .field_with(
                "birth_date",
                FieldLayout::sequential(26, 8),
                Conversion::exact("yyyyMMdd"),
                |p| &p.birth_date,
                |p| &mut p.birth_date,
            )
            .field_with(
                "salary",
                FieldLayout::sequential(34, 10),
                Conversion::scaled(2),
                |p| &p.salary,
                |p| &mut p.salary,
            )
    }
}

pub const JOHN: &str = "00001John Doe            202101010000012345";
pub const JANE: &str = "00002Jane Roe            199912310000500000";
pub const MAX: &str = "00003Max Mustermann      198002290000000001";

pub fn john() -> Person {
    Person {
        id: 1,
        name: "John Doe            ".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date"),
        salary: Decimal::new(12345, 2),
    }
}

/// Positional record reading three slices out of a wider line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shipment {
    pub carrier: String,
    pub weight: u32,
    pub shipped: NaiveDate,
}

impl FlatRecord for Shipment {
    fn describe() -> RecordDescription<Self> {
        RecordDescription::<Self>::new("Shipment")
            .mode(LineMode::Positional)
            .field("carrier", FieldLayout::positional(0, 6), |s| &s.carrier, |s| &mut s.carrier)
            .field_with(
                "shipped",
                FieldLayout::positional(12, 10),
                Conversion::exact("yyyy-MM-dd"),
                |s| &s.shipped,
                |s| &mut s.shipped,
            )
            .field("weight", FieldLayout::positional(7, 4), |s| &s.weight, |s| &mut s.weight)
    }
}

/// Install a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
