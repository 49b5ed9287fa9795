//! Round trips against real servers. Run with `cargo test -- --ignored`
//! after pointing `CHAMBERS_MONGO_URL` / `CHAMBERS_MYSQL_URL` at a scratch
//! deployment.

use chambers_data::{
    Combinator, Condition, Connection, DataRef, Datum, DbConfig, DriverRegistry, DriverType, Field,
    Value,
};

fn connect(driver: DriverType, var: &str) -> Box<dyn Connection> {
    let url = std::env::var(var).unwrap_or_else(|_| panic!("{var} is not set"));
    DriverRegistry::with_defaults()
        .connect(&DbConfig::with_url(driver, url))
        .unwrap()
}

fn francesco() -> [Condition; 2] {
    [
        Condition::equals("name", "Francesco"),
        Condition::equals("surname", "Torelli"),
    ]
}

fn scratch_name() -> String {
    format!("people_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(feature = "mongodb")]
#[test]
#[ignore]
fn test_mongo_round_trip() {
    let mut conn = connect(DriverType::MongoDb, "CHAMBERS_MONGO_URL");
    let people = DataRef::new("chambers_test", scratch_name());
    let person = |name: &str, age: i64| {
        Value::structure([
            ("name", Value::from(name)),
            ("surname", Value::from("Torelli")),
            ("age", Value::from(age)),
        ])
    };

    conn.create(&people, &[]).unwrap();
    conn.insert(&people, &[], &[person("Francesco", 42), person("Fabrizio", 45)])
        .unwrap();
    let result = conn
        .query(&people, &[], &francesco(), Combinator::And)
        .unwrap();
    assert_eq!(result.lines, 1);
    assert_eq!(result.records[0].values[3], Datum::Int(42));
    assert_eq!(conn.purge(&people).unwrap(), 2);

    conn.drop_entity(&people).unwrap();
    conn.close().unwrap();
}

#[cfg(feature = "mysql")]
#[test]
#[ignore]
fn test_mysql_round_trip() {
    let mut conn = connect(DriverType::MySql, "CHAMBERS_MYSQL_URL");
    let table = scratch_name();
    let people = DataRef::new("", table.as_str());
    let fields = [
        Field::typed("name", "VARCHAR").with_size(64),
        Field::typed("surname", "VARCHAR").with_size(64),
        Field::typed("age", "INT"),
    ];

    conn.create(&people, &fields).unwrap();
    for (name, age) in [("Francesco", 42i64), ("Fabrizio", 45)] {
        conn.insert(
            &people,
            &fields,
            &[Value::from(name), Value::from("Torelli"), Value::from(age)],
        )
        .unwrap();
    }
    let result = conn
        .query(&people, &[], &francesco(), Combinator::And)
        .unwrap();
    assert_eq!(result.lines, 1);
    assert_eq!(
        result.records[0].values,
        vec![
            Datum::Text("Francesco".into()),
            Datum::Text("Torelli".into()),
            Datum::Int(42),
        ]
    );
    assert_eq!(conn.purge(&people).unwrap(), 2);

    conn.drop_entity(&people).unwrap();
    conn.close().unwrap();
}
