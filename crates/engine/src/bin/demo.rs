//! Minimal driver proving the layers compose: create a table, insert a
//! few records, scan them back, print the result. Stands in for the
//! out-of-scope CLI/test harness; not a parsed CLI.

use engine::{create_table, Attribute, DataType, Predicate, Record, Schema, TableHandle, Value};

fn main() -> engine::DbResult<()> {
    let path = std::env::temp_dir().join(format!("engine-demo-{}.tbl", std::process::id()));
    let path = path.to_string_lossy().into_owned();

    let schema = Schema::new(
        vec![
            Attribute::new("id", DataType::Int),
            Attribute::new("name", DataType::String(16)),
        ],
        &["id"],
    )?;

    create_table(&path, &schema)?;
    let mut table = TableHandle::open(&path)?;

    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        let mut record = Record::new(&schema);
        record.set_attr(&schema, 0, &Value::Int(id))?;
        record.set_attr(&schema, 1, &Value::Str(name.to_string()))?;
        table.insert_record(&record)?;
    }

    println!("inserted {} tuples", table.get_num_tuples()?);

    let mut scan = table.start_scan(Predicate::Compare {
        attr_idx: 0,
        op: engine::CompareOp::Gt,
        value: Value::Int(1),
    });
    loop {
        match table.next(&mut scan) {
            Ok(record) => {
                let id = record.get_attr(&schema, 0)?;
                let name = record.get_attr(&schema, 1)?;
                println!("{id:?} {name:?}");
            }
            Err(engine::DbError::NoMoreTuples) => break,
            Err(e) => return Err(e),
        }
    }
    table.close_scan(scan);
    table.close()?;

    engine::delete_table(&path)?;
    Ok(())
}
