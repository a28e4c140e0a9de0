use super::*;
use crate::predicate::CompareOp;
use crate::schema::Attribute;
use crate::value::{DataType, Value};
use tempfile::tempdir;

fn path(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn schema() -> Schema {
    Schema::new(
        vec![
            Attribute::new("a", DataType::Int),
            Attribute::new("b", DataType::String(4)),
        ],
        &["a"],
    )
    .unwrap()
}

fn record(a: i32, b: &str) -> Record {
    let schema = schema();
    let mut record = Record::new(&schema);
    record.set_attr(&schema, 0, &Value::Int(a)).unwrap();
    record.set_attr(&schema, 1, &Value::Str(b.into())).unwrap();
    record
}

#[test]
fn create_then_open_recovers_schema() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();

    let table = TableHandle::open(&name).unwrap();
    assert_eq!(*table.schema(), schema());
    table.close().unwrap();
}

#[test]
fn insert_and_get_round_trip() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    let rid1 = table.insert_record(&record(1, "abcd")).unwrap();
    let rid2 = table.insert_record(&record(2, "efgh")).unwrap();

    assert_eq!(table.get_num_tuples().unwrap(), 2);
    assert_eq!(table.get_record(rid1).unwrap(), record(1, "abcd"));
    assert_eq!(table.get_record(rid2).unwrap(), record(2, "efgh"));

    table.close().unwrap();
}

#[test]
fn delete_then_get_fails_and_decrements_count() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    let rid = table.insert_record(&record(1, "abcd")).unwrap();
    table.delete_record(rid).unwrap();

    assert_eq!(table.get_num_tuples().unwrap(), 0);
    let err = table.get_record(rid).unwrap_err();
    assert!(matches!(err, DbError::RecordNotExist));

    table.close().unwrap();
}

#[test]
fn delete_twice_fails() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    let rid = table.insert_record(&record(1, "abcd")).unwrap();
    table.delete_record(rid).unwrap();
    let err = table.delete_record(rid).unwrap_err();
    assert!(matches!(err, DbError::RecordNotExist));

    table.close().unwrap();
}

#[test]
fn update_overwrites_in_place() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    let rid = table.insert_record(&record(1, "abcd")).unwrap();
    table.update_record(rid, &record(1, "wxyz").data).unwrap();

    assert_eq!(table.get_record(rid).unwrap(), record(1, "wxyz"));
    table.close().unwrap();
}

#[test]
fn scan_with_predicate_returns_matches_then_exhausts() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    table.insert_record(&record(1, "abcd")).unwrap();
    table.insert_record(&record(2, "efgh")).unwrap();

    let mut scan = table.start_scan(Predicate::Compare {
        attr_idx: 0,
        op: CompareOp::Gt,
        value: Value::Int(1),
    });

    let hit = table.next(&mut scan).unwrap();
    assert_eq!(hit, record(2, "efgh"));

    let err = table.next(&mut scan).unwrap_err();
    assert!(matches!(err, DbError::NoMoreTuples));
    table.close_scan(scan);

    table.close().unwrap();
}

#[test]
fn scan_true_predicate_visits_every_live_record() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    for i in 0..5 {
        table.insert_record(&record(i, "abcd")).unwrap();
    }

    let mut scan = table.start_scan(Predicate::True);
    let mut seen = Vec::new();
    loop {
        match table.next(&mut scan) {
            Ok(r) => seen.push(r.get_attr(&schema(), 0).unwrap()),
            Err(DbError::NoMoreTuples) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(seen.len(), 5);

    table.close().unwrap();
}

#[test]
fn insert_beyond_one_page_allocates_more_data_pages() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    // slots_per_page is 16 with the default slot size; insert enough
    // records to fill several data pages.
    let mut rids = Vec::new();
    for i in 0..64 {
        rids.push(table.insert_record(&record(i, "abcd")).unwrap());
    }
    assert_eq!(table.get_num_tuples().unwrap(), 64);

    let distinct_pages: std::collections::HashSet<_> = rids.iter().map(|r| r.page).collect();
    assert!(distinct_pages.len() > 1);

    for (i, rid) in rids.iter().enumerate() {
        assert_eq!(table.get_record(*rid).unwrap(), record(i as i32, "abcd"));
    }

    table.close().unwrap();
}

#[test]
fn insert_reuses_a_non_tail_deleted_slot_without_touching_other_records() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    let mut table = TableHandle::open(&name).unwrap();

    let mut rids = Vec::new();
    for i in 0..16 {
        rids.push(table.insert_record(&record(i, "abcd")).unwrap());
    }
    assert_eq!(table.get_num_tuples().unwrap(), 16);

    // Delete a slot in the middle of the page, not the last one inserted.
    let deleted_rid = rids[5];
    table.delete_record(deleted_rid).unwrap();
    assert_eq!(table.get_num_tuples().unwrap(), 15);

    // Every other record must still be intact and at its original RID.
    for (i, rid) in rids.iter().enumerate() {
        if i == 5 {
            continue;
        }
        assert_eq!(table.get_record(*rid).unwrap(), record(i as i32, "abcd"));
    }

    // The next insert must reclaim the deleted slot, not overwrite a live one.
    let new_rid = table.insert_record(&record(99, "wxyz")).unwrap();
    assert_eq!(new_rid, deleted_rid);
    assert_eq!(table.get_record(new_rid).unwrap(), record(99, "wxyz"));
    assert_eq!(table.get_num_tuples().unwrap(), 16);

    // The record after the hole (slot 6) must be untouched.
    assert_eq!(table.get_record(rids[6]).unwrap(), record(6, "abcd"));

    table.close().unwrap();
}

#[test]
fn delete_table_removes_backing_file() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    create_table(&name, &schema()).unwrap();
    delete_table(&name).unwrap();
    assert!(!std::path::Path::new(&name).exists());
}

/// A schema with enough attributes that its ASCII serialization overflows
/// page 0's remaining bytes, forcing it to spill onto further header pages.
fn wide_schema() -> Schema {
    let attrs: Vec<Attribute> = (0..450)
        .map(|i| Attribute::new(format!("c{i}"), DataType::Int))
        .collect();
    Schema::new(attrs, &["c0"]).unwrap()
}

#[test]
fn create_then_open_recovers_a_schema_spilling_across_header_pages() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "wide.tbl");
    let schema = wide_schema();
    assert!(
        schema.to_string().len() > PAGE_SIZE - HEADER_BYTES,
        "fixture schema must actually need more than one header page"
    );

    create_table(&name, &schema).unwrap();

    let mut raw = pagefile::PageFileHandle::open(&name).unwrap();
    assert!(
        raw.total_pages() > 2,
        "expected schema spill onto extra header pages, got {} total pages",
        raw.total_pages()
    );
    raw.close();

    let table = TableHandle::open(&name).unwrap();
    assert_eq!(*table.schema(), schema);
    table.close().unwrap();
}
