//! End-to-end scenarios spanning the page file, buffer pool, and record
//! manager layers together, matching the scenarios the spec lays out.

use engine::{
    create_table, Attribute, CompareOp, DataType, DbError, PageFileHandle, Predicate, Record,
    ReplacementStrategy, Schema, TableHandle, Value, BufferPool, PAGE_SIZE,
};
use tempfile::tempdir;

fn path(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn e1_page_create_read_back() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();

    let mut handle = PageFileHandle::open(&name).unwrap();
    assert_eq!(handle.total_pages(), 1);

    let mut buf = vec![0xFFu8; PAGE_SIZE];
    handle.read(0, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn e2_write_extends_file() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();
    let mut handle = PageFileHandle::open(&name).unwrap();

    let payload = vec![5u8; PAGE_SIZE];
    handle.write(2, &payload).unwrap();

    assert_eq!(handle.total_pages(), 3);
    let mut zero = vec![0u8; PAGE_SIZE];
    handle.read(0, &mut zero).unwrap();
    assert!(zero.iter().all(|&b| b == 0));
    handle.read(1, &mut zero).unwrap();
    assert!(zero.iter().all(|&b| b == 0));

    let mut read_back = vec![0u8; PAGE_SIZE];
    handle.read(2, &mut read_back).unwrap();
    assert_eq!(read_back, payload);
}

#[test]
fn e3_fifo_eviction_order() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();
    PageFileHandle::open(&name).unwrap().ensure_capacity(5).unwrap();

    let mut pool = BufferPool::init(&name, 3, ReplacementStrategy::Fifo).unwrap();
    for page in [1, 2, 3] {
        let h = pool.pin_page(page).unwrap();
        pool.unpin_page(&h);
    }
    let h4 = pool.pin_page(4).unwrap();
    pool.unpin_page(&h4);

    assert_eq!(pool.frame_contents(), vec![4, 2, 3]);
    assert_eq!(pool.num_read_io(), 4);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn e4_lru_eviction_order() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();
    PageFileHandle::open(&name).unwrap().ensure_capacity(5).unwrap();

    let mut pool = BufferPool::init(&name, 3, ReplacementStrategy::Lru).unwrap();
    for page in [1, 2, 3] {
        let h = pool.pin_page(page).unwrap();
        pool.unpin_page(&h);
    }
    let h1 = pool.pin_page(1).unwrap();
    pool.unpin_page(&h1);
    let h4 = pool.pin_page(4).unwrap();
    pool.unpin_page(&h4);

    assert_eq!(pool.frame_contents(), vec![1, 4, 3]);
}

#[test]
fn e5_dirty_write_back_on_eviction() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();
    PageFileHandle::open(&name).unwrap().ensure_capacity(3).unwrap();

    let mut pool = BufferPool::init(&name, 1, ReplacementStrategy::Fifo).unwrap();
    let h5 = pool.pin_page(1).unwrap();
    pool.page_data_mut(&h5)[0] = 42;
    pool.mark_dirty(&h5).unwrap();
    pool.unpin_page(&h5);

    let h6 = pool.pin_page(2).unwrap();
    pool.unpin_page(&h6);

    assert_eq!(pool.num_write_io(), 1);

    let mut raw = PageFileHandle::open(&name).unwrap();
    let mut buf = vec![0u8; PAGE_SIZE];
    raw.read(1, &mut buf).unwrap();
    assert_eq!(buf[0], 42);
}

#[test]
fn e6_shutdown_with_pinned_frame_fails_then_recovers() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "t.bin");
    PageFileHandle::create(&name).unwrap();
    PageFileHandle::open(&name).unwrap().ensure_capacity(2).unwrap();

    let mut pool = BufferPool::init(&name, 2, ReplacementStrategy::Fifo).unwrap();
    let h0 = pool.pin_page(0).unwrap();

    let err = pool.shutdown().unwrap_err();
    assert!(matches!(err, DbError::ShutdownFailed(1)));

    pool.unpin_page(&h0);
    pool.shutdown().unwrap();
}

fn order_schema() -> Schema {
    Schema::new(
        vec![
            Attribute::new("a", DataType::Int),
            Attribute::new("b", DataType::String(4)),
        ],
        &["a"],
    )
    .unwrap()
}

#[test]
fn e7_record_insert_retrieve() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    let schema = order_schema();
    create_table(&name, &schema).unwrap();

    let mut table = TableHandle::open(&name).unwrap();

    let mut rec1 = Record::new(&schema);
    rec1.set_attr(&schema, 0, &Value::Int(1)).unwrap();
    rec1.set_attr(&schema, 1, &Value::Str("abcd".into())).unwrap();
    let rid1 = table.insert_record(&rec1).unwrap();

    let mut rec2 = Record::new(&schema);
    rec2.set_attr(&schema, 0, &Value::Int(2)).unwrap();
    rec2.set_attr(&schema, 1, &Value::Str("efgh".into())).unwrap();
    table.insert_record(&rec2).unwrap();

    assert_eq!(table.get_num_tuples().unwrap(), 2);

    let fetched = table.get_record(rid1).unwrap();
    assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Int(1));
    assert_eq!(fetched.get_attr(&schema, 1).unwrap(), Value::Str("abcd".into()));

    table.close().unwrap();
}

#[test]
fn e8_scan_filter_then_exhausts() {
    let dir = tempdir().unwrap();
    let name = path(&dir, "r.tbl");
    let schema = order_schema();
    create_table(&name, &schema).unwrap();

    let mut table = TableHandle::open(&name).unwrap();
    for (a, b) in [(1, "abcd"), (2, "efgh")] {
        let mut record = Record::new(&schema);
        record.set_attr(&schema, 0, &Value::Int(a)).unwrap();
        record.set_attr(&schema, 1, &Value::Str(b.into())).unwrap();
        table.insert_record(&record).unwrap();
    }

    let mut scan = table.start_scan(Predicate::Compare {
        attr_idx: 0,
        op: CompareOp::Gt,
        value: Value::Int(1),
    });

    let hit = table.next(&mut scan).unwrap();
    assert_eq!(hit.get_attr(&schema, 0).unwrap(), Value::Int(2));

    let err = table.next(&mut scan).unwrap_err();
    assert!(matches!(err, DbError::NoMoreTuples));

    table.close_scan(scan);
    table.close().unwrap();
}
