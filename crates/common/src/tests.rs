use super::*;

#[test]
fn rid_equality_is_by_value() {
    let a = Rid::new(1, 256);
    let b = Rid::new(1, 256);
    let c = Rid::new(1, 257);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn error_messages_are_human_readable() {
    assert_eq!(format!("{}", DbError::NonExistingPage(5)), "page 5 does not exist");
    assert_eq!(
        format!("{}", DbError::ShutdownFailed(2)),
        "shutdown failed: 2 frame(s) still pinned"
    );
}
