use super::*;
use crate::value::{StrData, Value};

fn heap_string(text: &'static str) -> Heap<StrData> {
    match Value::string_static(text) {
        Value::Str(heap) => heap,
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn test_heap_deref() {
    let h = heap_string("hello");
    assert_eq!(h.as_bytes(), b"hello");
}

#[test]
fn test_heap_clone_shares_allocation() {
    let h1 = heap_string("abc");
    let h2 = h1.clone();
    assert!(Heap::ptr_eq(&h1, &h2));
    assert_eq!(Heap::ref_count(&h1), 2);
    drop(h2);
    assert_eq!(Heap::ref_count(&h1), 1);
}

#[test]
fn test_header_carries_kind() {
    let h = heap_string("x");
    let ptr = Heap::as_raw(&h);
    // SAFETY: `h` keeps the allocation alive
    let kind = unsafe { header_kind(ptr) };
    assert_eq!(kind, Kind::Str as u8);
}

#[test]
fn test_raw_round_trip_keeps_count() {
    let h = heap_string("round");
    let keep = h.clone();
    let ptr = Heap::into_raw(h);
    // SAFETY: `keep` holds the allocation alive; `ptr` owns one reference
    unsafe {
        assert_eq!(Heap::<StrData>::count_raw(ptr), 2);
        Heap::<StrData>::increment_raw(ptr);
        assert_eq!(Heap::ref_count(&keep), 3);
        Heap::<StrData>::decrement_raw(ptr);
        let back = Heap::<StrData>::from_raw(ptr);
        assert!(Heap::ptr_eq(&back, &keep));
    }
    assert_eq!(Heap::ref_count(&keep), 1);
}
