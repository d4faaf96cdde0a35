//! Checks that hold return normally and evaluate operands once.

use crate::assert::{Location, prefix};
use std::cell::Cell;

#[test]
fn integer_family_passes() {
    crate::check_eq!(2 + 2, 4);
    crate::check_ne!(1, 2);
    crate::check_lt!(-5_i32, 0_u8);
    crate::check_le!(3, 3);
    crate::check_gt!(10_usize, 9);
    crate::check_ge!(i64::MIN, i64::MIN);
    crate::check_ok!(0);
}

#[test]
fn unsigned_family_passes() {
    crate::check_u64_eq!(u64::MAX, u64::MAX);
    crate::check_u64_ne!(0, 1);
    crate::check_u64_lt!(1, u64::MAX);
    crate::check_u64_le!(7_u8, 7_u32);
    crate::check_u64_gt!(2, 1);
    crate::check_u64_ge!(2, 2);
}

#[test]
fn float_family_passes() {
    crate::check_f64_eq!(0.5 + 0.25, 0.75);
    crate::check_f64_ne!(f64::NAN, f64::NAN);
    crate::check_f64_lt!(1, 1.5);
    crate::check_f64_le!(2.0_f32, 2);
    crate::check_f64_gt!(3.5, 3);
    crate::check_f64_ge!(-0.0, 0.0);
}

#[test]
fn string_family_passes() {
    let owned = String::from("hello");
    crate::check_str_eq!(owned.as_str(), "hello");
    crate::check_str_eq!(&owned, owned.as_str());
    crate::check_str_eq!(owned, String::from("hello"));
    crate::check_str_ne!("hello", "Hello");
    crate::check_str_ne!("", " ");
}

#[test]
fn memory_families_compare_only_size_bytes() {
    crate::check_mem_eq!(b"abcdef", b"abcxyz", 3);
    crate::check_mem_ne!(b"abcdef", b"abcxyz", 4);
    crate::check_mem_hex_eq!([0x01_u8, 0x02, 0x03, 0xFF], vec![0x01_u8, 0x02, 0x03, 0x00], 3);
    crate::check_mem_hex_ne!(&[0x01_u8, 0x02][..], [0x01_u8, 0x03], 2);
    crate::check_mem_eq!("any", "thing", 0);
}

#[test]
fn memory_size_accepts_any_integer_type() {
    let header = [0xCA_u8, 0xFE, 0x01, 0x02];
    let len_u32: u32 = 2;
    let len_i32: i32 = 3;
    let len_u8: u8 = 4;
    crate::check_mem_hex_eq!(header, [0xCA_u8, 0xFE, 0xFF, 0xFF], len_u32);
    crate::check_mem_eq!(header, header, len_i32);
    crate::check_mem_hex_ne!(header, [0xCA_u8, 0xFE, 0x01, 0x03], len_u8);
    crate::check_mem_eq!(b"abc", b"abd", 2_u64);
}

#[test]
fn pointer_family_passes() {
    let values = [1_u32, 2];
    let first = &values[0];
    let second = &values[1];

    crate::check_null!(std::ptr::null::<u8>());
    crate::check_null!(None::<&u32>);
    crate::check_not_null!(first as *const u32);
    crate::check_not_null!(Some(first));
    crate::check_ptr_eq!(first, &values[0]);
    crate::check_ptr_ne!(first, second);
    crate::check_ptr_lt!(first, second);
}

#[test]
fn boolean_check_passes() {
    let queue: Vec<u8> = Vec::new();
    crate::check!(queue.is_empty());
    crate::check!(1 < 2,);
}

#[test]
fn operands_are_evaluated_once() {
    let calls = Cell::new(0);
    let next = || {
        calls.set(calls.get() + 1);
        calls.get()
    };

    crate::check_eq!(next(), 1);
    assert_eq!(calls.get(), 1);

    crate::check_lt!(next(), next());
    assert_eq!(calls.get(), 3);

    crate::check_u64_ge!(next(), 4);
    crate::check_f64_gt!(next(), 4);
    assert_eq!(calls.get(), 5);

    let bytes = || {
        calls.set(calls.get() + 1);
        vec![1_u8, 2, 3]
    };
    crate::check_mem_hex_eq!(bytes(), bytes(), 3);
    assert_eq!(calls.get(), 7);

    let text = || {
        calls.set(calls.get() + 1);
        String::from("x")
    };
    crate::check_str_eq!(text(), text());
    assert_eq!(calls.get(), 9);

    let flag = || {
        calls.set(calls.get() + 1);
        true
    };
    crate::check!(flag());
    assert_eq!(calls.get(), 10);
}

#[test]
fn prefix_returns_leading_bytes() {
    let here = Location::new(file!(), line!());
    assert_eq!(prefix(here, "buf", b"abcdef", 3), b"abc");
    assert_eq!(prefix(here, "buf", b"abc", 3), b"abc");
    assert_eq!(prefix(here, "buf", b"", 0), b"");
}
