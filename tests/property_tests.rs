/// Property-based tests using proptest
/// Tests invariants of header normalization and cell conversion
use proptest::prelude::*;
use organizations_etl::csv_source::normalize_header;
use organizations_etl::loader::CellValue;
use organizations_etl::schema::ORGANIZATIONS;

proptest! {
    #[test]
    fn normalization_is_idempotent(name in "[ -~]*") {
        let once = normalize_header(&name);
        prop_assert_eq!(normalize_header(&once), once);
    }

    #[test]
    fn header_case_never_changes_column_match(name in "(id|name|address|city|state|zip|lat|lon|phone|revenue|utilization)", upper in proptest::collection::vec(proptest::bool::ANY, 11)) {
        let mixed: String = name
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();
        let column = ORGANIZATIONS.column(&normalize_header(&mixed));
        prop_assert_eq!(column.map(|c| c.name), Some(name.as_str()));
    }
}

// Property: conversion never panics, whatever the column type
proptest! {
    #[test]
    fn cell_parsing_never_panics(raw in "\\PC*") {
        for column in ORGANIZATIONS.columns {
            let _ = CellValue::parse(&raw, column);
        }
    }

    #[test]
    fn integers_parse_exactly(v in any::<i32>()) {
        let zip = ORGANIZATIONS.column("zip").unwrap();
        prop_assert_eq!(CellValue::parse(&v.to_string(), zip), Ok(CellValue::Integer(Some(v))));
    }

    #[test]
    fn coordinates_within_range_are_accepted(whole in -99i32..=99, frac in 0u64..10u64.pow(15)) {
        let lat = ORGANIZATIONS.column("lat").unwrap();
        let raw = format!("{}.{:015}", whole, frac);
        prop_assert!(CellValue::parse(&raw, lat).is_ok());
    }
}
