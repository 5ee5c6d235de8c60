/// Integration tests for the feature encoder
///
/// Run with: cargo test --test encoder_tests -- --nocapture

use chrono::{Month, Weekday};
use fare_predictor::encoder::{
    encode, month_from_name, parse_timestamp, weekday_from_name, FeatureVector, RawTripInput,
    TimeOfDay, FEATURE_COUNT, FEATURE_NAMES,
};
use fare_predictor::{EncodeError, ParseError, ValidationError};

const TOD: std::ops::Range<usize> = 2..6;
const MONTHS: std::ops::Range<usize> = 6..18;
const DAYS: std::ops::Range<usize> = 18..25;

fn value(fv: &FeatureVector, name: &str) -> f32 {
    fv.named()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
        .unwrap_or_else(|| panic!("no column {name}"))
}

fn bucket_at(ts: &str) -> TimeOfDay {
    encode(ts, 1.0, 1).expect("encode").time_of_day
}

#[test]
fn test_every_hour_has_exactly_one_bucket() {
    println!("\n=== Test: Time-of-Day Partition ===");
    for hour in 0..24 {
        let fv = encode(&format!("2024-03-05 {:02}:30", hour), 1.0, 1).unwrap();
        let v = fv.to_vec();
        let set: Vec<f32> = v[TOD].to_vec();
        assert_eq!(set.iter().sum::<f32>(), 1.0, "hour {hour}: {set:?}");
        assert!(set.iter().all(|x| *x == 0.0 || *x == 1.0));
        println!("  {:02}h -> {}", hour, fv.time_of_day.column());
    }
    println!("✓ 24 hours, one bucket each");
}

#[test]
fn test_bucket_boundaries() {
    println!("\n=== Test: Bucket Boundaries ===");
    assert_eq!(bucket_at("2024-03-05 05:59"), TimeOfDay::Nighttime);
    assert_eq!(bucket_at("2024-03-05 06:00"), TimeOfDay::AmRush);
    assert_eq!(bucket_at("2024-03-05 09:59"), TimeOfDay::AmRush);
    assert_eq!(bucket_at("2024-03-05 10:00"), TimeOfDay::Daytime);
    assert_eq!(bucket_at("2024-03-05 15:59"), TimeOfDay::Daytime);
    assert_eq!(bucket_at("2024-03-05 16:00"), TimeOfDay::PmRush);
    assert_eq!(bucket_at("2024-03-05 19:59"), TimeOfDay::PmRush);
    assert_eq!(bucket_at("2024-03-05 20:00"), TimeOfDay::Nighttime);
    assert_eq!(bucket_at("2024-03-05 23:00"), TimeOfDay::Nighttime);
    assert_eq!(bucket_at("2024-03-05 00:00"), TimeOfDay::Nighttime);

    let fv = encode("2024-03-05 06:00", 1.0, 1).unwrap();
    assert_eq!(value(&fv, "am_rush"), 1.0);
    assert_eq!(value(&fv, "pm_rush"), 0.0);
    assert_eq!(value(&fv, "daytime"), 0.0);
    assert_eq!(value(&fv, "nighttime"), 0.0);
    println!("✓ Boundaries land in the right bucket");
}

#[test]
fn test_month_one_hot() {
    println!("\n=== Test: Month One-Hot ===");
    for m in 1..=12usize {
        let fv = encode(&format!("2023-{:02}-15 08:00", m), 3.0, 1).unwrap();
        let v = fv.to_vec();
        let block = &v[MONTHS];
        assert_eq!(block.iter().sum::<f32>(), 1.0, "month {m}");
        assert_eq!(block[m - 1], 1.0, "month {m} set in wrong column");
        assert_eq!(FEATURE_NAMES[MONTHS.start + m - 1], format!("month_{}", &fv.month.name()[..3].to_lowercase()));
    }
    println!("✓ Each month sets exactly its own column");
}

#[test]
fn test_weekday_one_hot() {
    println!("\n=== Test: Weekday One-Hot ===");
    // 2024-07-22 is a Monday.
    let expected = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    for (d, wd) in expected.iter().enumerate() {
        let fv = encode(&format!("2024-07-{} 18:00", 22 + d), 3.0, 1).unwrap();
        assert_eq!(fv.weekday, *wd);
        let v = fv.to_vec();
        let block = &v[DAYS];
        assert_eq!(block.iter().sum::<f32>(), 1.0, "day {d}");
        assert_eq!(block[d], 1.0, "{wd:?} set in wrong column");
    }
    println!("✓ Each weekday sets exactly its own column");
}

#[test]
fn test_column_order_is_fixed() {
    println!("\n=== Test: Column Order ===");
    let inputs = [
        ("2024-01-01 00:00", 0.0, 1),
        ("2024-07-27 12:00", 5.0, 2),
        ("2025-12-31 23:59", 42.5, 6),
    ];
    for (ts, d, p) in inputs {
        let fv = encode(ts, d, p).unwrap();
        let names: Vec<&str> = fv.named().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
        assert_eq!(fv.to_vec().len(), FEATURE_COUNT);
    }
    assert_eq!(&FEATURE_NAMES[..2], &["passenger_count", "distance_km"]);
    assert_eq!(&FEATURE_NAMES[TOD], &["am_rush", "pm_rush", "daytime", "nighttime"]);
    assert_eq!(FEATURE_NAMES[MONTHS.start], "month_jan");
    assert_eq!(FEATURE_NAMES[MONTHS.end - 1], "month_dec");
    assert_eq!(FEATURE_NAMES[DAYS.start], "day_monday");
    assert_eq!(FEATURE_NAMES[DAYS.end - 1], "day_sunday");
    println!("✓ Same {} columns every time", FEATURE_COUNT);
}

#[test]
fn test_encode_is_deterministic() {
    println!("\n=== Test: Determinism ===");
    let a = encode("2024-11-08 17:45", 12.3, 3).unwrap().to_vec();
    let b = encode("2024-11-08 17:45", 12.3, 3).unwrap().to_vec();
    let a_bits: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
    let b_bits: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
    assert_eq!(a_bits, b_bits);
    println!("✓ Bit-identical output");
}

#[test]
fn test_end_to_end_saturday_in_july() {
    println!("\n=== Test: Saturday Noon in July ===");
    let fv = encode("2024-07-27 12:00", 5.0, 2).unwrap();

    assert_eq!(value(&fv, "passenger_count"), 2.0);
    assert_eq!(value(&fv, "distance_km"), 5.0);
    assert_eq!(value(&fv, "daytime"), 1.0);
    for other in ["am_rush", "pm_rush", "nighttime"] {
        assert_eq!(value(&fv, other), 0.0, "{other}");
    }
    assert_eq!(fv.month, Month::July);
    assert_eq!(value(&fv, "month_jul"), 1.0);
    assert_eq!(fv.to_vec()[MONTHS].iter().sum::<f32>(), 1.0);
    assert_eq!(fv.weekday, Weekday::Sat);
    assert_eq!(value(&fv, "day_saturday"), 1.0);
    assert_eq!(fv.to_vec()[DAYS].iter().sum::<f32>(), 1.0);
    println!("✓ {:?}", fv.to_vec());
}

#[test]
fn test_timestamp_formats() {
    println!("\n=== Test: Accepted Timestamp Formats ===");
    for ts in [
        "2024-07-27 12:00",
        "2024-07-27 12:00:00",
        "2024-07-27 12:00:00.250",
        "2024-07-27T12:00",
        "2024-07-27T12:00:00",
        "  2024-07-27 12:00  ",
        "2024-07-27T12:00:00+02:00",
        "2024-07-27T12:00:00Z",
    ] {
        let parsed = parse_timestamp(ts).unwrap_or_else(|e| panic!("{ts}: {e}"));
        assert_eq!(parsed.format("%Y-%m-%d %H").to_string(), "2024-07-27 12", "{ts}");
    }
    println!("✓ All formats parse to the same wall-clock hour");
}

#[test]
fn test_unparseable_timestamps() {
    println!("\n=== Test: Parse Errors ===");
    for ts in ["", "not a date", "12:00", "2024-02-30 10:00", "2024-13-01 10:00", "2024-07-27 24:00"] {
        match encode(ts, 1.0, 1) {
            Err(EncodeError::Parse(ParseError::Timestamp(raw))) => assert_eq!(raw, ts),
            other => panic!("{ts:?}: expected parse error, got {other:?}"),
        }
    }
    println!("✓ Malformed timestamps rejected");
}

#[test]
fn test_validation_errors() {
    println!("\n=== Test: Validation Errors ===");
    assert_eq!(
        encode("2024-07-27 12:00", -0.1, 1),
        Err(EncodeError::Validation(ValidationError::NegativeDistance(-0.1)))
    );
    assert!(matches!(
        encode("2024-07-27 12:00", f64::NAN, 1),
        Err(EncodeError::Validation(ValidationError::NonFiniteDistance(_)))
    ));
    assert_eq!(
        encode("2024-07-27 12:00", 1.0, 0),
        Err(EncodeError::Validation(ValidationError::PassengerCount(0)))
    );
    assert_eq!(
        encode("2024-07-27 12:00", 1.0, -3),
        Err(EncodeError::Validation(ValidationError::PassengerCount(-3)))
    );

    // Zero distance is allowed.
    let fv = encode("2024-07-27 12:00", 0.0, 1).unwrap();
    assert_eq!(fv.distance_km, 0.0);
    println!("✓ Out-of-range numbers rejected");
}

#[test]
fn test_raw_input_from_parts() {
    let ts = parse_timestamp("2024-07-27 07:15").unwrap();
    let input = RawTripInput::new(ts, 2.5, 4).unwrap();
    let fv = FeatureVector::from_input(&input);
    assert_eq!(fv.passenger_count, 4);
    assert_eq!(fv.time_of_day, TimeOfDay::AmRush);
}

#[test]
fn test_category_names() {
    println!("\n=== Test: Category Name Lookup ===");
    assert_eq!(month_from_name("jul"), Ok(Month::July));
    assert_eq!(month_from_name("July"), Ok(Month::July));
    assert_eq!(month_from_name("DEC"), Ok(Month::December));
    assert_eq!(month_from_name("Juli"), Err(ParseError::Month("Juli".to_string())));

    assert_eq!(weekday_from_name("saturday"), Ok(Weekday::Sat));
    assert_eq!(weekday_from_name("Sat"), Ok(Weekday::Sat));
    assert_eq!(weekday_from_name("Caturday"), Err(ParseError::Weekday("Caturday".to_string())));
    println!("✓ Unknown categories are errors, not empty encodings");
}

#[test]
fn test_json_keeps_schema_order() {
    println!("\n=== Test: JSON Serialization ===");
    let fv = encode("2024-07-27 12:00", 5.0, 2).unwrap();
    let json_str = serde_json::to_string(&fv).expect("Should serialize to JSON");
    assert!(json_str.starts_with(r#"{"passenger_count":2.0,"distance_km":5.0,"am_rush":0.0"#));

    let mut last = 0;
    for name in FEATURE_NAMES {
        let pos = json_str.find(&format!("\"{name}\"")).expect(name);
        assert!(pos >= last, "{name} out of order");
        last = pos;
    }
    println!("✓ JSON serialization successful ({} chars)", json_str.len());
}

#[test]
fn test_unrepresentable_numbers() {
    println!("\n=== Test: Numbers Too Large For The Model ===");
    assert_eq!(
        encode("2024-07-27 12:00", 1e39, 1),
        Err(EncodeError::Validation(ValidationError::DistanceTooLarge(1e39)))
    );
    let fv = encode("2024-07-27 12:00", f64::from(f32::MAX), 1).unwrap();
    assert!(fv.distance_km.is_finite());

    let err = encode("2024-07-27 12:00", 1.0, 5_000_000_000).unwrap_err();
    assert_eq!(
        err,
        EncodeError::Validation(ValidationError::PassengerCountTooLarge(5_000_000_000))
    );
    assert_eq!(err.to_string(), "passenger count 5000000000 is too large");
    println!("✓ {}", err);
}
