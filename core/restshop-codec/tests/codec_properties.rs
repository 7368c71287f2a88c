//! Property-based tests for the attribute codec.
//!
//! - Round trip: decode(encode(v)) == v for canonical values of every tag
//! - Collections keep their insertion order through a round trip
//! - A bare number written to a time series lands on the start time

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use restshop_codec::{AttributeContext, Units, decode, encode};
use restshop_types::{
    AttributeTypeTag, AttributeValue, Curve, CurveCollection, TimeSeries,
};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn ctx(tag: AttributeTypeTag) -> AttributeContext {
    AttributeContext::new("generator", "G1", "attr", tag)
}

fn finite() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9
}

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn curve() -> impl Strategy<Value = Curve> {
    prop::collection::vec((finite(), finite()), 0..8).prop_map(|points| {
        let (x, y) = points.into_iter().unzip();
        Curve::new(x, y)
    })
}

fn time_series() -> impl Strategy<Value = TimeSeries> {
    (1usize..4, 0usize..6, prop::option::of("[a-z]{1,8}")).prop_flat_map(|(rows, len, name)| {
        (
            prop::collection::vec(timestamp(), len),
            prop::collection::vec(prop::collection::vec(finite(), len), rows),
        )
            .prop_map(move |(timestamps, values)| TimeSeries {
                name: name.clone(),
                unit: None,
                timestamps,
                values,
            })
    })
}

fn value_for(tag: AttributeTypeTag) -> BoxedStrategy<AttributeValue> {
    match tag {
        AttributeTypeTag::Boolean => any::<bool>().prop_map(AttributeValue::Bool).boxed(),
        AttributeTypeTag::Integer => any::<i64>().prop_map(AttributeValue::Integer).boxed(),
        AttributeTypeTag::Float => finite().prop_map(AttributeValue::Float).boxed(),
        AttributeTypeTag::String => "[a-zA-Z0-9 ]{0,20}".prop_map(AttributeValue::Text).boxed(),
        AttributeTypeTag::DateTime => timestamp().prop_map(AttributeValue::DateTime).boxed(),
        AttributeTypeTag::FloatArray => prop::collection::vec(finite(), 0..8)
            .prop_map(AttributeValue::FloatArray)
            .boxed(),
        AttributeTypeTag::IntegerArray => prop::collection::vec(any::<i64>(), 0..8)
            .prop_map(AttributeValue::IntegerArray)
            .boxed(),
        AttributeTypeTag::StringArray => prop::collection::vec("[a-z]{0,6}", 0..8)
            .prop_map(AttributeValue::StringArray)
            .boxed(),
        AttributeTypeTag::Curve => curve().prop_map(AttributeValue::Curve).boxed(),
        AttributeTypeTag::FloatCurveCollection => prop::collection::vec((finite(), curve()), 0..5)
            .prop_map(|entries| AttributeValue::FloatCurves(entries.into_iter().collect()))
            .boxed(),
        AttributeTypeTag::TimeCurveCollection => prop::collection::vec((timestamp(), curve()), 0..5)
            .prop_map(|entries| AttributeValue::TimeCurves(entries.into_iter().collect()))
            .boxed(),
        AttributeTypeTag::TimeSeries => time_series().prop_map(AttributeValue::TimeSeries).boxed(),
    }
}

fn tagged_value() -> impl Strategy<Value = (AttributeTypeTag, AttributeValue)> {
    prop::sample::select(AttributeTypeTag::ALL.to_vec())
        .prop_flat_map(|tag| value_for(tag).prop_map(move |v| (tag, v)))
}

// =============================================================================
// ROUND TRIP
// =============================================================================

proptest! {
    #[test]
    fn decode_inverts_encode((tag, value) in tagged_value()) {
        let ctx = ctx(tag);
        let native = encode(&ctx, &value, None).unwrap();
        let back = decode(&ctx, native, &Units::default(), false).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn float_collection_order_survives(keys in prop::collection::hash_set(-1000i32..1000, 1..8)) {
        let keys: Vec<f64> = keys.into_iter().map(f64::from).collect();
        let collection: CurveCollection<f64> = keys
            .iter()
            .map(|k| (*k, Curve::new(vec![*k], vec![1.0])))
            .collect();
        let ctx = ctx(AttributeTypeTag::FloatCurveCollection);
        let native = encode(&ctx, &AttributeValue::FloatCurves(collection), None).unwrap();
        let AttributeValue::FloatCurves(back) = decode(&ctx, native, &Units::default(), false).unwrap() else {
            panic!("expected float-keyed curves");
        };
        prop_assert_eq!(back.keys().copied().collect::<Vec<_>>(), keys);
    }

    #[test]
    fn bare_number_becomes_single_point_at_start(value in finite(), start in timestamp()) {
        let ctx = ctx(AttributeTypeTag::TimeSeries);
        let native = encode(&ctx, &AttributeValue::Float(value), Some(start)).unwrap();
        let AttributeValue::TimeSeries(series) = decode(&ctx, native, &Units::default(), false).unwrap() else {
            panic!("expected a time series");
        };
        prop_assert_eq!(series.timestamps, vec![start]);
        prop_assert_eq!(series.values, vec![vec![value]]);
    }
}

#[test]
fn descending_keys_are_not_resorted() {
    let collection: CurveCollection<f64> = [
        (100.0, Curve::new(vec![1.0, 2.0], vec![80.0, 90.0])),
        (90.0, Curve::new(vec![1.0, 2.0], vec![70.0, 85.0])),
    ]
    .into_iter()
    .collect();
    let ctx = ctx(AttributeTypeTag::FloatCurveCollection);
    let native = encode(&ctx, &AttributeValue::FloatCurves(collection), None).unwrap();
    let AttributeValue::FloatCurves(back) = decode(&ctx, native, &Units::default(), false).unwrap() else {
        panic!("expected float-keyed curves");
    };
    assert_eq!(back.keys().copied().collect::<Vec<_>>(), vec![100.0, 90.0]);
}
