//! Conversion of one attribute value between engine and external shapes.
//!
//! Both directions dispatch exhaustively over [`AttributeTypeTag`]. Curve
//! and collection order is carried through untouched in both directions.

use crate::compress::compress_series;
use crate::error::{AttributeContext, CodecError, CodecResult};
use chrono::{DateTime, Utc};
use restshop_engine::{Frame, FrameColumn, NativeValue, Scalar, Series, SeriesIndex, SeriesLabel};
use restshop_types::{
    AttributeTypeTag, AttributeValue, CollectionKey, Curve, CurveCollection, TimeSeries,
    format_timestamp, parse_timestamp,
};

/// Unit labels attached to decoded curves and series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Units {
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,
}

impl Units {
    pub fn new(x_unit: Option<String>, y_unit: Option<String>) -> Self {
        Self { x_unit, y_unit }
    }
}

fn decode_error(ctx: &AttributeContext, reason: impl Into<String>) -> CodecError {
    CodecError::AttributeDecode {
        context: ctx.clone(),
        reason: reason.into(),
    }
}

fn encode_error(ctx: &AttributeContext, reason: impl Into<String>) -> CodecError {
    CodecError::AttributeEncode {
        context: ctx.clone(),
        reason: reason.into(),
    }
}

// ================================================================
// Decode
// ================================================================

/// Converts an engine value into the external model.
///
/// A native null decodes to [`AttributeValue::Null`] for every tag. With
/// `compress` set, time series lose repeated consecutive points.
pub fn decode(
    ctx: &AttributeContext,
    value: NativeValue,
    units: &Units,
    compress: bool,
) -> CodecResult<AttributeValue> {
    if value == NativeValue::Null {
        return Ok(AttributeValue::Null);
    }
    let shape = value.shape();
    let mismatch = || decode_error(ctx, format!("unexpected native {shape}"));

    match ctx.datatype {
        AttributeTypeTag::Boolean => match value {
            NativeValue::Scalar(Scalar::Bool(b)) => Ok(AttributeValue::Bool(b)),
            NativeValue::Scalar(Scalar::Int(i)) => Ok(AttributeValue::Bool(i != 0)),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Integer => match value {
            NativeValue::Scalar(s) => scalar_to_i64(&s)
                .map(AttributeValue::Integer)
                .ok_or_else(|| decode_error(ctx, format!("{} is not an integer", scalar_text(&s)))),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Float => match value {
            NativeValue::Scalar(s) => scalar_to_f64(&s)
                .map(AttributeValue::Float)
                .ok_or_else(|| decode_error(ctx, format!("{} is not a number", scalar_text(&s)))),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::String => match value {
            NativeValue::Scalar(s) => Ok(AttributeValue::Text(scalar_text(&s))),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::DateTime => match value {
            NativeValue::Scalar(Scalar::Str(raw)) => parse_timestamp(&raw)
                .map(AttributeValue::DateTime)
                .map_err(|e| decode_error(ctx, e.to_string())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::FloatArray => match value {
            NativeValue::Array(items) => {
                decode_array(ctx, &items, scalar_to_f64).map(AttributeValue::FloatArray)
            }
            _ => Err(mismatch()),
        },
        AttributeTypeTag::IntegerArray => match value {
            NativeValue::Array(items) => {
                decode_array(ctx, &items, scalar_to_i64).map(AttributeValue::IntegerArray)
            }
            _ => Err(mismatch()),
        },
        AttributeTypeTag::StringArray => match value {
            NativeValue::Array(items) => Ok(AttributeValue::StringArray(
                items.iter().map(scalar_text).collect(),
            )),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Curve => match value {
            NativeValue::Series(series) => decode_curve(ctx, series, units).map(AttributeValue::Curve),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::TimeSeries => {
            let series = match value {
                NativeValue::Series(series) => decode_single_series(ctx, series, units)?,
                NativeValue::Frame(frame) => decode_frame(ctx, frame, units)?,
                _ => return Err(mismatch()),
            };
            let series = if compress { compress_series(&series) } else { series };
            Ok(AttributeValue::TimeSeries(series))
        }
        AttributeTypeTag::FloatCurveCollection => match value {
            NativeValue::SeriesList(list) => {
                decode_collection(ctx, list, units, |label| match label {
                    SeriesLabel::Float(key) => Some(*key),
                    SeriesLabel::Text(raw) => raw.trim().parse().ok(),
                    SeriesLabel::Time(_) => None,
                })
                .map(AttributeValue::FloatCurves)
            }
            _ => Err(mismatch()),
        },
        AttributeTypeTag::TimeCurveCollection => match value {
            NativeValue::SeriesList(list) => {
                decode_collection(ctx, list, units, |label| match label {
                    SeriesLabel::Time(key) => Some(*key),
                    SeriesLabel::Text(raw) => parse_timestamp(raw).ok(),
                    SeriesLabel::Float(_) => None,
                })
                .map(AttributeValue::TimeCurves)
            }
            _ => Err(mismatch()),
        },
    }
}

fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Double(d) => d.to_string(),
        Scalar::Str(s) => s.clone(),
    }
}

fn scalar_to_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Bool(b) => Some(f64::from(u8::from(*b))),
        Scalar::Int(i) => Some(*i as f64),
        Scalar::Double(d) => Some(*d),
        Scalar::Str(s) => s.trim().parse().ok(),
    }
}

/// Truncates toward zero, as a cast to an integer column would.
fn scalar_to_i64(scalar: &Scalar) -> Option<i64> {
    match scalar {
        Scalar::Bool(b) => Some(i64::from(*b)),
        Scalar::Int(i) => Some(*i),
        Scalar::Double(d) if d.is_finite() => Some(d.trunc() as i64),
        Scalar::Double(_) => None,
        Scalar::Str(s) => s.trim().parse().ok(),
    }
}

fn decode_array<T>(
    ctx: &AttributeContext,
    items: &[Scalar],
    cast: fn(&Scalar) -> Option<T>,
) -> CodecResult<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            cast(item).ok_or_else(|| {
                decode_error(
                    ctx,
                    format!("element {position} ({}) cannot be cast", scalar_text(item)),
                )
            })
        })
        .collect()
}

fn decode_curve(ctx: &AttributeContext, series: Series, units: &Units) -> CodecResult<Curve> {
    let SeriesIndex::Float(x_values) = series.index else {
        return Err(decode_error(ctx, "curve index is not numeric"));
    };
    Ok(Curve::new(x_values, series.values).with_units(units.x_unit.clone(), units.y_unit.clone()))
}

fn decode_single_series(
    ctx: &AttributeContext,
    series: Series,
    units: &Units,
) -> CodecResult<TimeSeries> {
    let SeriesIndex::Time(timestamps) = series.index else {
        return Err(decode_error(ctx, "time series index is not timestamps"));
    };
    let name = match series.label {
        Some(SeriesLabel::Text(name)) => Some(name),
        _ => None,
    };
    Ok(TimeSeries {
        name,
        unit: units.y_unit.clone(),
        timestamps,
        values: vec![series.values],
    })
}

fn decode_frame(ctx: &AttributeContext, frame: Frame, units: &Units) -> CodecResult<TimeSeries> {
    if !frame.is_aligned() {
        return Err(decode_error(ctx, "frame columns do not match its index"));
    }
    Ok(TimeSeries {
        name: frame.name,
        unit: units.y_unit.clone(),
        timestamps: frame.index,
        values: frame.columns.into_iter().map(|c| c.values).collect(),
    })
}

fn decode_collection<K: CollectionKey>(
    ctx: &AttributeContext,
    list: Vec<Series>,
    units: &Units,
    key_of: fn(&SeriesLabel) -> Option<K>,
) -> CodecResult<CurveCollection<K>> {
    let mut collection = CurveCollection::new();
    for (position, series) in list.into_iter().enumerate() {
        let key = series
            .label
            .as_ref()
            .and_then(key_of)
            .ok_or_else(|| decode_error(ctx, format!("curve {position} has no usable reference key")))?;
        let curve = decode_curve(ctx, series, units)?;
        collection.insert(key, curve);
    }
    Ok(collection)
}

// ================================================================
// Encode
// ================================================================

/// Converts an external value into the engine's shape for this attribute.
///
/// `time_hint` anchors a bare number written to a time-series attribute;
/// callers pass the session's start time.
pub fn encode(
    ctx: &AttributeContext,
    value: &AttributeValue,
    time_hint: Option<DateTime<Utc>>,
) -> CodecResult<NativeValue> {
    let mismatch = || {
        encode_error(
            ctx,
            format!("{} value does not fit {}", value.kind(), ctx.datatype),
        )
    };
    if value.is_null() {
        return Err(encode_error(ctx, "null cannot be written"));
    }

    match ctx.datatype {
        AttributeTypeTag::Boolean => match value {
            AttributeValue::Bool(b) => Ok(Scalar::Bool(*b).into()),
            AttributeValue::Integer(i) => Ok(Scalar::Bool(*i != 0).into()),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Integer => match value {
            AttributeValue::Integer(i) => Ok(Scalar::Int(*i).into()),
            AttributeValue::Float(f) if f.is_finite() => Ok(Scalar::Int(f.trunc() as i64).into()),
            AttributeValue::Bool(b) => Ok(Scalar::Int(i64::from(*b)).into()),
            AttributeValue::Text(s) => s
                .trim()
                .parse()
                .map(|i| Scalar::Int(i).into())
                .map_err(|_| encode_error(ctx, format!("'{s}' is not an integer"))),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Float => match value {
            AttributeValue::Integer(i) => Ok(Scalar::Double(*i as f64).into()),
            AttributeValue::Float(f) => Ok(Scalar::Double(*f).into()),
            AttributeValue::Bool(b) => Ok(Scalar::Double(f64::from(u8::from(*b))).into()),
            AttributeValue::Text(s) => s
                .trim()
                .parse()
                .map(|f| Scalar::Double(f).into())
                .map_err(|_| encode_error(ctx, format!("'{s}' is not a number"))),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::String => match value {
            AttributeValue::Text(s) => Ok(Scalar::Str(s.clone()).into()),
            // Text that happens to look like a timestamp arrives parsed.
            AttributeValue::DateTime(ts) => Ok(Scalar::Str(format_timestamp(ts)).into()),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::DateTime => match value {
            AttributeValue::DateTime(ts) => Ok(Scalar::Str(format_timestamp(ts)).into()),
            AttributeValue::Text(s) => parse_timestamp(s)
                .map(|ts| Scalar::Str(format_timestamp(&ts)).into())
                .map_err(|e| encode_error(ctx, e.to_string())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::FloatArray => match value {
            AttributeValue::FloatArray(items) => {
                Ok(NativeValue::Array(items.iter().map(|f| Scalar::Double(*f)).collect()))
            }
            AttributeValue::IntegerArray(items) => Ok(NativeValue::Array(
                items.iter().map(|i| Scalar::Double(*i as f64)).collect(),
            )),
            AttributeValue::StringArray(items) if items.is_empty() => Ok(NativeValue::Array(Vec::new())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::IntegerArray => match value {
            AttributeValue::IntegerArray(items) => {
                Ok(NativeValue::Array(items.iter().map(|i| Scalar::Int(*i)).collect()))
            }
            AttributeValue::FloatArray(items) => items
                .iter()
                .enumerate()
                .map(|(position, f)| {
                    if f.fract() == 0.0 && f.is_finite() {
                        Ok(Scalar::Int(*f as i64))
                    } else {
                        Err(encode_error(ctx, format!("element {position} ({f}) is not an integer")))
                    }
                })
                .collect::<CodecResult<Vec<_>>>()
                .map(NativeValue::Array),
            AttributeValue::StringArray(items) if items.is_empty() => Ok(NativeValue::Array(Vec::new())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::StringArray => match value {
            AttributeValue::StringArray(items) => Ok(NativeValue::Array(
                items.iter().map(|s| Scalar::Str(s.clone())).collect(),
            )),
            AttributeValue::IntegerArray(items) if items.is_empty() => Ok(NativeValue::Array(Vec::new())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::Curve => match value {
            AttributeValue::Curve(curve) => encode_curve(ctx, curve).map(NativeValue::Series),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::FloatCurveCollection => match value {
            AttributeValue::FloatCurves(curves) => encode_collection(ctx, curves, |k| SeriesLabel::Float(*k)),
            AttributeValue::TimeCurves(curves) if curves.is_empty() => Ok(NativeValue::SeriesList(Vec::new())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::TimeCurveCollection => match value {
            AttributeValue::TimeCurves(curves) => encode_collection(ctx, curves, |k| SeriesLabel::Time(*k)),
            AttributeValue::FloatCurves(curves) if curves.is_empty() => Ok(NativeValue::SeriesList(Vec::new())),
            _ => Err(mismatch()),
        },
        AttributeTypeTag::TimeSeries => match value {
            AttributeValue::TimeSeries(series) => encode_time_series(ctx, series),
            AttributeValue::Integer(_) | AttributeValue::Float(_) => {
                let Some(start) = time_hint else {
                    return Err(encode_error(ctx, "no start time to anchor a constant value"));
                };
                let constant = value.as_f64().unwrap_or_default();
                encode_time_series(ctx, &TimeSeries::constant(start, constant))
            }
            _ => Err(mismatch()),
        },
    }
}

fn encode_curve(ctx: &AttributeContext, curve: &Curve) -> CodecResult<Series> {
    curve
        .check_aligned()
        .map_err(|e| encode_error(ctx, e.to_string()))?;
    Ok(Series::new(
        SeriesIndex::Float(curve.x_values.clone()),
        curve.y_values.clone(),
    ))
}

fn encode_collection<K: CollectionKey>(
    ctx: &AttributeContext,
    curves: &CurveCollection<K>,
    label: fn(&K) -> SeriesLabel,
) -> CodecResult<NativeValue> {
    curves
        .iter()
        .map(|(key, curve)| Ok(encode_curve(ctx, curve)?.with_label(label(key))))
        .collect::<CodecResult<Vec<_>>>()
        .map(NativeValue::SeriesList)
}

fn encode_time_series(ctx: &AttributeContext, series: &TimeSeries) -> CodecResult<NativeValue> {
    series
        .validate()
        .map_err(|e| encode_error(ctx, e.to_string()))?;
    match series.values.as_slice() {
        [] => Err(encode_error(ctx, "time series has no value rows")),
        [row] => {
            let mut native = Series::new(SeriesIndex::Time(series.timestamps.clone()), row.clone());
            if let Some(name) = &series.name {
                native = native.with_label(SeriesLabel::Text(name.clone()));
            }
            Ok(NativeValue::Series(native))
        }
        rows => Ok(NativeValue::Frame(Frame {
            name: series.name.clone(),
            index: series.timestamps.clone(),
            columns: rows
                .iter()
                .enumerate()
                .map(|(i, values)| FrameColumn {
                    name: i.to_string(),
                    values: values.clone(),
                })
                .collect(),
        })),
    }
}

