//! Run-length compression of time series.

use restshop_types::TimeSeries;

/// Drops every point whose values equal the previous point in every row.
///
/// The first point of each run is kept, so a step function survives with
/// its step times intact. Rows stay aligned to one shared timestamp index.
pub fn compress_series(series: &TimeSeries) -> TimeSeries {
    let keep: Vec<usize> = (0..series.timestamps.len())
        .filter(|&j| {
            j == 0
                || series
                    .values
                    .iter()
                    .any(|row| row.get(j) != row.get(j - 1))
        })
        .collect();

    TimeSeries {
        name: series.name.clone(),
        unit: series.unit.clone(),
        timestamps: keep.iter().map(|&j| series.timestamps[j]).collect(),
        values: series
            .values
            .iter()
            .map(|row| keep.iter().filter_map(|&j| row.get(j).copied()).collect())
            .collect(),
    }
}
