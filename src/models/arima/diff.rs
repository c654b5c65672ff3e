//! Regular and seasonal differencing, and their inverses.

/// Apply `d` rounds of first differencing.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` rounds of lag-`period` differencing.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    if period == 0 {
        return result;
    }
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result[period..]
            .iter()
            .zip(&result)
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Undo `d` rounds of first differencing for values that continue `original`.
///
/// `differenced` holds future steps on the differenced scale; the result
/// holds the same steps on the scale of `original`.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let start = difference(original, level).last().copied().unwrap_or(0.0);
        result = result
            .iter()
            .scan(start, |acc, step| {
                *acc += step;
                Some(*acc)
            })
            .collect();
    }

    result
}

/// Undo `d` rounds of lag-`period` differencing for values that continue
/// `history` (the series before seasonal differencing).
pub fn seasonal_integrate(differenced: &[f64], history: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let mut extended = seasonal_difference(history, level, period);
        let known = extended.len();
        for step in &result {
            let same_season = if extended.len() >= period {
                extended[extended.len() - period]
            } else {
                0.0
            };
            extended.push(step + same_season);
        }
        result = extended.split_off(known);
    }

    result
}
