use crate::stats::parse_float;

/// Bins per histogram, matching the reference visualization.
pub const DEFAULT_BIN_COUNT: usize = 10;

/// One fixed-width bucket. Half-open `[lower, upper)`, except the final bin
/// of a histogram which is closed so the domain maximum is counted.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Round a domain outward so the boundaries land on round numbers:
/// steps are a power of ten times 1, 2 or 5.
pub fn nice_bounds(min: f64, max: f64, bin_count: usize) -> (f64, f64) {
    if min == max {
        return (min, max);
    }
    let step = tick_step(min, max, bin_count);
    ((min / step).floor() * step, (max / step).ceil() * step)
}

fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start) / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let err = raw / power;
    let factor = if err >= 50f64.sqrt() {
        10.0
    } else if err >= 10f64.sqrt() {
        5.0
    } else if err >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    power * factor
}

/// Bucket a numeric column into `bin_count` contiguous equal-width bins over
/// a nice rounding of `[min, max]`.
///
/// Pure function of the inputs. Null cells and cells that do not parse as a
/// float are skipped, so the counts sum to the number of non-null numeric
/// values. A non-finite or empty domain yields no bins rather than an error,
/// the caller simply has nothing to draw.
pub fn bin_values(
    values: &[Option<String>],
    min: f64,
    max: f64,
    bin_count: usize,
) -> Vec<HistogramBin> {
    if bin_count == 0 || !min.is_finite() || !max.is_finite() || min > max {
        return Vec::new();
    }

    let parsed = values
        .iter()
        .flatten()
        .map(|raw| parse_float(raw))
        .filter(|v| !v.is_nan());

    if min == max {
        // Degenerate domain: a single closed bin holding every value.
        let count = parsed.filter(|&v| v == min).count();
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count,
        }];
    }

    let (lower, upper) = nice_bounds(min, max, bin_count);
    let width = (upper - lower) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: lower + i as f64 * width,
            upper: lower + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for value in parsed {
        if value < lower || value > upper {
            continue;
        }
        // The clamp keeps the domain maximum in the last bin.
        let idx = (((value - lower) / width) as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}
