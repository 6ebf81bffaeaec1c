//! Stateless domain → range mappings built from aggregation buckets.
//!
//! Every constructor is a pure function of the buckets handed to it; scales
//! are rebuilt per view and never shared between views.

use std::collections::HashMap;

use compute::{Bucket, Counted, Statistics, TimeBucket};
use foundation::bounds::Interval;
use foundation::time::Timestamp;

use crate::symbology::{Color, SEQUENTIAL_REDS};

/// Count → palette bin, plus a key → count lookup that defaults to zero.
#[derive(Debug, Clone)]
pub struct QuantizedColorScale {
    domain_max: u64,
    palette: Vec<Color>,
    counts: HashMap<String, u64>,
}

/// One legend row: the half-open count range `[lower, upper)` mapped to `color`
/// (the last row is closed).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuantizeThreshold {
    pub lower: f64,
    pub upper: f64,
    pub color: Color,
}

pub fn quantized_color_scale<K: AsRef<str>>(buckets: &[Bucket<K>]) -> QuantizedColorScale {
    QuantizedColorScale::with_palette(buckets, &SEQUENTIAL_REDS)
}

impl QuantizedColorScale {
    /// An empty palette is replaced by the default ramp.
    pub fn with_palette<K: AsRef<str>>(buckets: &[Bucket<K>], palette: &[Color]) -> Self {
        let palette = if palette.is_empty() {
            SEQUENTIAL_REDS.to_vec()
        } else {
            palette.to_vec()
        };
        let counts = buckets
            .iter()
            .map(|b| (b.key.as_ref().to_string(), b.count))
            .collect();
        Self {
            domain_max: Statistics::max_count(buckets),
            palette,
            counts,
        }
    }

    pub fn domain(&self) -> (u64, u64) {
        (0, self.domain_max)
    }

    pub fn bins(&self) -> usize {
        self.palette.len()
    }

    /// Unmapped keys count as zero.
    pub fn count_for(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Equal-width bins over `[0, max]`; `max` lands in the top bin.
    pub fn bin_for_count(&self, count: u64) -> usize {
        let n = self.palette.len();
        if self.domain_max == 0 {
            return 0;
        }
        let t = count as f64 / self.domain_max as f64;
        ((t * n as f64).floor().max(0.0) as usize).min(n - 1)
    }

    pub fn bin_for_key(&self, key: &str) -> usize {
        self.bin_for_count(self.count_for(key))
    }

    pub fn color_for_bin(&self, bin: usize) -> Color {
        self.palette[bin.min(self.palette.len() - 1)]
    }

    pub fn color_for_key(&self, key: &str) -> Color {
        self.color_for_bin(self.bin_for_key(key))
    }

    pub fn thresholds(&self) -> Vec<QuantizeThreshold> {
        let n = self.palette.len();
        let width = self.domain_max as f64 / n as f64;
        self.palette
            .iter()
            .enumerate()
            .map(|(i, &color)| QuantizeThreshold {
                lower: width * i as f64,
                upper: width * (i + 1) as f64,
                color,
            })
            .collect()
    }
}

/// Position and width of one categorical band.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Band {
    pub position: f64,
    pub bandwidth: f64,
}

/// Ordered keys laid out as equal bands across a range.
#[derive(Debug, Clone)]
pub struct BandScale {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    first: f64,
    step: f64,
    bandwidth: f64,
}

/// `padding` is the fraction of each step left empty, applied between bands
/// and (as half-steps) at both outer edges. Clamped to `[0, 1)`.
pub fn categorical_position_scale<K: AsRef<str>>(
    buckets: &[Bucket<K>],
    range: Interval,
    padding: f64,
) -> BandScale {
    BandScale::new(buckets.iter().map(|b| b.key.as_ref().to_string()), range, padding)
}

impl BandScale {
    pub fn new(keys: impl IntoIterator<Item = String>, range: Interval, padding: f64) -> Self {
        let mut ordered: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for k in keys {
            if !index.contains_key(&k) {
                index.insert(k.clone(), ordered.len());
                ordered.push(k);
            }
        }

        let padding = if padding.is_finite() {
            padding.clamp(0.0, 0.99)
        } else {
            0.0
        };
        let (lo, hi) = if range.start <= range.end {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        };
        let n = ordered.len() as f64;
        let step = (hi - lo) / (n - padding + 2.0 * padding).max(1.0);
        // Centre the bands; leftover space splits evenly between both edges.
        let first = lo + (hi - lo - step * (n - padding)) * 0.5;

        Self {
            keys: ordered,
            index,
            first,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn band(&self, key: &str) -> Option<Band> {
        let i = *self.index.get(key)?;
        Some(Band {
            position: self.first + self.step * i as f64,
            bandwidth: self.bandwidth,
        })
    }
}

/// Continuous count → position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: Interval,
    min_step: f64,
}

/// Domain `[0, max(count)]` niced outward to whole-number ticks.
pub fn linear_count_scale<B: Counted>(buckets: &[B], range: Interval) -> LinearScale {
    LinearScale::for_counts(Statistics::max_count(buckets), range)
}

const NICE_TICK_TARGET: usize = 10;

impl LinearScale {
    pub fn new(domain: (f64, f64), range: Interval) -> Self {
        Self {
            domain,
            range,
            min_step: 0.0,
        }
    }

    pub fn for_counts(max: u64, range: Interval) -> Self {
        let mut s = Self {
            domain: (0.0, max as f64),
            range,
            min_step: 1.0,
        };
        s.nice(NICE_TICK_TARGET);
        s
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> Interval {
        self.range
    }

    /// Extends the domain outward to multiples of a round tick step.
    pub fn nice(&mut self, count: usize) {
        let (mut start, mut stop) = self.domain;
        if !(stop > start) || count == 0 {
            return;
        }
        let mut previous = 0.0;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count).max(self.min_step);
            if step == previous {
                break;
            }
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
            previous = step;
        }
        self.domain = (start, stop);
    }

    /// Degenerate domains map everything to `range.start`.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        if d1 == d0 {
            return self.range.start;
        }
        self.range.lerp((value - d0) / (d1 - d0))
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        if !(d1 > d0) || count == 0 {
            return vec![d0];
        }
        let step = tick_increment(d0, d1, count).max(self.min_step);
        let first = (d0 / step).ceil() as i64;
        let last = (d1 / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Round step (1, 2, 5 × 10^k) that splits `[start, stop]` into roughly
/// `count` intervals.
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start) / count as f64;
    let power = raw.log10().floor();
    let magnitude = 10f64.powf(power);
    let error = raw / magnitude;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * magnitude
}

/// Timestamp → position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeScale {
    domain: (Timestamp, Timestamp),
    range: Interval,
}

/// `None` for an empty series.
pub fn time_position_scale<K>(buckets: &[TimeBucket<K>], range: Interval) -> Option<TimeScale> {
    let domain = Statistics::time_extent(buckets)?;
    Some(TimeScale { domain, range })
}

impl TimeScale {
    pub fn new(domain: (Timestamp, Timestamp), range: Interval) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (Timestamp, Timestamp) {
        self.domain
    }

    /// A single-instant domain maps to the middle of the range.
    pub fn map(&self, t: Timestamp) -> f64 {
        let d0 = self.domain.0.unix_seconds();
        let d1 = self.domain.1.unix_seconds();
        if d1 == d0 {
            return self.range.midpoint();
        }
        self.range.lerp((t.unix_seconds() - d0) / (d1 - d0))
    }

    /// `count` evenly spaced instants from domain start to end inclusive.
    pub fn ticks(&self, count: usize) -> Vec<Timestamp> {
        let (a, b) = self.domain;
        if a == b || count < 2 {
            return vec![a];
        }
        let d0 = a.unix_seconds();
        let span = b.unix_seconds() - d0;
        let mut out: Vec<Timestamp> = Vec::with_capacity(count);
        for i in 0..count {
            let s = d0 + span * i as f64 / (count - 1) as f64;
            if let Some(t) = Timestamp::from_unix_seconds(s)
                && out.last() != Some(&t)
            {
                out.push(t);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BandScale, LinearScale, categorical_position_scale, linear_count_scale,
        quantized_color_scale, time_position_scale,
    };
    use crate::symbology::SEQUENTIAL_REDS;
    use compute::{Bucket, TimeBucket};
    use foundation::bounds::Interval;
    use foundation::time::Timestamp;

    fn buckets(pairs: &[(&'static str, u64)]) -> Vec<Bucket<&'static str>> {
        pairs.iter().map(|&(k, c)| Bucket::new(k, c)).collect()
    }

    #[test]
    fn quantize_zero_and_missing_hit_lowest_bin() {
        let scale = quantized_color_scale(&buckets(&[("A", 90), ("B", 0), ("C", 45)]));
        assert_eq!(scale.bins(), 9);
        assert_eq!(scale.bin_for_key("B"), 0);
        assert_eq!(scale.bin_for_key("nowhere"), 0);
        assert_eq!(scale.count_for("nowhere"), 0);
        assert_eq!(scale.bin_for_key("A"), 8);
        assert_eq!(scale.bin_for_key("C"), 4);
        assert_eq!(scale.color_for_key("nowhere"), SEQUENTIAL_REDS[0]);
        assert_eq!(scale.color_for_key("A"), SEQUENTIAL_REDS[8]);
    }

    #[test]
    fn quantize_all_zero_domain() {
        let scale = quantized_color_scale(&buckets(&[]));
        assert_eq!(scale.domain(), (0, 0));
        assert_eq!(scale.bin_for_count(0), 0);
        assert_eq!(scale.bin_for_count(5), 0);
    }

    #[test]
    fn quantize_thresholds_cover_domain() {
        let scale = quantized_color_scale(&buckets(&[("A", 18)]));
        let t = scale.thresholds();
        assert_eq!(t.len(), 9);
        assert_eq!(t[0].lower, 0.0);
        assert_eq!(t[0].upper, 2.0);
        assert_eq!(t[8].upper, 18.0);
    }

    #[test]
    fn bands_split_range_with_padding() {
        let scale = categorical_position_scale(
            &buckets(&[("X", 3), ("Y", 1), ("Z", 2)]),
            Interval::new(0.0, 100.0),
            0.0,
        );
        assert_eq!(scale.keys(), &["X", "Y", "Z"]);
        let y = scale.band("Y").unwrap();
        assert!((y.position - 100.0 / 3.0).abs() < 1e-9);
        assert!((y.bandwidth - 100.0 / 3.0).abs() < 1e-9);
        assert!(scale.band("W").is_none());

        let padded = BandScale::new(
            ["a".to_string(), "b".to_string()],
            Interval::new(0.0, 100.0),
            0.2,
        );
        // step = 100 / (2 - 0.2 + 0.4) ; outer padding half-step each side
        let step = 100.0 / 2.2;
        let a = padded.band("a").unwrap();
        let b = padded.band("b").unwrap();
        assert!((padded.step() - step).abs() < 1e-9);
        assert!((a.bandwidth - step * 0.8).abs() < 1e-9);
        assert!((a.position - step * 0.2).abs() < 1e-9);
        assert!((b.position - a.position - step).abs() < 1e-9);
        assert!(b.position + b.bandwidth <= 100.0 + 1e-9);
    }

    #[test]
    fn linear_count_domain_is_niced_to_whole_numbers() {
        let scale = linear_count_scale(
            &buckets(&[("a", 23), ("b", 4)]),
            Interval::new(500.0, 0.0),
        );
        assert_eq!(scale.domain(), (0.0, 24.0));
        assert_eq!(scale.map(0.0), 500.0);
        assert_eq!(scale.map(24.0), 0.0);
        assert!(scale.ticks(10).iter().all(|t| t.fract() == 0.0));

        let small = LinearScale::for_counts(7, Interval::new(0.0, 70.0));
        assert_eq!(small.domain(), (0.0, 7.0));
        assert_eq!(small.ticks(10).len(), 8);

        let big = LinearScale::for_counts(981, Interval::new(0.0, 1.0));
        assert_eq!(big.domain(), (0.0, 1000.0));
    }

    #[test]
    fn linear_count_degenerate_domain() {
        let scale = LinearScale::for_counts(0, Interval::new(300.0, 20.0));
        assert_eq!(scale.domain(), (0.0, 0.0));
        assert_eq!(scale.map(0.0), 300.0);
        assert_eq!(scale.ticks(10), vec![0.0]);
    }

    #[test]
    fn time_scale_interpolates_between_extremes() {
        let t = |s: &str| Timestamp::parse(s).unwrap();
        let series = vec![
            TimeBucket { key: "2020-01-01", time: t("2020-01-01"), count: 1 },
            TimeBucket { key: "2020-01-03", time: t("2020-01-03"), count: 4 },
        ];
        let scale = time_position_scale(&series, Interval::new(0.0, 200.0)).unwrap();
        assert_eq!(scale.map(t("2020-01-01")), 0.0);
        assert_eq!(scale.map(t("2020-01-02")), 100.0);
        assert_eq!(scale.map(t("2020-01-03")), 200.0);
        assert_eq!(scale.ticks(3), vec![t("2020-01-01"), t("2020-01-02"), t("2020-01-03")]);

        let single = time_position_scale(&series[..1], Interval::new(0.0, 200.0)).unwrap();
        assert_eq!(single.map(t("2020-01-01")), 100.0);

        let empty: Vec<TimeBucket<&str>> = Vec::new();
        assert!(time_position_scale(&empty, Interval::new(0.0, 1.0)).is_none());
    }
}
