//! The fixed four-line record printed by the benchmark binary.
//!
//! ```text
//! All threads run 12.345 s
//! - Hit Avg: 1.5 (stat size: 100, real size_: 200), median: 1.2, p9999: 9.1, p999: 8.1, p99: 5.2, p90: 3.3
//! - Other Avg: 7.5 (stat size: 50, real size_: 60), median: 7.2, p9999: 19.1, p999: 18.1, p99: 15.2, p90: 13.3
//! Total Avg Lat: 3.25 (size: 260, miss ratio: 0.23)
//! ```
//!
//! Each line is one [`FieldGroup`]. Group order and the field names captured by
//! every group are defined here only; the parser and the reports both read them
//! from this module.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// One line of the record, in the order the lines must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    RunTime,
    Hit,
    Other,
    Total,
}

const FLOAT: &str = r"[\d.]+";
const INT: &str = r"\d+";

static RUN_TIME: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"All threads run (?P<run_time>{FLOAT}) s")));
static HIT: Lazy<Regex> = Lazy::new(|| compile(&latency_pattern("Hit", "hit")));
static OTHER: Lazy<Regex> = Lazy::new(|| compile(&latency_pattern("Other", "other")));
static TOTAL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"Total Avg Lat: (?P<total_avg_lat>{FLOAT}) \(size: (?P<total_size>{INT}), miss ratio: (?P<miss_ratio>{FLOAT})\)"
    ))
});

fn latency_pattern(label: &str, prefix: &str) -> String {
    format!(
        r"- {label} Avg: (?P<{prefix}_avg>{FLOAT}) \(stat size: (?P<{prefix}_stat_size>{INT}), real size_: (?P<{prefix}_real_size>{INT})\), median: (?P<{prefix}_median>{FLOAT}), p9999: (?P<{prefix}_p9999>{FLOAT}), p999: (?P<{prefix}_p999>{FLOAT}), p99: (?P<{prefix}_p99>{FLOAT}), p90: (?P<{prefix}_p90>{FLOAT})"
    )
}

// Patterns are built from the constants above, so a failure here is a bug.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("record pattern must compile")
}

impl FieldGroup {
    /// Lines in record order; `RunTime` is the anchor.
    pub const ORDER: [FieldGroup; 4] = [
        FieldGroup::RunTime,
        FieldGroup::Hit,
        FieldGroup::Other,
        FieldGroup::Total,
    ];

    pub fn pattern(self) -> &'static Regex {
        match self {
            FieldGroup::RunTime => &*RUN_TIME,
            FieldGroup::Hit => &*HIT,
            FieldGroup::Other => &*OTHER,
            FieldGroup::Total => &*TOTAL,
        }
    }

    /// Field names captured by this group, in the order they appear on the line.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            FieldGroup::RunTime => &["run_time"],
            FieldGroup::Hit => &[
                "hit_avg",
                "hit_stat_size",
                "hit_real_size",
                "hit_median",
                "hit_p9999",
                "hit_p999",
                "hit_p99",
                "hit_p90",
            ],
            FieldGroup::Other => &[
                "other_avg",
                "other_stat_size",
                "other_real_size",
                "other_median",
                "other_p9999",
                "other_p999",
                "other_p99",
                "other_p90",
            ],
            FieldGroup::Total => &["total_avg_lat", "total_size", "miss_ratio"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldGroup::RunTime => "run time",
            FieldGroup::Hit => "hit latency",
            FieldGroup::Other => "other latency",
            FieldGroup::Total => "total latency",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every field of a complete record, in record order.
pub fn all_fields() -> impl Iterator<Item = &'static str> {
    FieldGroup::ORDER
        .into_iter()
        .flat_map(|group| group.fields().iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_declare_exactly_the_group_fields() {
        for group in FieldGroup::ORDER {
            let names: Vec<&str> = group.pattern().capture_names().flatten().collect();
            assert_eq!(names, group.fields(), "{group} fields drifted from pattern");
        }
    }

    #[test]
    fn complete_record_has_twenty_fields() {
        assert_eq!(all_fields().count(), 20);
        assert_eq!(all_fields().next(), Some("run_time"));
        assert_eq!(all_fields().last(), Some("miss_ratio"));
    }
}
