//! Rent buckets: named half-open intervals that partition the rent domain.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::BucketError;

/// First run of digits, allowing thousands separators (`3,500`).
static RENT_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").unwrap());

/// A named rent range `[lower, upper)`. `upper == None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentBucket {
    pub label: String,
    pub lower: u32,
    pub upper: Option<u32>,
}

impl RentBucket {
    pub fn new(label: impl Into<String>, lower: u32, upper: Option<u32>) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.lower && self.upper.is_none_or(|upper| value < upper)
    }
}

/// An ordered, gap-free, non-overlapping list of rent buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentBuckets {
    buckets: Vec<RentBucket>,
}

impl RentBuckets {
    /// Validate and build a partition.
    ///
    /// Buckets must be given in ascending order, each non-empty, each starting
    /// exactly where the previous one ends. Only the last may be unbounded.
    pub fn new(buckets: Vec<RentBucket>) -> Result<Self, BucketError> {
        if buckets.is_empty() {
            return Err(BucketError::Empty);
        }

        for (i, bucket) in buckets.iter().enumerate() {
            if let Some(upper) = bucket.upper {
                if upper <= bucket.lower {
                    return Err(BucketError::EmptyRange {
                        label: bucket.label.clone(),
                        lower: bucket.lower,
                        upper,
                    });
                }
            }
            if buckets[..i].iter().any(|b| b.label == bucket.label) {
                return Err(BucketError::DuplicateLabel(bucket.label.clone()));
            }
        }

        for pair in buckets.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let Some(previous_upper) = previous.upper else {
                return Err(BucketError::UnboundedNotLast {
                    label: previous.label.clone(),
                });
            };
            if next.lower < previous_upper {
                return Err(BucketError::Overlap {
                    previous: previous.label.clone(),
                    next: next.label.clone(),
                });
            }
            if next.lower > previous_upper {
                return Err(BucketError::Gap {
                    previous: previous.label.clone(),
                    next: next.label.clone(),
                    previous_upper,
                    next_lower: next.lower,
                });
            }
        }

        Ok(Self { buckets })
    }

    /// The default monthly rent partition (NT$).
    pub fn standard() -> Self {
        Self {
            buckets: vec![
                RentBucket::new("小於3000", 0, Some(3000)),
                RentBucket::new("3000-4000", 3000, Some(4000)),
                RentBucket::new("4000-5000", 4000, Some(5000)),
                RentBucket::new("5000以上", 5000, None),
            ],
        }
    }

    /// The bucket containing `value`, if any.
    pub fn bucket_for(&self, value: u32) -> Option<&RentBucket> {
        self.buckets.iter().find(|b| b.contains(value))
    }

    /// Bucket for a raw rent string such as `"3,500元/月"`.
    pub fn classify(&self, raw: &str) -> Option<&RentBucket> {
        parse_rent(raw).and_then(|value| self.bucket_for(value))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.label.as_str())
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.buckets.iter().any(|b| b.label == label)
    }
}

impl Default for RentBuckets {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse the first number out of a rent string. Signs are not recognized, so
/// `"-100"` reads as 100; callers only ever see non-negative rents.
pub fn parse_rent(raw: &str) -> Option<u32> {
    let digits = RENT_DIGITS.find(raw)?.as_str().replace(',', "");
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_partition_is_valid() {
        let buckets = RentBuckets::standard();
        assert_eq!(RentBuckets::new(buckets.buckets.clone()).unwrap(), buckets);
    }

    #[test]
    fn sample_values_fall_in_exactly_one_bucket() {
        let buckets = RentBuckets::standard();
        let cases = [
            (0, "小於3000"),
            (2999, "小於3000"),
            (3000, "3000-4000"),
            (3999, "3000-4000"),
            (4000, "4000-5000"),
            (4999, "4000-5000"),
            (5000, "5000以上"),
            (10000, "5000以上"),
        ];
        for (value, label) in cases {
            let hits: Vec<&str> = buckets
                .buckets
                .iter()
                .filter(|b| b.contains(value))
                .map(|b| b.label.as_str())
                .collect();
            assert_eq!(hits, vec![label], "value {value}");
        }
    }

    #[test]
    fn bounded_partition_leaves_out_of_domain_values() {
        let buckets = RentBuckets::new(vec![
            RentBucket::new("low", 1000, Some(2000)),
            RentBucket::new("high", 2000, Some(3000)),
        ])
        .unwrap();
        assert!(buckets.bucket_for(999).is_none());
        assert!(buckets.bucket_for(3000).is_none());
        assert_eq!(buckets.bucket_for(1999).unwrap().label, "low");
    }

    #[test]
    fn rejects_gap() {
        let err = RentBuckets::new(vec![
            RentBucket::new("a", 0, Some(3000)),
            RentBucket::new("b", 3500, None),
        ])
        .unwrap_err();
        assert!(matches!(err, BucketError::Gap { previous_upper: 3000, next_lower: 3500, .. }));
    }

    #[test]
    fn rejects_overlap() {
        let err = RentBuckets::new(vec![
            RentBucket::new("a", 0, Some(3000)),
            RentBucket::new("b", 2500, Some(4000)),
        ])
        .unwrap_err();
        assert!(matches!(err, BucketError::Overlap { .. }));
    }

    #[test]
    fn rejects_empty_and_inverted() {
        assert_eq!(RentBuckets::new(vec![]).unwrap_err(), BucketError::Empty);
        let err = RentBuckets::new(vec![RentBucket::new("a", 3000, Some(3000))]).unwrap_err();
        assert!(matches!(err, BucketError::EmptyRange { .. }));
    }

    #[test]
    fn rejects_unbounded_in_the_middle() {
        let err = RentBuckets::new(vec![
            RentBucket::new("a", 0, None),
            RentBucket::new("b", 3000, None),
        ])
        .unwrap_err();
        assert!(matches!(err, BucketError::UnboundedNotLast { .. }));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = RentBuckets::new(vec![
            RentBucket::new("a", 0, Some(10)),
            RentBucket::new("a", 10, None),
        ])
        .unwrap_err();
        assert_eq!(err, BucketError::DuplicateLabel("a".into()));
    }

    #[test]
    fn parses_rent_strings() {
        assert_eq!(parse_rent("3500"), Some(3500));
        assert_eq!(parse_rent("3,500元/月"), Some(3500));
        assert_eq!(parse_rent("月租 12,000"), Some(12000));
        assert_eq!(parse_rent("4500.0"), Some(4500));
        assert_eq!(parse_rent("面議"), None);
        assert_eq!(parse_rent(""), None);
    }

    #[test]
    fn classify_uses_parsed_value() {
        let buckets = RentBuckets::standard();
        assert_eq!(buckets.classify("2,999").unwrap().label, "小於3000");
        assert!(buckets.classify("面議").is_none());
    }
}
