use crate::value::{Value, canonical_cmp, strict_order_cmp};
use std::cmp::Ordering;

///
/// Range
///
/// Interval constraint over one ordered value: `min ⋚ x ⋚ max`, each end
/// open, closed, or unbounded. The substrate for conjunction folding and
/// disjunct merging in the simplifier.
///
/// CONTRACT: every bound and probe handed to one range must be mutually
/// comparable under `strict_order_cmp`; the simplifier groups literals per
/// attribute and checks comparability before folding.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Range {
    min: Option<Value>,
    max: Option<Value>,
    include_min: bool,
    include_max: bool,
}

impl Range {
    /// Build a range, normalizing provably empty intervals to `None`.
    #[must_use]
    pub fn new(
        min: Option<Value>,
        max: Option<Value>,
        include_min: bool,
        include_max: bool,
    ) -> Option<Self> {
        if let (Some(lo), Some(hi)) = (&min, &max) {
            match cmp_bound_values(lo, hi) {
                Ordering::Greater => return None,
                Ordering::Equal if !(include_min && include_max) => return None,
                _ => {}
            }
        }

        Some(Self {
            include_min: min.is_some() && include_min,
            include_max: max.is_some() && include_max,
            min,
            max,
        })
    }

    /// The unbounded range.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            min: None,
            max: None,
            include_min: false,
            include_max: false,
        }
    }

    /// The degenerate range holding exactly one value.
    #[must_use]
    pub fn point(value: Value) -> Self {
        Self {
            min: Some(value.clone()),
            max: Some(value),
            include_min: true,
            include_max: true,
        }
    }

    /// `x > value`.
    #[must_use]
    pub const fn greater_than(value: Value) -> Self {
        Self {
            min: Some(value),
            max: None,
            include_min: false,
            include_max: false,
        }
    }

    /// `x <= value`.
    #[must_use]
    pub const fn at_most(value: Value) -> Self {
        Self {
            min: None,
            max: Some(value),
            include_min: false,
            include_max: true,
        }
    }

    #[must_use]
    pub const fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    #[must_use]
    pub const fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    #[must_use]
    pub const fn include_min(&self) -> bool {
        self.include_min
    }

    #[must_use]
    pub const fn include_max(&self) -> bool {
        self.include_max
    }

    /// The single value held by a degenerate range, if any.
    #[must_use]
    pub fn as_point(&self) -> Option<&Value> {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi))
                if self.include_min
                    && self.include_max
                    && cmp_bound_values(lo, hi) == Ordering::Equal =>
            {
                Some(lo)
            }
            _ => None,
        }
    }

    /// Membership test; an incomparable probe is outside the range.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        let lower_ok = match &self.min {
            None => true,
            Some(boundary) => match strict_order_cmp(value, boundary) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => self.include_min,
                _ => false,
            },
        };
        let upper_ok = match &self.max {
            None => true,
            Some(boundary) => match strict_order_cmp(value, boundary) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => self.include_max,
                _ => false,
            },
        };

        lower_ok && upper_ok
    }

    /// Intersection. `None` means the intersection is empty.
    #[must_use]
    pub fn and(&self, other: &Self) -> Option<Self> {
        let (min, include_min) = tighter_lower(
            (&self.min, self.include_min),
            (&other.min, other.include_min),
        );
        let (max, include_max) = tighter_upper(
            (&self.max, self.include_max),
            (&other.max, other.include_max),
        );

        Self::new(min.cloned(), max.cloned(), include_min, include_max)
    }

    /// Union, only when the operands overlap or touch. `None` means the
    /// union cannot be expressed as one range.
    #[must_use]
    pub fn or(&self, other: &Self) -> Option<Self> {
        if self.and(other).is_none() && !self.touches(other) {
            return None;
        }

        let (min, include_min) = looser_lower(
            (&self.min, self.include_min),
            (&other.min, other.include_min),
        );
        let (max, include_max) = looser_upper(
            (&self.max, self.include_max),
            (&other.max, other.include_max),
        );

        Self::new(min.cloned(), max.cloned(), include_min, include_max)
    }

    /// Drop the lower boundary value from the range.
    #[must_use]
    pub fn exclude_min(&self) -> Option<Self> {
        Self::new(self.min.clone(), self.max.clone(), false, self.include_max)
    }

    /// Drop the upper boundary value from the range.
    #[must_use]
    pub fn exclude_max(&self) -> Option<Self> {
        Self::new(self.min.clone(), self.max.clone(), self.include_min, false)
    }

    // Disjoint ranges that share one boundary value still union cleanly
    // when at least one side covers the shared value.
    fn touches(&self, other: &Self) -> bool {
        let meet = |hi: &Self, lo: &Self| match (&hi.max, &lo.min) {
            (Some(a), Some(b)) => {
                cmp_bound_values(a, b) == Ordering::Equal && (hi.include_max || lo.include_min)
            }
            _ => false,
        };

        meet(self, other) || meet(other, self)
    }
}

// Bound values must be comparable by contract; the canonical order keeps
// the fallback deterministic if the contract is ever broken.
fn cmp_bound_values(left: &Value, right: &Value) -> Ordering {
    strict_order_cmp(left, right).unwrap_or_else(|| {
        debug_assert!(false, "range bounds must be mutually comparable");
        canonical_cmp(left, right)
    })
}

type Bound<'a> = (&'a Option<Value>, bool);

fn tighter_lower<'a>(a: Bound<'a>, b: Bound<'a>) -> (Option<&'a Value>, bool) {
    match (a.0, b.0) {
        (None, None) => (None, false),
        (Some(v), None) => (Some(v), a.1),
        (None, Some(v)) => (Some(v), b.1),
        (Some(av), Some(bv)) => match cmp_bound_values(av, bv) {
            Ordering::Greater => (Some(av), a.1),
            Ordering::Less => (Some(bv), b.1),
            Ordering::Equal => (Some(av), a.1 && b.1),
        },
    }
}

fn tighter_upper<'a>(a: Bound<'a>, b: Bound<'a>) -> (Option<&'a Value>, bool) {
    match (a.0, b.0) {
        (None, None) => (None, false),
        (Some(v), None) => (Some(v), a.1),
        (None, Some(v)) => (Some(v), b.1),
        (Some(av), Some(bv)) => match cmp_bound_values(av, bv) {
            Ordering::Less => (Some(av), a.1),
            Ordering::Greater => (Some(bv), b.1),
            Ordering::Equal => (Some(av), a.1 && b.1),
        },
    }
}

fn looser_lower<'a>(a: Bound<'a>, b: Bound<'a>) -> (Option<&'a Value>, bool) {
    match (a.0, b.0) {
        (None, _) | (_, None) => (None, false),
        (Some(av), Some(bv)) => match cmp_bound_values(av, bv) {
            Ordering::Less => (Some(av), a.1),
            Ordering::Greater => (Some(bv), b.1),
            Ordering::Equal => (Some(av), a.1 || b.1),
        },
    }
}

fn looser_upper<'a>(a: Bound<'a>, b: Bound<'a>) -> (Option<&'a Value>, bool) {
    match (a.0, b.0) {
        (None, _) | (_, None) => (None, false),
        (Some(av), Some(bv)) => match cmp_bound_values(av, bv) {
            Ordering::Greater => (Some(av), a.1),
            Ordering::Less => (Some(bv), b.1),
            Ordering::Equal => (Some(av), a.1 || b.1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Value {
        Value::Int(v)
    }

    #[test]
    fn empty_intersections_collapse() {
        let low = Range::at_most(int(5));
        let high = Range::greater_than(int(5));
        assert_eq!(low.and(&high), None);

        let touching = Range::at_most(int(5)).and(&Range::point(int(5)));
        assert_eq!(touching, Some(Range::point(int(5))));
    }

    #[test]
    fn intersection_keeps_strictest_bounds() {
        let a = Range::greater_than(int(10));
        let b = Range::at_most(int(20));
        let both = a.and(&b).expect("overlapping ranges intersect");

        assert_eq!(both.min(), Some(&int(10)));
        assert!(!both.include_min());
        assert_eq!(both.max(), Some(&int(20)));
        assert!(both.include_max());
    }

    #[test]
    fn union_requires_overlap_or_touch() {
        let a = Range::new(Some(int(0)), Some(int(5)), true, false).expect("non-empty");
        let b = Range::greater_than(int(5));
        // Neither side covers 5, so the union would have a hole.
        assert_eq!(a.or(&b), None);

        let c = Range::new(Some(int(0)), Some(int(5)), true, true).expect("non-empty");
        let joined = c.or(&b).expect("touching ranges union");
        assert_eq!(joined.min(), Some(&int(0)));
        assert_eq!(joined.max(), None);
    }

    #[test]
    fn union_of_overlap_takes_loosest_bounds() {
        let a = Range::new(Some(int(0)), Some(int(10)), false, true).expect("non-empty");
        let b = Range::new(Some(int(5)), Some(int(30)), true, false).expect("non-empty");
        let joined = a.or(&b).expect("overlapping ranges union");

        assert_eq!(joined.min(), Some(&int(0)));
        assert!(!joined.include_min());
        assert_eq!(joined.max(), Some(&int(30)));
        assert!(!joined.include_max());
    }

    #[test]
    fn point_detection_and_exclusion() {
        let point = Range::point(int(7));
        assert_eq!(point.as_point(), Some(&int(7)));
        assert_eq!(point.exclude_min(), None, "a hollowed point is empty");

        let range = Range::new(Some(int(0)), Some(int(7)), true, true).expect("non-empty");
        let open = range.exclude_max().expect("still non-empty");
        assert!(!open.contains(&int(7)));
        assert!(open.contains(&int(6)));
    }

    #[test]
    fn containment_honors_bound_openness() {
        let range = Range::new(Some(int(10)), Some(int(20)), false, true).expect("non-empty");
        assert!(!range.contains(&int(10)));
        assert!(range.contains(&int(11)));
        assert!(range.contains(&int(20)));
        assert!(!range.contains(&Value::Text("20".into())), "incomparable probe");
    }
}
