//! Boundary inference from the dated directory hierarchy.
//!
//! Tenant trees are laid out as `<tenant>/<year>/<month>/<day>/<hour>/<minute>`
//! and may stop at any level. A directory that names only a prefix of that
//! hierarchy stands for the whole interval the prefix describes, so its
//! boundary is the last second of that interval. This lets the walker drop an
//! entire expired year in one delete instead of visiting every minute below it.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::path::{Component, Path};

/// Number of path components in `path`, counted the same way for tenant roots
/// and the directories below them.
pub fn path_depth(path: &Path) -> usize {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .count()
}

/// Infer the boundary instant a directory represents.
///
/// `base_depth` is the [`path_depth`] of the tenant root. Paths at or above the
/// tenant root, paths whose year is not a number, and dates that cannot be
/// represented map to `now`: they are never older than any cutoff derived
/// from `now`.
pub fn infer_boundary(path: &Path, base_depth: usize, now: DateTime<Utc>) -> DateTime<Utc> {
    let segments: Vec<String> = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .skip(base_depth)
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    DatePrefix::from_segments(&segments)
        .and_then(|prefix| prefix.boundary())
        .unwrap_or(now)
}

/// Granularity of a dated directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

/// The `year/month/day/hour/minute` prefix named by a directory path.
///
/// Fields are kept as parsed; out-of-range values are normalized only when the
/// interval is computed (month 13 is January of the next year, day 0 is the
/// last day of the previous month, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePrefix {
    pub year: i64,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
}

impl DatePrefix {
    /// Build a prefix from the path segments below the tenant root.
    ///
    /// Returns `None` when there are no segments or the year is not an
    /// integer, so undated directories such as `lost+found` stay undated.
    /// Finer segments that are not integers count as `0`; segments past the
    /// minute are ignored.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Option<Self> {
        let (year, rest) = segments.split_first()?;
        let year = year.as_ref().parse::<i64>().ok()?;
        let mut fields = rest.iter().take(4).map(|segment| parse_field(segment.as_ref()));

        Some(Self {
            year,
            month: fields.next(),
            day: fields.next(),
            hour: fields.next(),
            minute: fields.next(),
        })
    }

    pub fn precision(&self) -> Precision {
        match (self.month, self.day, self.hour, self.minute) {
            (None, ..) => Precision::Year,
            (Some(_), None, ..) => Precision::Month,
            (Some(_), Some(_), None, _) => Precision::Day,
            (Some(_), Some(_), Some(_), None) => Precision::Hour,
            (Some(_), Some(_), Some(_), Some(_)) => Precision::Minute,
        }
    }

    /// First instant of the interval, or `None` if it is not representable.
    pub fn interval_start(&self) -> Option<NaiveDateTime> {
        let year = i32::try_from(self.year).ok()?;
        let Some(month) = self.month else {
            return midnight(NaiveDate::from_ymd_opt(year, 1, 1)?);
        };

        // Carry months outside 1..=12 into the year.
        let months = self.year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
        let year = i32::try_from(months.div_euclid(12)).ok()?;
        let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;
        let first_of_month = midnight(NaiveDate::from_ymd_opt(year, month, 1)?)?;
        let Some(day) = self.day else {
            return Some(first_of_month);
        };

        let start = first_of_month.checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?)?;
        let Some(hour) = self.hour else {
            return Some(start);
        };

        let start = start.checked_add_signed(TimeDelta::try_hours(hour)?)?;
        let Some(minute) = self.minute else {
            return Some(start);
        };

        start.checked_add_signed(TimeDelta::try_minutes(minute)?)
    }

    /// First instant after the interval.
    pub fn interval_end(&self) -> Option<NaiveDateTime> {
        let start = self.interval_start()?;
        match self.precision() {
            Precision::Year => start.checked_add_months(Months::new(12)),
            Precision::Month => start.checked_add_months(Months::new(1)),
            Precision::Day => start.checked_add_signed(TimeDelta::days(1)),
            Precision::Hour => start.checked_add_signed(TimeDelta::hours(1)),
            Precision::Minute => start.checked_add_signed(TimeDelta::minutes(1)),
        }
    }

    /// Last second of the interval, in UTC.
    pub fn boundary(&self) -> Option<DateTime<Utc>> {
        let end = self.interval_end()?;
        let boundary = end.checked_sub_signed(TimeDelta::seconds(1))?;
        Some(boundary.and_utc())
    }
}

fn parse_field(segment: &str) -> i64 {
    segment.parse().unwrap_or(0)
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        utc(2024, 3, 15, 0, 0, 0)
    }

    fn boundary_of(relative: &str) -> DateTime<Utc> {
        let root = PathBuf::from("/data/acme");
        let base_depth = path_depth(&root);
        infer_boundary(&root.join(relative), base_depth, now())
    }

    #[test]
    fn test_tenant_root_never_expires() {
        let root = PathBuf::from("/data/acme");
        let base_depth = path_depth(&root);
        assert_eq!(infer_boundary(&root, base_depth, now()), now());
        assert_eq!(infer_boundary(Path::new("/data"), base_depth, now()), now());
        assert_eq!(infer_boundary(Path::new("/"), base_depth, now()), now());
    }

    #[test]
    fn test_year_boundary() {
        assert_eq!(boundary_of("2023"), utc(2023, 12, 31, 23, 59, 59));
        assert_eq!(boundary_of("2024"), utc(2024, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_month_boundary() {
        assert_eq!(boundary_of("2024/02"), utc(2024, 2, 29, 23, 59, 59));
        assert_eq!(boundary_of("2023/02"), utc(2023, 2, 28, 23, 59, 59));
        assert_eq!(boundary_of("2023/12"), utc(2023, 12, 31, 23, 59, 59));
        assert_eq!(boundary_of("2024/4"), utc(2024, 4, 30, 23, 59, 59));
    }

    #[test]
    fn test_day_boundary() {
        assert_eq!(boundary_of("2024/03/10"), utc(2024, 3, 10, 23, 59, 59));
        assert_eq!(boundary_of("2024/03/14"), utc(2024, 3, 14, 23, 59, 59));
        assert_eq!(boundary_of("2023/12/31"), utc(2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_hour_boundary() {
        assert_eq!(boundary_of("2024/03/10/05"), utc(2024, 3, 10, 5, 59, 59));
        assert_eq!(boundary_of("2024/03/10/23"), utc(2024, 3, 10, 23, 59, 59));
    }

    #[test]
    fn test_minute_boundary() {
        assert_eq!(
            boundary_of("2024/03/10/05/30"),
            utc(2024, 3, 10, 5, 30, 59)
        );
        assert_eq!(
            boundary_of("2023/12/31/23/59"),
            utc(2023, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_segments_past_minute_are_ignored() {
        assert_eq!(
            boundary_of("2024/03/10/05/30/extra"),
            utc(2024, 3, 10, 5, 30, 59)
        );
    }

    #[test]
    fn test_unparseable_segments_count_as_zero() {
        // Hour "xx" is 0.
        assert_eq!(boundary_of("2024/03/10/xx"), utc(2024, 3, 10, 0, 59, 59));
        // Month "abc" is 0, which is December of the previous year.
        assert_eq!(boundary_of("2024/abc"), utc(2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_undated_directories_never_expire() {
        assert_eq!(boundary_of("lost+found"), now());
        assert_eq!(boundary_of("archive/2019/01"), now());
        assert_eq!(boundary_of("tmp/keep"), now());
        assert!(DatePrefix::from_segments(&["logs"]).is_none());
    }

    #[test]
    fn test_out_of_range_values_normalize() {
        assert_eq!(boundary_of("2023/13"), utc(2024, 1, 31, 23, 59, 59));
        assert_eq!(boundary_of("2024/03/00"), utc(2024, 2, 29, 23, 59, 59));
        assert_eq!(boundary_of("2024/03/10/24"), utc(2024, 3, 11, 0, 59, 59));
    }

    #[test]
    fn test_unrepresentable_dates_degrade_to_now() {
        assert_eq!(boundary_of("99999999999"), now());
        assert_eq!(boundary_of("2024/03/10/05/9223372036854775807"), now());
    }

    #[test]
    fn test_relative_paths() {
        let root = PathBuf::from("./tenants/acme");
        let base_depth = path_depth(&root);
        assert_eq!(
            infer_boundary(&root.join("2023/06"), base_depth, now()),
            utc(2023, 6, 30, 23, 59, 59)
        );
    }

    #[test]
    fn test_precision() {
        let prefix = DatePrefix::from_segments(&["2024", "03", "10"]).unwrap();
        assert_eq!(prefix.precision(), Precision::Day);
        assert_eq!(prefix.month, Some(3));
        assert!(DatePrefix::from_segments::<&str>(&[]).is_none());
    }

    #[test]
    fn test_finer_segment_stays_within_coarser_interval() {
        let chains: [&[&str]; 3] = [
            &["2024", "02", "29", "23", "59"],
            &["2023", "01", "01", "00", "00"],
            &["2020", "07", "15", "12", "30"],
        ];

        for chain in chains {
            for len in 1..chain.len() {
                let coarse = DatePrefix::from_segments(&chain[..len]).unwrap();
                let fine = DatePrefix::from_segments(&chain[..=len]).unwrap();

                let coarse_start = coarse.interval_start().unwrap().and_utc();
                let coarse_boundary = coarse.boundary().unwrap();
                let fine_boundary = fine.boundary().unwrap();

                assert!(fine_boundary <= coarse_boundary, "{chain:?} at {len}");
                assert!(fine_boundary >= coarse_start, "{chain:?} at {len}");
            }
        }
    }
}
