use std::fmt;

use time::Date;

/// One monthly publication of the daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// File name under which CVM publishes this month's daily report.
    pub fn archive_name(self) -> String {
        format!("inf_diario_fi_{:04}{:02}.zip", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Calendar months touched by `start..=end`, in chronological order.
///
/// Empty when `end` is before `start`.
pub fn months_between(start: Date, end: Date) -> impl Iterator<Item = YearMonth> {
    let last = YearMonth::from_date(end);
    let first = YearMonth::from_date(start);
    std::iter::successors((start <= end).then_some(first), move |ym| {
        let next = ym.next();
        (next <= last).then_some(next)
    })
}
