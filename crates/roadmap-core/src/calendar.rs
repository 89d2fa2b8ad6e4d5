use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("a work calendar needs at least one working day")]
    NoWorkingDays,
}

/// Maps the engine's working-day offsets onto calendar dates.
///
/// Offset 0 is the first working day on or after the project start date.
/// The scheduling passes never consult this; it only serves presentation
/// and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
enum HolidayRule {
    Fixed { month: u32, day: u32 },
    Nth { month: u32, weekday: Weekday, n: u32 },
    Last { month: u32, weekday: Weekday },
}

const US_FEDERAL_HOLIDAYS: [HolidayRule; 10] = [
    HolidayRule::Fixed { month: 1, day: 1 },
    HolidayRule::Nth { month: 1, weekday: Weekday::Mon, n: 3 },
    HolidayRule::Nth { month: 2, weekday: Weekday::Mon, n: 3 },
    HolidayRule::Last { month: 5, weekday: Weekday::Mon },
    HolidayRule::Fixed { month: 7, day: 4 },
    HolidayRule::Nth { month: 9, weekday: Weekday::Mon, n: 1 },
    HolidayRule::Nth { month: 10, weekday: Weekday::Mon, n: 2 },
    HolidayRule::Fixed { month: 11, day: 11 },
    HolidayRule::Nth { month: 11, weekday: Weekday::Thu, n: 4 },
    HolidayRule::Fixed { month: 12, day: 25 },
];

impl HolidayRule {
    fn resolve(self, year: i32) -> Option<NaiveDate> {
        match self {
            HolidayRule::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            HolidayRule::Nth { month, weekday, n } => {
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
            }
            HolidayRule::Last { month, weekday } => {
                let first_of_next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                let mut date = first_of_next - Duration::days(1);
                while date.weekday() != weekday {
                    date = date - Duration::days(1);
                }
                Some(date)
            }
        }
    }
}

impl Default for WorkCalendar {
    /// Monday to Friday with no holidays.
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Weekdays plus US federal holidays for the inclusive year range.
    pub fn with_us_holidays(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };
        let mut calendar = Self::default();
        for year in start..=end {
            calendar
                .holidays
                .extend(US_FEDERAL_HOLIDAYS.iter().filter_map(|rule| rule.resolve(year)));
        }
        calendar
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();
        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// First working day on or after `date`.
    pub fn first_available(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_available(current) {
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Find a date N available days ahead
    pub fn find_next_available(&self, from: NaiveDate, days_ahead: i64) -> NaiveDate {
        let mut current = from;
        let mut count = 0;
        while count < days_ahead {
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
            if self.is_available(current) {
                count += 1;
            }
        }
        current
    }

    /// Calendar date of working-day `offset` counted from `project_start`.
    pub fn date_at(&self, project_start: NaiveDate, offset: i64) -> NaiveDate {
        let origin = self.first_available(project_start);
        self.find_next_available(origin, offset.max(0))
    }

    /// Last working day a task occupies. Finish offsets are exclusive, so a
    /// zero-length task finishes on its start date.
    pub fn finish_date(&self, project_start: NaiveDate, start: i64, finish: i64) -> NaiveDate {
        if finish > start {
            self.date_at(project_start, finish - 1)
        } else {
            self.date_at(project_start, start)
        }
    }

    /// Working-day offset of `date`; dates before the origin map to 0.
    pub fn offset_of(&self, project_start: NaiveDate, date: NaiveDate) -> i64 {
        let origin = self.first_available(project_start);
        if date <= origin {
            return 0;
        }
        self.count_available_days(origin, date - Duration::days(1))
    }

    /// Count available days in an inclusive date range
    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;
        while current <= end {
            if self.is_available(current) {
                count += 1;
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        count
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day));
        WorkCalendarConfig::new(working, calendar.holidays.iter().copied())
    }
}
