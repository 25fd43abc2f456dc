//! Display preference and the framed block printed for a hit.

use std::fmt;

use crate::CountyRecord;

/// Width of the separator lines framing a result.
pub const RULE_WIDTH: usize = 60;

/// Which fields of a found record are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayPreference {
    /// County name and seat city
    #[default]
    Both,
    /// County name only
    CountyOnly,
    /// Seat city only
    SeatOnly,
}

impl DisplayPreference {
    pub const MENU: &'static str = "What information would you like to display?
  1. Both county name and seat city (default)
  2. County name only
  3. Seat city only";

    /// Map a menu choice to a preference. Empty input picks the default.
    pub fn from_choice(choice: &str) -> Option<DisplayPreference> {
        match choice.trim() {
            "" | "1" => Some(DisplayPreference::Both),
            "2" => Some(DisplayPreference::CountyOnly),
            "3" => Some(DisplayPreference::SeatOnly),
            _ => None,
        }
    }
}

impl CountyRecord {
    /// Format this record showing the fields selected by `preference`.
    pub fn display(&self, preference: DisplayPreference) -> RecordView<'_> {
        RecordView {
            record: self,
            preference,
        }
    }
}

/// Borrowed view of a [CountyRecord] that formats as a framed block.
#[derive(Clone, Copy, Debug)]
pub struct RecordView<'a> {
    record: &'a CountyRecord,
    preference: DisplayPreference,
}

impl fmt::Display for RecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;

        writeln!(f, "{:=<1$}", "", RULE_WIDTH)?;
        writeln!(f, "License Plate Prefix: {}", record.prefix)?;
        writeln!(f, "{:-<1$}", "", RULE_WIDTH)?;
        match self.preference {
            DisplayPreference::Both => {
                writeln!(f, "County:      {}", record.county_name)?;
                writeln!(f, "County Seat: {}", record.seat_city)?;
            }
            DisplayPreference::CountyOnly => writeln!(f, "County: {}", record.county_name)?,
            DisplayPreference::SeatOnly => writeln!(f, "County Seat: {}", record.seat_city)?,
        }
        write!(f, "{:=<1$}", "", RULE_WIDTH)
    }
}
