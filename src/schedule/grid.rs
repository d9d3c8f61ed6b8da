use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSlot {
    PreBreakfast,
    PostBreakfast,
    PreLunch,
    PostLunch,
    PreDinner,
    PostDinner,
    Bedtime,
}

impl MeasurementSlot {
    pub const ALL: [MeasurementSlot; 7] = [
        MeasurementSlot::PreBreakfast,
        MeasurementSlot::PostBreakfast,
        MeasurementSlot::PreLunch,
        MeasurementSlot::PostLunch,
        MeasurementSlot::PreDinner,
        MeasurementSlot::PostDinner,
        MeasurementSlot::Bedtime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementSlot::PreBreakfast => "pre_breakfast",
            MeasurementSlot::PostBreakfast => "post_breakfast",
            MeasurementSlot::PreLunch => "pre_lunch",
            MeasurementSlot::PostLunch => "post_lunch",
            MeasurementSlot::PreDinner => "pre_dinner",
            MeasurementSlot::PostDinner => "post_dinner",
            MeasurementSlot::Bedtime => "bedtime",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Storage column for one cell, e.g. `monday_pre_breakfast`.
pub fn column_name(day: Weekday, slot: MeasurementSlot) -> String {
    format!("{}_{}", day.as_str(), slot.as_str())
}

/// All 49 cells in column order: day-major, slots in daily order.
pub fn cells() -> impl Iterator<Item = (Weekday, MeasurementSlot)> {
    Weekday::ALL
        .into_iter()
        .flat_map(|d| MeasurementSlot::ALL.into_iter().map(move |s| (d, s)))
}

/// Which slots the user plans to measure on which days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleGrid([[bool; 7]; 7]);

pub type ScheduleMap = BTreeMap<Weekday, BTreeMap<MeasurementSlot, bool>>;

impl ScheduleGrid {
    pub fn get(&self, day: Weekday, slot: MeasurementSlot) -> bool {
        self.0[day.index()][slot.index()]
    }

    pub fn set(&mut self, day: Weekday, slot: MeasurementSlot, on: bool) {
        self.0[day.index()][slot.index()] = on;
    }

    pub fn enabled_count(&self) -> usize {
        self.0.iter().flatten().filter(|on| **on).count()
    }

    /// Full map with every day and slot present.
    pub fn to_map(&self) -> ScheduleMap {
        Weekday::ALL
            .into_iter()
            .map(|d| {
                let slots = MeasurementSlot::ALL
                    .into_iter()
                    .map(|s| (s, self.get(d, s)))
                    .collect();
                (d, slots)
            })
            .collect()
    }

    /// Cells missing from `map` are off.
    pub fn from_map(map: &ScheduleMap) -> Self {
        let mut grid = Self::default();
        for (day, slots) in map {
            for (slot, on) in slots {
                grid.set(*day, *slot, *on);
            }
        }
        grid
    }
}
