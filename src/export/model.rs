use time::{Date, Time};

use crate::{meals::repo_types::Meal, readings::repo_types::GlucoseReading};

pub const READINGS_TITLE: &str = "Glucose Readings";
pub const MEALS_TITLE: &str = "Meals";

pub const READING_HEADERS: [&str; 5] = ["Date", "Time", "Level (mg/dL)", "Type", "Notes"];
pub const MEAL_HEADERS: [&str; 6] = ["Date", "Time", "Type", "Description", "Calories", "Carbs"];

/// One value in an exported table. `Empty` is written as a blank cell, never as zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Date(Date),
    Time(Time),
    Empty,
}

impl Cell {
    fn text(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// Plain-text rendering used by CSV and PDF.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.fract() == 0.0 => format!("{f:.1}"),
            Cell::Float(f) => f.to_string(),
            Cell::Date(d) => format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()),
            Cell::Time(t) => format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()),
            Cell::Empty => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| r.iter().map(Cell::display).collect())
            .collect()
    }
}

pub fn readings_table(readings: &[GlucoseReading]) -> Table {
    let rows = readings
        .iter()
        .map(|r| {
            vec![
                Cell::Date(r.timestamp.date()),
                Cell::Time(r.timestamp.time()),
                Cell::Int(i64::from(r.glucose_level)),
                Cell::Text(r.measurement_type.label().to_string()),
                Cell::text(r.notes.as_deref().unwrap_or_default()),
            ]
        })
        .collect();
    Table {
        title: READINGS_TITLE,
        headers: &READING_HEADERS,
        rows,
    }
}

pub fn meals_table(meals: &[Meal]) -> Table {
    let rows = meals
        .iter()
        .map(|m| {
            vec![
                Cell::Date(m.timestamp.date()),
                Cell::Time(m.timestamp.time()),
                Cell::Text(m.meal_type.label().to_string()),
                Cell::text(m.display_description()),
                m.estimated_calories
                    .map_or(Cell::Empty, |c| Cell::Int(i64::from(c))),
                m.carbs_estimate.map_or(Cell::Empty, Cell::Float),
            ]
        })
        .collect();
    Table {
        title: MEALS_TITLE,
        headers: &MEAL_HEADERS,
        rows,
    }
}
