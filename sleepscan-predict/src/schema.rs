//! Upload schema: positional column layout of the nightly CSV
//!
//! The upload carries no declared schema, so the column-to-field mapping
//! lives here as a single versioned table. Any layout change is a new
//! `TableSchema` constant with a bumped version.

use serde::Serialize;
use std::fmt;

/// Number of profile features fed to the model
pub const PROFILE_FEATURES: usize = 4;

/// Number of movement time steps per session
pub const MOVEMENT_STEPS: usize = 24;

/// Positional columns of an uploaded row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Caller-reserved identifier, never read
    Identifier,
    Age,
    RemSleepPercentage,
    DeepSleepPercentage,
    ExerciseFrequency,
    /// Present in the file but unused
    Reserved,
    /// One movement-intensity reading per row
    Movement,
}

impl Column {
    /// Every column in file order
    pub const ALL: [Column; 7] = [
        Column::Identifier,
        Column::Age,
        Column::RemSleepPercentage,
        Column::DeepSleepPercentage,
        Column::ExerciseFrequency,
        Column::Reserved,
        Column::Movement,
    ];

    /// 0-based position in the row
    pub const fn index(self) -> usize {
        match self {
            Column::Identifier => 0,
            Column::Age => 1,
            Column::RemSleepPercentage => 2,
            Column::DeepSleepPercentage => 3,
            Column::ExerciseFrequency => 4,
            Column::Reserved => 5,
            Column::Movement => 6,
        }
    }

    /// Human-readable name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Column::Identifier => "identifier",
            Column::Age => "age",
            Column::RemSleepPercentage => "REM sleep percentage",
            Column::DeepSleepPercentage => "deep sleep percentage",
            Column::ExerciseFrequency => "exercise frequency",
            Column::Reserved => "reserved",
            Column::Movement => "movement",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {} ({})", self.index(), self.name())
    }
}

/// Versioned description of the upload layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub version: u32,
    /// Profile columns in model input order, read from the first data row
    pub profile: [Column; PROFILE_FEATURES],
    /// Column holding one movement reading per data row
    pub movement: Column,
    /// Data rows consumed; later rows are ignored
    pub series_len: usize,
}

impl TableSchema {
    /// Minimum number of fields each consumed row must carry
    pub fn min_width(&self) -> usize {
        self.profile
            .iter()
            .chain(std::iter::once(&self.movement))
            .map(|column| column.index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Highest-indexed required column, reported when a row is too narrow
    pub fn widest_column(&self) -> Column {
        self.profile
            .iter()
            .copied()
            .chain(std::iter::once(self.movement))
            .max_by_key(|column| column.index())
            .unwrap_or(self.movement)
    }
}

/// Nightly upload layout, version 1
pub const SCHEMA_V1: TableSchema = TableSchema {
    version: 1,
    profile: [
        Column::Age,
        Column::RemSleepPercentage,
        Column::DeepSleepPercentage,
        Column::ExerciseFrequency,
    ],
    movement: Column::Movement,
    series_len: MOVEMENT_STEPS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_positions() {
        for (position, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index(), position);
        }
    }

    #[test]
    fn test_v1_layout() {
        assert_eq!(SCHEMA_V1.version, 1);
        assert_eq!(
            SCHEMA_V1.profile.map(Column::index),
            [1, 2, 3, 4],
            "profile order is age, REM, deep sleep, exercise"
        );
        assert_eq!(SCHEMA_V1.movement.index(), 6);
        assert_eq!(SCHEMA_V1.series_len, 24);
    }

    #[test]
    fn test_v1_min_width() {
        assert_eq!(SCHEMA_V1.min_width(), 7);
        assert_eq!(SCHEMA_V1.widest_column(), Column::Movement);
    }

    #[test]
    fn test_column_display() {
        assert_eq!(
            Column::RemSleepPercentage.to_string(),
            "column 2 (REM sleep percentage)"
        );
    }
}
