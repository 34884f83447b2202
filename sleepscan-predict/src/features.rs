//! Feature extraction: parsed rows → profile vector and movement series
//!
//! Values are coerced but never range-checked. A negative age or a 140%
//! REM share reaches the model unchanged.

use serde::Serialize;

use crate::error::{AdapterError, AdapterResult};
use crate::schema::{Column, TableSchema, MOVEMENT_STEPS, PROFILE_FEATURES, SCHEMA_V1};
use crate::upload::UploadedRecord;

/// Per-patient profile features, taken from the first data row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileVector {
    age: f64,
    rem_sleep_percentage: f64,
    deep_sleep_percentage: f64,
    exercise_frequency: f64,
}

impl ProfileVector {
    pub fn new(
        age: f64,
        rem_sleep_percentage: f64,
        deep_sleep_percentage: f64,
        exercise_frequency: f64,
    ) -> Self {
        Self {
            age,
            rem_sleep_percentage,
            deep_sleep_percentage,
            exercise_frequency,
        }
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn rem_sleep_percentage(&self) -> f64 {
        self.rem_sleep_percentage
    }

    pub fn deep_sleep_percentage(&self) -> f64 {
        self.deep_sleep_percentage
    }

    pub fn exercise_frequency(&self) -> f64 {
        self.exercise_frequency
    }

    /// Features in model input order
    pub fn values(&self) -> [f64; PROFILE_FEATURES] {
        [
            self.age,
            self.rem_sleep_percentage,
            self.deep_sleep_percentage,
            self.exercise_frequency,
        ]
    }
}

/// Movement intensity per time step, in time order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MovementSeries([f32; MOVEMENT_STEPS]);

impl MovementSeries {
    pub fn new(values: [f32; MOVEMENT_STEPS]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the profile vector from the first data row
pub fn build_profile_vector(rows: &[UploadedRecord]) -> AdapterResult<ProfileVector> {
    build_profile_vector_with(rows, &SCHEMA_V1)
}

/// Build the profile vector using an explicit schema
pub fn build_profile_vector_with(
    rows: &[UploadedRecord],
    schema: &TableSchema,
) -> AdapterResult<ProfileVector> {
    let first = rows.first().ok_or(AdapterError::InsufficientRows {
        found: 0,
        required: 1,
    })?;

    let mut values = [0.0f64; PROFILE_FEATURES];
    for (slot, column) in values.iter_mut().zip(schema.profile) {
        let value = read_real(first, column)?;
        // The model takes f32
        if !(value as f32).is_finite() {
            return Err(field_type_error(first, column));
        }
        *slot = value;
    }

    let [age, rem, deep, exercise] = values;
    Ok(ProfileVector::new(age, rem, deep, exercise))
}

/// Build the movement series from the first `MOVEMENT_STEPS` rows
pub fn build_movement_series(rows: &[UploadedRecord]) -> AdapterResult<MovementSeries> {
    build_movement_series_with(rows, &SCHEMA_V1)
}

/// Build the movement series using an explicit schema
pub fn build_movement_series_with(
    rows: &[UploadedRecord],
    schema: &TableSchema,
) -> AdapterResult<MovementSeries> {
    if rows.len() < MOVEMENT_STEPS {
        return Err(AdapterError::InsufficientRows {
            found: rows.len(),
            required: MOVEMENT_STEPS,
        });
    }

    let mut values = [0.0f32; MOVEMENT_STEPS];
    for (slot, record) in values.iter_mut().zip(rows) {
        let value = read_real(record, schema.movement)? as f32;
        if !value.is_finite() {
            return Err(field_type_error(record, schema.movement));
        }
        *slot = value;
    }

    Ok(MovementSeries::new(values))
}

/// Coerce one field to a finite real number
fn read_real(record: &UploadedRecord, column: Column) -> AdapterResult<f64> {
    record
        .field(column)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| field_type_error(record, column))
}

fn field_type_error(record: &UploadedRecord, column: Column) -> AdapterError {
    AdapterError::FieldType {
        row: record.row(),
        column,
        value: record.field(column).unwrap_or_default().to_string(),
    }
}
