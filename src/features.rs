use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::{FeatureVector, StudentRecord};

pub const APPROVAL_RATE_EPSILON: f64 = 1e-5;

/// The attendance column is always fed to the model as daytime (1),
/// whatever the submission selected.
pub const ATTENDANCE_FEATURE_VALUE: f64 = 1.0;

pub const BUILD_ORDER: [&str; 38] = [
    "Marital_status",
    "Application_mode",
    "Application_order",
    "Course",
    "Daytime_evening_attendance",
    "Previous_qualification",
    "Previous_qualification_grade",
    "Nacionality",
    "Mothers_qualification",
    "Fathers_qualification",
    "Mothers_occupation",
    "Fathers_occupation",
    "Admission_grade",
    "Displaced",
    "Educational_special_needs",
    "Debtor",
    "Tuition_fees_up_to_date",
    "Gender",
    "Scholarship_holder",
    "Age_at_enrollment",
    "International",
    "Curricular_units_1st_sem_credited",
    "Curricular_units_1st_sem_enrolled",
    "Curricular_units_1st_sem_evaluations",
    "Curricular_units_1st_sem_approved",
    "Curricular_units_1st_sem_grade",
    "Curricular_units_1st_sem_without_evaluations",
    "Curricular_units_2nd_sem_credited",
    "Curricular_units_2nd_sem_enrolled",
    "Curricular_units_2nd_sem_evaluations",
    "Curricular_units_2nd_sem_approved",
    "Curricular_units_2nd_sem_grade",
    "Curricular_units_2nd_sem_without_evaluations",
    "GDP",
    "Inflation_rate",
    "Unemployment_rate",
    "avg_grade",
    "approval_rate",
];

pub fn avg_grade(record: &StudentRecord) -> f64 {
    (record.first_semester.grade + record.second_semester.grade) / 2.0
}

pub fn approval_rate(record: &StudentRecord) -> f64 {
    let approved = record.first_semester.approved as f64 + record.second_semester.approved as f64;
    let enrolled = record.first_semester.enrolled as f64 + record.second_semester.enrolled as f64;
    approved / (enrolled + APPROVAL_RATE_EPSILON)
}

pub fn build_columns(record: &StudentRecord) -> Vec<(&'static str, f64)> {
    if record.daytime_evening_attendance as f64 != ATTENDANCE_FEATURE_VALUE {
        warn!(
            submitted = record.daytime_evening_attendance,
            used = ATTENDANCE_FEATURE_VALUE,
            "Daytime_evening_attendance selection is overridden to daytime"
        );
    }

    let first = &record.first_semester;
    let second = &record.second_semester;
    let values = [
        record.marital_status as f64,
        record.application_mode as f64,
        record.application_order as f64,
        record.course as f64,
        ATTENDANCE_FEATURE_VALUE,
        record.previous_qualification as f64,
        record.previous_qualification_grade,
        record.nationality as f64,
        record.mothers_qualification as f64,
        record.fathers_qualification as f64,
        record.mothers_occupation as f64,
        record.fathers_occupation as f64,
        record.admission_grade,
        record.displaced as f64,
        record.educational_special_needs as f64,
        record.debtor as f64,
        record.tuition_fees_up_to_date as f64,
        record.gender as f64,
        record.scholarship_holder as f64,
        record.age_at_enrollment as f64,
        record.international as f64,
        first.credited as f64,
        first.enrolled as f64,
        first.evaluations as f64,
        first.approved as f64,
        first.grade,
        first.without_evaluations as f64,
        second.credited as f64,
        second.enrolled as f64,
        second.evaluations as f64,
        second.approved as f64,
        second.grade,
        second.without_evaluations as f64,
        record.gdp,
        record.inflation_rate,
        record.unemployment_rate,
        avg_grade(record),
        approval_rate(record),
    ];

    BUILD_ORDER.into_iter().zip(values).collect()
}

/// Picks `expected` columns by name, in `expected` order.
///
/// Fails with [`PipelineError::SchemaMismatch`] when an expected column is
/// not produced. Produced columns that are not expected are dropped.
pub fn select_columns<S: AsRef<str>>(
    columns: &[(&str, f64)],
    expected: &[S],
) -> Result<FeatureVector, PipelineError> {
    let by_name: HashMap<&str, f64> = columns.iter().copied().collect();
    let expected: Vec<&str> = expected.iter().map(AsRef::<str>::as_ref).collect();

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !by_name.contains_key(*name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch { missing });
    }

    let dropped = columns.len().saturating_sub(expected.len());
    if dropped > 0 {
        debug!(dropped, "Columns not used by the scaler were dropped");
    }

    let names = expected.iter().map(|name| name.to_string()).collect();
    let values = expected.iter().map(|name| by_name[name]).collect();
    Ok(FeatureVector::new(names, values))
}

pub fn build<S: AsRef<str>>(
    record: &StudentRecord,
    expected: &[S],
) -> Result<FeatureVector, PipelineError> {
    select_columns(&build_columns(record), expected)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::SemesterUnits;

    pub(crate) fn sample_record() -> StudentRecord {
        StudentRecord {
            marital_status: 1,
            application_mode: 17,
            application_order: 2,
            course: 9119,
            daytime_evening_attendance: 1,
            previous_qualification: 1,
            previous_qualification_grade: 130.0,
            nationality: 1,
            mothers_qualification: 19,
            fathers_qualification: 38,
            mothers_occupation: 5,
            fathers_occupation: 9,
            admission_grade: 128.4,
            displaced: 1,
            educational_special_needs: 0,
            debtor: 0,
            tuition_fees_up_to_date: 1,
            gender: 0,
            scholarship_holder: 1,
            age_at_enrollment: 19,
            international: 0,
            first_semester: SemesterUnits {
                credited: 0,
                enrolled: 6,
                evaluations: 7,
                approved: 6,
                grade: 13.5,
                without_evaluations: 0,
            },
            second_semester: SemesterUnits {
                credited: 0,
                enrolled: 6,
                evaluations: 8,
                approved: 5,
                grade: 12.25,
                without_evaluations: 0,
            },
            gdp: 1.74,
            inflation_rate: 1.4,
            unemployment_rate: 10.8,
        }
    }

    #[test]
    fn avg_grade_is_commutative_mean() {
        let mut record = sample_record();
        assert!((avg_grade(&record) - 12.875).abs() < 1e-12);

        std::mem::swap(&mut record.first_semester, &mut record.second_semester);
        assert!((avg_grade(&record) - 12.875).abs() < 1e-12);
    }

    #[test]
    fn approval_rate_survives_zero_enrollment() {
        let mut record = sample_record();
        record.first_semester = SemesterUnits::default();
        record.second_semester = SemesterUnits::default();

        let rate = approval_rate(&record);
        assert!(rate.is_finite());
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn approval_rate_stays_near_unit_interval() {
        let record = sample_record();
        let rate = approval_rate(&record);
        assert!((rate - 11.0 / (12.0 + APPROVAL_RATE_EPSILON)).abs() < 1e-12);
        assert!((0.0..=1.0 + APPROVAL_RATE_EPSILON).contains(&rate));
    }

    #[test]
    fn attendance_column_is_forced_to_daytime() {
        let mut record = sample_record();
        record.daytime_evening_attendance = 0;
        let columns = build_columns(&record);
        let attendance = columns
            .iter()
            .find(|(name, _)| *name == "Daytime_evening_attendance")
            .map(|(_, value)| *value);
        assert_eq!(attendance, Some(1.0));
    }

    #[test]
    fn selection_is_independent_of_input_order() {
        let record = sample_record();
        let columns = build_columns(&record);
        let mut shuffled = columns.clone();
        shuffled.reverse();
        shuffled.swap(3, 17);

        let mut expected: Vec<String> = BUILD_ORDER.iter().map(|name| name.to_string()).collect();
        expected.rotate_left(5);

        let direct = select_columns(&columns, &expected).unwrap();
        let reordered = select_columns(&shuffled, &expected).unwrap();
        assert_eq!(direct, reordered);
        assert_eq!(direct.names(), expected.as_slice());
        assert_eq!(direct.get("avg_grade"), Some(avg_grade(&record)));
    }

    #[test]
    fn selection_drops_unrequested_columns() {
        let record = sample_record();
        let vector = build(&record, &["approval_rate", "Course"]).unwrap();
        assert_eq!(vector.len(), 2);
        assert_eq!(vector.values()[1], 9119.0);
    }

    #[test]
    fn missing_expected_column_is_schema_mismatch() {
        let record = sample_record();
        let err = build(&record, &["Course", "Curricular_units_3rd_sem_grade"]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::SchemaMismatch {
                missing: vec!["Curricular_units_3rd_sem_grade".to_string()],
            }
        );
    }
}
