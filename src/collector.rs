use std::io::Read;

use serde::Deserialize;

use crate::catalog::{self, Bounds, Choices};
use crate::error::InputError;
use crate::models::{SemesterUnits, StudentRecord};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Code(i64),
    Label(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSubmission {
    pub student_id: Option<String>,
    #[serde(alias = "Marital_status")]
    pub marital_status: Choice,
    #[serde(alias = "Application_mode")]
    pub application_mode: Choice,
    #[serde(alias = "Application_order")]
    pub application_order: i64,
    #[serde(alias = "Course")]
    pub course: Choice,
    #[serde(alias = "Daytime_evening_attendance")]
    pub daytime_evening_attendance: Choice,
    #[serde(alias = "Previous_qualification")]
    pub previous_qualification: Choice,
    #[serde(alias = "Previous_qualification_grade")]
    pub previous_qualification_grade: f64,
    #[serde(alias = "Nacionality")]
    pub nationality: Choice,
    #[serde(alias = "Mothers_qualification")]
    pub mothers_qualification: Choice,
    #[serde(alias = "Fathers_qualification")]
    pub fathers_qualification: Choice,
    #[serde(alias = "Mothers_occupation")]
    pub mothers_occupation: Choice,
    #[serde(alias = "Fathers_occupation")]
    pub fathers_occupation: Choice,
    #[serde(alias = "Admission_grade")]
    pub admission_grade: f64,
    #[serde(alias = "Displaced")]
    pub displaced: Choice,
    #[serde(alias = "Educational_special_needs")]
    pub educational_special_needs: Choice,
    #[serde(alias = "Debtor")]
    pub debtor: Choice,
    #[serde(alias = "Tuition_fees_up_to_date")]
    pub tuition_fees_up_to_date: Choice,
    #[serde(alias = "Gender")]
    pub gender: Choice,
    #[serde(alias = "Scholarship_holder")]
    pub scholarship_holder: Choice,
    #[serde(alias = "Age_at_enrollment")]
    pub age_at_enrollment: i64,
    #[serde(alias = "International")]
    pub international: Choice,
    #[serde(alias = "Curricular_units_1st_sem_credited")]
    pub curricular_units_1st_sem_credited: i64,
    #[serde(alias = "Curricular_units_1st_sem_enrolled")]
    pub curricular_units_1st_sem_enrolled: i64,
    #[serde(alias = "Curricular_units_1st_sem_evaluations")]
    pub curricular_units_1st_sem_evaluations: i64,
    #[serde(alias = "Curricular_units_1st_sem_approved")]
    pub curricular_units_1st_sem_approved: i64,
    #[serde(alias = "Curricular_units_1st_sem_grade")]
    pub curricular_units_1st_sem_grade: f64,
    #[serde(alias = "Curricular_units_1st_sem_without_evaluations")]
    pub curricular_units_1st_sem_without_evaluations: i64,
    #[serde(alias = "Curricular_units_2nd_sem_credited")]
    pub curricular_units_2nd_sem_credited: i64,
    #[serde(alias = "Curricular_units_2nd_sem_enrolled")]
    pub curricular_units_2nd_sem_enrolled: i64,
    #[serde(alias = "Curricular_units_2nd_sem_evaluations")]
    pub curricular_units_2nd_sem_evaluations: i64,
    #[serde(alias = "Curricular_units_2nd_sem_approved")]
    pub curricular_units_2nd_sem_approved: i64,
    #[serde(alias = "Curricular_units_2nd_sem_grade")]
    pub curricular_units_2nd_sem_grade: f64,
    #[serde(alias = "Curricular_units_2nd_sem_without_evaluations")]
    pub curricular_units_2nd_sem_without_evaluations: i64,
    #[serde(alias = "GDP")]
    pub gdp: f64,
    #[serde(alias = "Inflation_rate")]
    pub inflation_rate: f64,
    #[serde(alias = "Unemployment_rate")]
    pub unemployment_rate: f64,
}

impl Default for RawSubmission {
    fn default() -> Self {
        let first = |choices: &Choices| Choice::Code(choices.default_code());
        Self {
            student_id: None,
            marital_status: first(&catalog::MARITAL_STATUS),
            application_mode: first(&catalog::APPLICATION_MODE),
            application_order: 0,
            course: first(&catalog::COURSE),
            daytime_evening_attendance: first(&catalog::ATTENDANCE),
            previous_qualification: first(&catalog::PREVIOUS_QUALIFICATION),
            previous_qualification_grade: 100.0,
            nationality: first(&catalog::NATIONALITY),
            mothers_qualification: first(&catalog::MOTHERS_QUALIFICATION),
            fathers_qualification: first(&catalog::FATHERS_QUALIFICATION),
            mothers_occupation: first(&catalog::MOTHERS_OCCUPATION),
            fathers_occupation: first(&catalog::FATHERS_OCCUPATION),
            admission_grade: 100.0,
            displaced: first(&catalog::DISPLACED),
            educational_special_needs: first(&catalog::SPECIAL_NEEDS),
            debtor: first(&catalog::DEBTOR),
            tuition_fees_up_to_date: first(&catalog::TUITION_UP_TO_DATE),
            gender: first(&catalog::GENDER),
            scholarship_holder: first(&catalog::SCHOLARSHIP_HOLDER),
            age_at_enrollment: 18,
            international: first(&catalog::INTERNATIONAL),
            curricular_units_1st_sem_credited: 0,
            curricular_units_1st_sem_enrolled: 0,
            curricular_units_1st_sem_evaluations: 0,
            curricular_units_1st_sem_approved: 0,
            curricular_units_1st_sem_grade: 0.0,
            curricular_units_1st_sem_without_evaluations: 0,
            curricular_units_2nd_sem_credited: 0,
            curricular_units_2nd_sem_enrolled: 0,
            curricular_units_2nd_sem_evaluations: 0,
            curricular_units_2nd_sem_approved: 0,
            curricular_units_2nd_sem_grade: 0.0,
            curricular_units_2nd_sem_without_evaluations: 0,
            gdp: 0.0,
            inflation_rate: 0.0,
            unemployment_rate: 0.0,
        }
    }
}

pub fn parse_json(text: &str) -> Result<RawSubmission, InputError> {
    serde_json::from_str(text).map_err(|e| InputError::Malformed(e.to_string()))
}

/// Reads every CSV row as its own submission. Only a bad header fails the whole read.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<Result<RawSubmission, InputError>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    reader.headers()?;

    Ok(reader
        .deserialize::<RawSubmission>()
        .map(|row| row.map_err(|e| InputError::Malformed(e.to_string())))
        .collect())
}

pub fn collect(raw: &RawSubmission) -> Result<StudentRecord, InputError> {
    Ok(StudentRecord {
        marital_status: resolve(&catalog::MARITAL_STATUS, &raw.marital_status)?,
        application_mode: resolve(&catalog::APPLICATION_MODE, &raw.application_mode)?,
        application_order: bounded_int(&catalog::APPLICATION_ORDER, raw.application_order)?,
        course: resolve(&catalog::COURSE, &raw.course)?,
        daytime_evening_attendance: resolve(
            &catalog::ATTENDANCE,
            &raw.daytime_evening_attendance,
        )?,
        previous_qualification: resolve(
            &catalog::PREVIOUS_QUALIFICATION,
            &raw.previous_qualification,
        )?,
        previous_qualification_grade: bounded(
            &catalog::PREVIOUS_QUALIFICATION_GRADE,
            raw.previous_qualification_grade,
        )?,
        nationality: resolve(&catalog::NATIONALITY, &raw.nationality)?,
        mothers_qualification: resolve(
            &catalog::MOTHERS_QUALIFICATION,
            &raw.mothers_qualification,
        )?,
        fathers_qualification: resolve(
            &catalog::FATHERS_QUALIFICATION,
            &raw.fathers_qualification,
        )?,
        mothers_occupation: resolve(&catalog::MOTHERS_OCCUPATION, &raw.mothers_occupation)?,
        fathers_occupation: resolve(&catalog::FATHERS_OCCUPATION, &raw.fathers_occupation)?,
        admission_grade: bounded(&catalog::ADMISSION_GRADE, raw.admission_grade)?,
        displaced: resolve(&catalog::DISPLACED, &raw.displaced)?,
        educational_special_needs: resolve(
            &catalog::SPECIAL_NEEDS,
            &raw.educational_special_needs,
        )?,
        debtor: resolve(&catalog::DEBTOR, &raw.debtor)?,
        tuition_fees_up_to_date: resolve(
            &catalog::TUITION_UP_TO_DATE,
            &raw.tuition_fees_up_to_date,
        )?,
        gender: resolve(&catalog::GENDER, &raw.gender)?,
        scholarship_holder: resolve(&catalog::SCHOLARSHIP_HOLDER, &raw.scholarship_holder)?,
        age_at_enrollment: bounded_int(&catalog::AGE_AT_ENROLLMENT, raw.age_at_enrollment)?,
        international: resolve(&catalog::INTERNATIONAL, &raw.international)?,
        first_semester: SemesterUnits {
            credited: count(
                "Curricular_units_1st_sem_credited",
                raw.curricular_units_1st_sem_credited,
            )?,
            enrolled: count(
                "Curricular_units_1st_sem_enrolled",
                raw.curricular_units_1st_sem_enrolled,
            )?,
            evaluations: count(
                "Curricular_units_1st_sem_evaluations",
                raw.curricular_units_1st_sem_evaluations,
            )?,
            approved: count(
                "Curricular_units_1st_sem_approved",
                raw.curricular_units_1st_sem_approved,
            )?,
            grade: bounded(
                &catalog::SEMESTER_GRADE_1ST,
                raw.curricular_units_1st_sem_grade,
            )?,
            without_evaluations: count(
                "Curricular_units_1st_sem_without_evaluations",
                raw.curricular_units_1st_sem_without_evaluations,
            )?,
        },
        second_semester: SemesterUnits {
            credited: count(
                "Curricular_units_2nd_sem_credited",
                raw.curricular_units_2nd_sem_credited,
            )?,
            enrolled: count(
                "Curricular_units_2nd_sem_enrolled",
                raw.curricular_units_2nd_sem_enrolled,
            )?,
            evaluations: count(
                "Curricular_units_2nd_sem_evaluations",
                raw.curricular_units_2nd_sem_evaluations,
            )?,
            approved: count(
                "Curricular_units_2nd_sem_approved",
                raw.curricular_units_2nd_sem_approved,
            )?,
            grade: bounded(
                &catalog::SEMESTER_GRADE_2ND,
                raw.curricular_units_2nd_sem_grade,
            )?,
            without_evaluations: count(
                "Curricular_units_2nd_sem_without_evaluations",
                raw.curricular_units_2nd_sem_without_evaluations,
            )?,
        },
        gdp: bounded(&catalog::GDP, raw.gdp)?,
        inflation_rate: bounded(&catalog::INFLATION_RATE, raw.inflation_rate)?,
        unemployment_rate: bounded(&catalog::UNEMPLOYMENT_RATE, raw.unemployment_rate)?,
    })
}

fn resolve(choices: &Choices, choice: &Choice) -> Result<i64, InputError> {
    let code = match choice {
        Choice::Code(code) => Some(*code).filter(|code| choices.contains(*code)),
        Choice::Label(label) => choices
            .code_for(label)
            .or_else(|| label.trim().parse::<i64>().ok().filter(|code| choices.contains(*code))),
    };

    code.ok_or_else(|| InputError::UnknownOption {
        field: choices.field,
        value: match choice {
            Choice::Code(code) => code.to_string(),
            Choice::Label(label) => label.clone(),
        },
    })
}

fn bounded(bounds: &Bounds, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite {
            field: bounds.field,
        });
    }
    if !bounds.contains(value) {
        return Err(InputError::OutOfRange {
            field: bounds.field,
            value,
            min: bounds.min,
            max: bounds.max,
        });
    }
    Ok(value)
}

fn bounded_int(bounds: &Bounds, value: i64) -> Result<i64, InputError> {
    bounded(bounds, value as f64).map(|_| value)
}

fn count(field: &'static str, value: i64) -> Result<u32, InputError> {
    u32::try_from(value).map_err(|_| InputError::OutOfRange {
        field,
        value: value as f64,
        min: 0.0,
        max: u32::MAX as f64,
    })
}
