use serde::Serialize;

/// One validated submission. Categorical fields hold catalog codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub marital_status: i64,
    pub application_mode: i64,
    pub application_order: i64,
    pub course: i64,
    pub daytime_evening_attendance: i64,
    pub previous_qualification: i64,
    pub previous_qualification_grade: f64,
    pub nationality: i64,
    pub mothers_qualification: i64,
    pub fathers_qualification: i64,
    pub mothers_occupation: i64,
    pub fathers_occupation: i64,
    pub admission_grade: f64,
    pub displaced: i64,
    pub educational_special_needs: i64,
    pub debtor: i64,
    pub tuition_fees_up_to_date: i64,
    pub gender: i64,
    pub scholarship_holder: i64,
    pub age_at_enrollment: i64,
    pub international: i64,
    pub first_semester: SemesterUnits,
    pub second_semester: SemesterUnits,
    pub gdp: f64,
    pub inflation_rate: f64,
    pub unemployment_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SemesterUnits {
    pub credited: u32,
    pub enrolled: u32,
    pub evaluations: u32,
    pub approved: u32,
    pub grade: f64,
    pub without_evaluations: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.values[index])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: u8,
    pub probability: f64,
}

impl PredictionResult {
    pub fn is_at_risk(&self) -> bool {
        self.label == 1
    }
}
