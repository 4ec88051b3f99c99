pub struct Choices {
    pub field: &'static str,
    pub options: &'static [(&'static str, i64)],
}

impl Choices {
    pub fn code_for(&self, label: &str) -> Option<i64> {
        let label = label.trim();
        self.options
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(label))
            .map(|(_, code)| *code)
    }

    pub fn label_for(&self, code: i64) -> Option<&'static str> {
        self.options
            .iter()
            .find(|(_, candidate)| *candidate == code)
            .map(|(label, _)| *label)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.label_for(code).is_some()
    }

    pub fn default_code(&self) -> i64 {
        self.options.first().map(|(_, code)| *code).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    const fn at_least(field: &'static str, min: f64) -> Self {
        Self {
            field,
            min,
            max: f64::INFINITY,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const MARITAL_STATUS: Choices = Choices {
    field: "Marital_status",
    options: &[
        ("1 - Single", 1),
        ("2 - Married", 2),
        ("3 - Widower", 3),
        ("4 - Divorced", 4),
        ("5 - Facto union", 5),
        ("6 - Legally separated", 6),
    ],
};

pub const APPLICATION_MODE: Choices = Choices {
    field: "Application_mode",
    options: &[
        ("1 - 1st phase - general contingent", 1),
        ("2 - Ordinance No. 612/93", 2),
        ("5 - 1st phase - special contingent (Azores Island)", 5),
        ("7 - Holders of other higher courses", 7),
        ("10 - Ordinance No. 854-B/99", 10),
        ("15 - International student (bachelor)", 15),
        ("16 - 1st phase - special contingent (Madeira Island)", 16),
        ("17 - 2nd phase - general contingent", 17),
        ("18 - 3rd phase - general contingent", 18),
        ("26 - Ordinance No. 533-A/99, item b2)", 26),
        ("27 - Ordinance No. 533-A/99, item b3", 27),
        ("39 - Over 23 years old", 39),
        ("42 - Transfer", 42),
        ("43 - Change of course", 43),
        ("44 - Technological specialization diploma holders", 44),
        ("51 - Change of institution/course", 51),
        ("53 - Short cycle diploma holders", 53),
        ("57 - Change of institution/course (International)", 57),
    ],
};

pub const COURSE: Choices = Choices {
    field: "Course",
    options: &[
        ("33 - Biofuel Production Technologies", 33),
        ("171 - Animation and Multimedia Design", 171),
        ("8014 - Social Service (evening attendance)", 8014),
        ("9003 - Agronomy", 9003),
        ("9070 - Communication Design", 9070),
        ("9085 - Veterinary Nursing", 9085),
        ("9119 - Informatics Engineering", 9119),
        ("9130 - Equinculture", 9130),
        ("9147 - Management", 9147),
        ("9238 - Social Service", 9238),
        ("9254 - Tourism", 9254),
        ("9500 - Nursing", 9500),
        ("9556 - Oral Hygiene", 9556),
        ("9670 - Advertising and Marketing Management", 9670),
        ("9773 - Journalism and Communication", 9773),
        ("9853 - Basic Education", 9853),
        ("9991 - Management (evening attendance)", 9991),
    ],
};

pub const ATTENDANCE: Choices = Choices {
    field: "Daytime_evening_attendance",
    options: &[("1 - Daytime", 1), ("0 - Evening", 0)],
};

pub const PREVIOUS_QUALIFICATION: Choices = Choices {
    field: "Previous_qualification",
    options: QUALIFICATION_OPTIONS,
};

pub const MOTHERS_QUALIFICATION: Choices = Choices {
    field: "Mothers_qualification",
    options: QUALIFICATION_OPTIONS,
};

pub const FATHERS_QUALIFICATION: Choices = Choices {
    field: "Fathers_qualification",
    options: QUALIFICATION_OPTIONS,
};

const QUALIFICATION_OPTIONS: &[(&str, i64)] = &[
    ("1 - Secondary education", 1),
    ("2 - Higher education - bachelor's degree", 2),
    ("3 - Higher education - degree", 3),
    ("4 - Higher education - master's", 4),
    ("5 - Higher education - doctorate", 5),
    ("6 - Frequency of higher education", 6),
    ("9 - 12th year of schooling - not completed", 9),
    ("10 - 11th year of schooling - not completed", 10),
    ("12 - Other - 11th year of schooling", 12),
    ("14 - 10th year of schooling", 14),
    ("15 - 10th year of schooling - not completed", 15),
    ("19 - Basic education 3rd cycle", 19),
    ("38 - Basic education 2nd cycle", 38),
    ("39 - Technological specialization course", 39),
    ("40 - Higher education - degree (1st cycle)", 40),
    ("42 - Professional higher technical course", 42),
    ("43 - Higher education - master (2nd cycle)", 43),
];

pub const NATIONALITY: Choices = Choices {
    field: "Nacionality",
    options: &[
        ("1 - Portuguese", 1),
        ("2 - German", 2),
        ("6 - Spanish", 6),
        ("11 - Italian", 11),
        ("13 - Dutch", 13),
        ("14 - English", 14),
        ("17 - Lithuanian", 17),
        ("21 - Angolan", 21),
        ("22 - Cape Verdean", 22),
        ("24 - Guinean", 24),
        ("25 - Mozambican", 25),
        ("26 - Santomean", 26),
        ("32 - Turkish", 32),
        ("41 - Brazilian", 41),
        ("62 - Romanian", 62),
        ("100 - Moldova (Republic of)", 100),
        ("101 - Mexican", 101),
        ("103 - Ukrainian", 103),
        ("105 - Russian", 105),
        ("108 - Cuban", 108),
        ("109 - Colombian", 109),
    ],
};

pub const MOTHERS_OCCUPATION: Choices = Choices {
    field: "Mothers_occupation",
    options: OCCUPATION_OPTIONS,
};

pub const FATHERS_OCCUPATION: Choices = Choices {
    field: "Fathers_occupation",
    options: OCCUPATION_OPTIONS,
};

const OCCUPATION_OPTIONS: &[(&str, i64)] = &[
    ("0 - Not available", 0),
    ("1 - Executives and managers", 1),
    ("2 - Professionals", 2),
    ("3 - Technicians and associate professionals", 3),
    ("4 - Administrative staff", 4),
    ("5 - Personal services, protection, security", 5),
    ("6 - Sellers", 6),
    ("7 - Farmers and skilled workers in agriculture", 7),
    ("8 - Skilled workers in industry, construction, artisans", 8),
    ("9 - Machine operators and assembly workers", 9),
    ("10 - Unskilled workers", 10),
    ("90 - Other situation", 90),
];

const YES_NO: &[(&str, i64)] = &[("No", 0), ("Yes", 1)];

pub const DISPLACED: Choices = Choices {
    field: "Displaced",
    options: YES_NO,
};

pub const SPECIAL_NEEDS: Choices = Choices {
    field: "Educational_special_needs",
    options: YES_NO,
};

pub const DEBTOR: Choices = Choices {
    field: "Debtor",
    options: YES_NO,
};

pub const TUITION_UP_TO_DATE: Choices = Choices {
    field: "Tuition_fees_up_to_date",
    options: YES_NO,
};

pub const GENDER: Choices = Choices {
    field: "Gender",
    options: &[("Male", 1), ("Female", 0)],
};

pub const SCHOLARSHIP_HOLDER: Choices = Choices {
    field: "Scholarship_holder",
    options: YES_NO,
};

pub const INTERNATIONAL: Choices = Choices {
    field: "International",
    options: YES_NO,
};

pub const ALL_CHOICES: [&Choices; 17] = [
    &MARITAL_STATUS,
    &APPLICATION_MODE,
    &COURSE,
    &ATTENDANCE,
    &PREVIOUS_QUALIFICATION,
    &NATIONALITY,
    &MOTHERS_QUALIFICATION,
    &FATHERS_QUALIFICATION,
    &MOTHERS_OCCUPATION,
    &FATHERS_OCCUPATION,
    &DISPLACED,
    &SPECIAL_NEEDS,
    &DEBTOR,
    &TUITION_UP_TO_DATE,
    &GENDER,
    &SCHOLARSHIP_HOLDER,
    &INTERNATIONAL,
];

pub const APPLICATION_ORDER: Bounds = Bounds::new("Application_order", 0.0, 9.0);
pub const PREVIOUS_QUALIFICATION_GRADE: Bounds =
    Bounds::new("Previous_qualification_grade", 0.0, 200.0);
pub const ADMISSION_GRADE: Bounds = Bounds::new("Admission_grade", 0.0, 200.0);
pub const AGE_AT_ENROLLMENT: Bounds = Bounds::new("Age_at_enrollment", 15.0, 100.0);
pub const SEMESTER_GRADE_1ST: Bounds = Bounds::new("Curricular_units_1st_sem_grade", 0.0, 20.0);
pub const SEMESTER_GRADE_2ND: Bounds = Bounds::new("Curricular_units_2nd_sem_grade", 0.0, 20.0);
pub const UNEMPLOYMENT_RATE: Bounds = Bounds::new("Unemployment_rate", 0.0, 100.0);
pub const INFLATION_RATE: Bounds = Bounds::new("Inflation_rate", 0.0, 100.0);
pub const GDP: Bounds = Bounds::at_least("GDP", 0.0);

pub const ALL_BOUNDS: [&Bounds; 9] = [
    &APPLICATION_ORDER,
    &PREVIOUS_QUALIFICATION_GRADE,
    &ADMISSION_GRADE,
    &AGE_AT_ENROLLMENT,
    &SEMESTER_GRADE_1ST,
    &SEMESTER_GRADE_2ND,
    &UNEMPLOYMENT_RATE,
    &INFLATION_RATE,
    &GDP,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn option_tables_have_unique_codes_and_labels() {
        for choices in ALL_CHOICES {
            let codes: HashSet<i64> = choices.options.iter().map(|(_, code)| *code).collect();
            let labels: HashSet<String> = choices
                .options
                .iter()
                .map(|(label, _)| label.to_lowercase())
                .collect();
            assert_eq!(codes.len(), choices.options.len(), "{}", choices.field);
            assert_eq!(labels.len(), choices.options.len(), "{}", choices.field);
        }
    }

    #[test]
    fn labels_resolve_case_insensitively() {
        assert_eq!(COURSE.code_for("9119 - informatics engineering"), Some(9119));
        assert_eq!(DEBTOR.code_for(" yes "), Some(1));
        assert_eq!(NATIONALITY.code_for("99 - Atlantis"), None);
    }

    #[test]
    fn defaults_follow_first_option() {
        assert_eq!(ATTENDANCE.default_code(), 1);
        assert_eq!(GENDER.default_code(), 1);
        assert_eq!(MOTHERS_OCCUPATION.default_code(), 0);
        assert_eq!(COURSE.default_code(), 33);
    }

    #[test]
    fn open_upper_bound_accepts_large_values() {
        assert!(GDP.contains(1.0e6));
        assert!(!GDP.contains(-0.1));
        assert!(!AGE_AT_ENROLLMENT.contains(14.0));
    }
}
