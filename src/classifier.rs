//! Keyword heuristic that flags blood-test and lab reports.
//!
//! Matching is plain substring search over lower-cased text, so short
//! abbreviations like "rbc" can hit unrelated words. A false positive only
//! costs a more structured prompt; a false negative loses the report analysis.

/// Bumped whenever [`MEDICAL_KEYWORDS`] or the threshold changes.
pub const KEYWORDS_VERSION: u32 = 1;

/// Distinct keyword hits needed before a document counts as a medical report.
pub const MEDICAL_KEYWORD_THRESHOLD: usize = 3;

/// Lower-case lab report vocabulary.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "blood test",
    "laboratory",
    "lab results",
    "clinical",
    "reference range",
    "cholesterol",
    "glucose",
    "hemoglobin",
    "hba1c",
    "triglycerides",
    "hdl",
    "ldl",
    "tsh",
    "thyroid",
    "creatinine",
    "bilirubin",
    "albumin",
    "platelet",
    "wbc",
    "rbc",
    "hematocrit",
    "mcv",
    "mchc",
    "ferritin",
    "vitamin d",
    "vitamin b12",
    "sgpt",
    "sgot",
    "electrolytes",
    "lipid profile",
    "complete blood count",
];

/// Keywords found in `text`, each at most once, in list order.
pub fn matched_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    MEDICAL_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .collect()
}

pub fn classify(text: &str) -> bool {
    matched_keywords(text).len() >= MEDICAL_KEYWORD_THRESHOLD
}
