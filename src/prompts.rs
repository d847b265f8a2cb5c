//! System prompt templates.
//!
//! The medical section headers and the disclaimer are what the front end
//! shows to users, so their wording and order must not drift.

/// Revision of the two templates below.
pub const PROMPT_VERSION: u32 = 2;

/// Section headers of a medical report analysis, in the order the model must emit them.
pub const MEDICAL_SECTIONS: [&str; 7] = [
    "ANALYSIS",
    "DIAGNOSIS",
    "HEALTH SCORE",
    "RECOMMENDED ACTIONS",
    "DIETARY RECOMMENDATIONS",
    "EXERCISE SUGGESTIONS",
    "DISCLAIMER",
];

pub const MEDICAL_DISCLAIMER: &str = "This analysis is for informational purposes only and is not a \
substitute for professional medical advice, diagnosis, or treatment; always consult a qualified \
healthcare provider about your results.";

/// Synthetic first user turn issued when a medical report is loaded.
pub const AUTO_ANALYSIS_PROMPT: &str = "Analyze this blood test report in detail";

pub fn generic_document_prompt(document_text: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions based on the following PDF content:\n\
         \n\
         {document_text}\n\
         \n\
         Answer questions based on this content. If the information isn't in the document, say so politely."
    )
}

pub fn medical_report_prompt(document_text: &str) -> String {
    format!(
        "You are a medical assistant that explains blood test and laboratory reports to patients \
         in clear, friendly language. Base every statement on the report below.\n\
         \n\
         BLOOD TEST REPORT:\n\
         {document_text}\n\
         \n\
         Format rules:\n\
         - Write plain text only. Do not use markdown: no '#', '*', '**' or tables.\n\
         - Use exactly these section headers, each on its own line in capital letters and followed by a colon, in this order: \
         ANALYSIS, DIAGNOSIS, HEALTH SCORE, RECOMMENDED ACTIONS, DIETARY RECOMMENDATIONS, EXERCISE SUGGESTIONS, DISCLAIMER.\n\
         \n\
         ANALYSIS:\n\
         Go through every measured value, state its reference range and say whether it is low, normal or high.\n\
         \n\
         DIAGNOSIS:\n\
         Describe the conditions the abnormal values may point to. Say clearly when the values are all within range.\n\
         \n\
         HEALTH SCORE:\n\
         Give an overall score from 0 to 100 with a one-sentence justification.\n\
         \n\
         RECOMMENDED ACTIONS:\n\
         List concrete next steps, including follow-up tests and which specialist to see.\n\
         \n\
         DIETARY RECOMMENDATIONS:\n\
         List foods to eat more of and foods to limit, tied to the values above.\n\
         \n\
         EXERCISE SUGGESTIONS:\n\
         Suggest suitable activities, their frequency and intensity.\n\
         \n\
         DISCLAIMER:\n\
         End your answer with this sentence, word for word:\n\
         {MEDICAL_DISCLAIMER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_prompt_embeds_text_verbatim() {
        let text = "Invoice #42\n  total: {amount} <b>$10</b>";
        let prompt = generic_document_prompt(text);
        assert!(prompt.contains(text));
        assert!(prompt.contains("say so politely"));
    }

    #[test]
    fn medical_prompt_lists_sections_in_order() {
        let prompt = medical_report_prompt("Hemoglobin 13.5 g/dL");
        let mut cursor = prompt.find("Hemoglobin 13.5 g/dL").unwrap();
        for section in MEDICAL_SECTIONS {
            let header = format!("\n{section}:\n");
            let at = prompt[cursor..]
                .find(&header)
                .unwrap_or_else(|| panic!("missing section {section}"));
            cursor += at + header.len();
        }
    }

    #[test]
    fn medical_prompt_ends_with_disclaimer() {
        let prompt = medical_report_prompt("TSH 2.1 mIU/L");
        assert!(prompt.ends_with(MEDICAL_DISCLAIMER));
    }

    #[test]
    fn medical_prompt_does_not_reinterpret_braces() {
        let text = "{MEDICAL_DISCLAIMER} {document_text}";
        assert!(medical_report_prompt(text).contains(text));
    }
}
