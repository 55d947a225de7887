//! Caption and file naming for report photos
//!
//! Every photo gets a label of the form
//! `{case_id}-{doc_code}-{doc_count} Foto Nr. {n}`. The same label names the
//! persisted JPEG artifact, so the two must never drift apart.

use crate::types::*;

/// Caller-supplied identifiers that make up every caption
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaptionFormat {
    /// Case / file number
    pub case_id: String,
    /// Document code (e.g. "UB"); empty means "omit"
    pub doc_code: String,
    /// Document counter within the case
    pub doc_count: String,
}

impl CaptionFormat {
    pub fn new(
        case_id: impl Into<String>,
        doc_code: impl Into<String>,
        doc_count: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            doc_code: doc_code.into(),
            doc_count: doc_count.into(),
        }
    }

    /// Whether the document code is left out of the prefix
    pub fn has_placeholder_code(&self) -> bool {
        self.doc_code.trim().is_empty()
    }

    /// `{case_id}-{doc_code}-{doc_count}`, or `{case_id}-{doc_count}` without a code
    pub fn prefix(&self) -> String {
        if self.has_placeholder_code() {
            format!("{}-{}", self.case_id.trim(), self.doc_count.trim())
        } else {
            format!(
                "{}-{}-{}",
                self.case_id.trim(),
                self.doc_code.trim(),
                self.doc_count.trim()
            )
        }
    }

    /// Caption text for photo number `photo`
    pub fn caption(&self, photo: u32) -> String {
        format!("{} Foto Nr. {}", self.prefix(), photo)
    }

    /// File name of the normalized JPEG persisted for photo number `photo`
    pub fn artifact_file_name(&self, photo: u32) -> String {
        format!("{}.jpg", self.caption(photo))
    }

    /// Default name for the output folder; the document inside it is `{folder_name}.pdf`
    pub fn folder_name(&self) -> String {
        self.prefix()
    }

    pub fn validate(&self) -> Result<()> {
        if self.case_id.trim().is_empty() {
            return Err(ReportError::Config("Case number must not be empty".to_string()));
        }
        if self.doc_count.trim().is_empty() {
            return Err(ReportError::Config(
                "Document count must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("Case number", &self.case_id),
            ("Document code", &self.doc_code),
            ("Document count", &self.doc_count),
        ] {
            if value.contains(['/', '\\']) {
                return Err(ReportError::Config(format!(
                    "{name} must not contain path separators"
                )));
            }
        }
        Ok(())
    }
}
