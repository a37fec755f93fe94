use std::fmt;

/// The five categories the Bolt classifier was fine-tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationLabel {
    CourseRegistration,
    DocumentsAndCertificates,
    GeneralInquiry,
    PaymentAndFees,
    SchedulingAndAttendance,
}

impl ClassificationLabel {
    /// Looks up the category for a raw model identifier such as `LABEL_3`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "LABEL_0" => Some(ClassificationLabel::CourseRegistration),
            "LABEL_1" => Some(ClassificationLabel::DocumentsAndCertificates),
            "LABEL_2" => Some(ClassificationLabel::GeneralInquiry),
            "LABEL_3" => Some(ClassificationLabel::PaymentAndFees),
            "LABEL_4" => Some(ClassificationLabel::SchedulingAndAttendance),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClassificationLabel::CourseRegistration => "Course Registration",
            ClassificationLabel::DocumentsAndCertificates => "Documents & Certificates",
            ClassificationLabel::GeneralInquiry => "General Inquiry",
            ClassificationLabel::PaymentAndFees => "Payment & Fees",
            ClassificationLabel::SchedulingAndAttendance => "Scheduling & Attendance",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Maps a model identifier to its display name. Unknown identifiers are returned unchanged.
pub fn remap_label(identifier: &str) -> String {
    ClassificationLabel::from_identifier(identifier)
        .map(|label| label.display_name().to_string())
        .unwrap_or_else(|| identifier.to_string())
}
