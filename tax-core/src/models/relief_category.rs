use serde::{Deserialize, Serialize};

/// How a relief category turns a claimed value into a relief amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliefKind {
    /// The claimed amount is clamped to the category cap.
    Flat,
    /// A unit count multiplied by a per-unit amount. Pooled categories draw
    /// their units from the shared child-slot pool.
    PerUnit { pooled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliefCategory {
    Individual,
    IndividualDisabled,
    Spouse,
    SpouseDisabled,
    ChildUnder18,
    ChildOver18Diploma,
    DisabledChild,
    DisabledChildDiploma,
    Medical,
    ParentalMedical,
    Education,
    Lifestyle,
    Sspn,
    Breastfeeding,
    Childcare,
}

impl ReliefCategory {
    /// Every category in evaluation order.
    pub const ALL: [ReliefCategory; 15] = [
        Self::Individual,
        Self::IndividualDisabled,
        Self::Spouse,
        Self::SpouseDisabled,
        Self::ChildUnder18,
        Self::ChildOver18Diploma,
        Self::DisabledChild,
        Self::DisabledChildDiploma,
        Self::Medical,
        Self::ParentalMedical,
        Self::Education,
        Self::Lifestyle,
        Self::Sspn,
        Self::Breastfeeding,
        Self::Childcare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::IndividualDisabled => "individual_disabled",
            Self::Spouse => "spouse",
            Self::SpouseDisabled => "spouse_disabled",
            Self::ChildUnder18 => "child_under_18",
            Self::ChildOver18Diploma => "child_over_18_diploma",
            Self::DisabledChild => "disabled_child",
            Self::DisabledChildDiploma => "disabled_child_diploma",
            Self::Medical => "medical",
            Self::ParentalMedical => "parental_medical",
            Self::Education => "education",
            Self::Lifestyle => "lifestyle",
            Self::Sspn => "sspn",
            Self::Breastfeeding => "breastfeeding",
            Self::Childcare => "childcare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }

    /// Label used on breakdown lines and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::IndividualDisabled => "Individual (Disabled)",
            Self::Spouse => "Spouse (Not Working)",
            Self::SpouseDisabled => "Spouse (Disabled)",
            Self::ChildUnder18 => "Children (<18)",
            Self::ChildOver18Diploma => "Children (≥18, Diploma+)",
            Self::DisabledChild => "Disabled Children",
            Self::DisabledChildDiploma => "Disabled Children (Diploma+)",
            Self::Medical => "Medical Expenses",
            Self::ParentalMedical => "Parent Medical",
            Self::Education => "Education Fees",
            Self::Lifestyle => "Lifestyle",
            Self::Sspn => "SSPN Savings",
            Self::Breastfeeding => "Breastfeeding Equipment",
            Self::Childcare => "Childcare Fees",
        }
    }

    pub fn kind(&self) -> ReliefKind {
        match self {
            Self::ChildUnder18 | Self::ChildOver18Diploma => ReliefKind::PerUnit { pooled: true },
            Self::DisabledChild | Self::DisabledChildDiploma => {
                ReliefKind::PerUnit { pooled: false }
            }
            _ => ReliefKind::Flat,
        }
    }

    pub fn is_per_unit(&self) -> bool {
        matches!(self.kind(), ReliefKind::PerUnit { .. })
    }
}

impl std::fmt::Display for ReliefCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
