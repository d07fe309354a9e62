use strsim::jaro_winkler;

/// Demographic attribute driving normalization and plotting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Ethnicity,
    Gender,
    Age,
    Location,
    /// Belly-button type (innie / outie).
    Bbtype,
    /// Washing frequency, scrubs per week.
    Wfreq,
}

impl Feature {
    /// Every feature, in selector order.
    pub const ALL: [Feature; 6] = [
        Feature::Ethnicity,
        Feature::Gender,
        Feature::Age,
        Feature::Location,
        Feature::Bbtype,
        Feature::Wfreq,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ethnicity" => Some(Self::Ethnicity),
            "gender" => Some(Self::Gender),
            "age" => Some(Self::Age),
            "location" => Some(Self::Location),
            "bbtype" | "bb_type" => Some(Self::Bbtype),
            "wfreq" | "w_freq" => Some(Self::Wfreq),
            _ => None,
        }
    }

    /// Field name as it appears in a demographic record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethnicity => "ethnicity",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Location => "location",
            Self::Bbtype => "bbtype",
            Self::Wfreq => "wfreq",
        }
    }

    /// Human-readable name used for chart titles and axis labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ethnicity => "Ethnicity",
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::Location => "Location",
            Self::Bbtype => "Belly Button Type",
            Self::Wfreq => "Washing Frequency",
        }
    }

    /// Numeric features are plotted as histograms, the rest as category bars.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Age | Self::Wfreq)
    }

    /// Closest known feature name, if any is reasonably similar.
    pub fn suggest(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .map(|f| (*f, jaro_winkler(&lower, f.as_str())))
            .filter(|(_, score)| *score >= 0.7)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(f, _)| f)
    }

    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
