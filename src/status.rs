//! Save status indicator states

/// What the status indicator is currently telling the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// A save is scheduled or in flight
    Saving,
    /// The last save was acknowledged
    Saved,
    /// The last save failed (network or server rejection)
    Error,
}

impl SaveStatus {
    /// Text shown in the indicator element
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved!",
            SaveStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
