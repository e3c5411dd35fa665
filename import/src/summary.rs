use std::fmt::{self, Display, Formatter};

/// What the driver decided for one virtual machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Update { fields: Vec<String> },
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UpdatesDisabled,
    UpToDate,
}

/// Counters for one import run. Intended actions are counted in a dry run too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub scanned: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl ImportSummary {
    pub fn record(&mut self, action: &Action) {
        match action {
            Action::Create => self.created += 1,
            Action::Update { .. } => self.updated += 1,
            Action::Skip(_) => self.skipped += 1,
        }
    }
}

impl Display for ImportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "ImportSummary")?;
        writeln!(f, "  scanned: {}", self.scanned)?;
        writeln!(f, "  created: {}", self.created)?;
        writeln!(f, "  updated: {}", self.updated)?;
        write!(f, "  skipped: {}", self.skipped)
    }
}
