use crate::{
    error::{MigrateError, Result},
    migration::{m1_0_0, m1_1_0, m1_2_0, MigrationBinding, MigrationUnit},
};

/// Every migration this driver can run, one variant per target version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    V1_0_0,
    V1_1_0,
    V1_2_0,
}

const VERSIONS: &[(&str, MigrationKind)] = &[
    ("1.0.0", MigrationKind::V1_0_0),
    ("1.1.0", MigrationKind::V1_1_0),
    ("1.2.0", MigrationKind::V1_2_0),
];

impl MigrationKind {
    /// Builds a unit for a single project. Units keep per-project state, so
    /// one is bound per project and dropped afterwards.
    pub fn bind(self, binding: MigrationBinding) -> Box<dyn MigrationUnit> {
        match self {
            MigrationKind::V1_0_0 => Box::new(m1_0_0::Migration::new(binding)),
            MigrationKind::V1_1_0 => Box::new(m1_1_0::Migration::new(binding)),
            MigrationKind::V1_2_0 => Box::new(m1_2_0::Migration::new(binding)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTarget {
    pub version: String,
    pub kind: MigrationKind,
}

impl MigrationTarget {
    pub fn bind(&self, binding: MigrationBinding) -> Box<dyn MigrationUnit> {
        self.kind.bind(binding)
    }
}

#[derive(Debug, Clone)]
pub struct VersionCatalog {
    entries: Vec<(&'static str, MigrationKind)>,
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self {
            entries: VERSIONS.to_vec(),
        }
    }
}

impl VersionCatalog {
    /// A catalog limited to the given versions, in the given order.
    pub fn new(entries: impl IntoIterator<Item = (&'static str, MigrationKind)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn resolve(&self, version: &str) -> Result<MigrationTarget> {
        self.entries
            .iter()
            .find(|(id, _)| *id == version)
            .map(|(id, kind)| MigrationTarget {
                version: (*id).to_owned(),
                kind: *kind,
            })
            .ok_or_else(|| MigrateError::VersionNotFound(version.to_owned()))
    }

    pub fn contains(&self, version: &str) -> bool {
        self.entries.iter().any(|(id, _)| *id == version)
    }

    pub fn versions(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }
}
