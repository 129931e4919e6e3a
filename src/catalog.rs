//! Variable catalog merged across files.

use crate::data::{MeshFile, MeshSource};
use std::collections::BTreeSet;
use std::fmt;

/// Storage convention of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// One value per mesh node.
    Nodal,
    /// One value per element.
    Elemental,
}

impl VariableKind {
    /// Name of the character table listing variables of this kind.
    pub fn name_table(self) -> &'static str {
        match self {
            VariableKind::Nodal => "name_nod_var",
            VariableKind::Elemental => "name_elem_var",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Nodal => write!(f, "nodal"),
            VariableKind::Elemental => write!(f, "elemental"),
        }
    }
}

/// Nodal and elemental variable names available in at least one file.
///
/// Each list is the set union of every file's names in lexicographic order,
/// so the result does not depend on the order files were discovered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableCatalog {
    nodal: Vec<String>,
    elemental: Vec<String>,
}

impl VariableCatalog {
    /// Merge the catalogs of every source.
    pub fn merge<'a, F, I>(sources: I) -> Self
    where
        F: MeshFile + 'a,
        I: IntoIterator<Item = &'a MeshSource<F>>,
    {
        Self::from_name_lists(sources.into_iter().map(|s| {
            (
                s.variable_names(VariableKind::Nodal),
                s.variable_names(VariableKind::Elemental),
            )
        }))
    }

    /// Merge `(nodal, elemental)` name lists.
    pub fn from_name_lists<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = (&'a [String], &'a [String])>,
    {
        let mut nodal = BTreeSet::new();
        let mut elemental = BTreeSet::new();
        for (n, e) in lists {
            nodal.extend(n.iter().map(String::as_str));
            elemental.extend(e.iter().map(String::as_str));
        }
        Self {
            nodal: nodal.into_iter().map(str::to_string).collect(),
            elemental: elemental.into_iter().map(str::to_string).collect(),
        }
    }

    /// Sorted nodal variable names.
    pub fn nodal(&self) -> &[String] {
        &self.nodal
    }

    /// Sorted elemental variable names.
    pub fn elemental(&self) -> &[String] {
        &self.elemental
    }

    /// Check whether a name is known in either list.
    pub fn validate(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    /// Kind of a known variable. Nodal wins if a name appears in both lists.
    pub fn kind_of(&self, name: &str) -> Option<VariableKind> {
        let has = |list: &[String]| list.binary_search_by(|n| n.as_str().cmp(name)).is_ok();
        if has(&self.nodal) {
            Some(VariableKind::Nodal)
        } else if has(&self.elemental) {
            Some(VariableKind::Elemental)
        } else {
            None
        }
    }
}
