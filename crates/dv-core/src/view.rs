//! View kinds, the roles each one declares, and user-chosen view settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::value::{Record, Value};

/// The four coordinated encodings the engine produces data for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    /// Categorical aggregate (radial bar)
    RadialBar,
    /// Flow between entities (chord)
    Chord,
    /// Node/link network (force-directed graph)
    ForceDirected,
    /// Nested partition (sunburst)
    Sunburst,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::RadialBar,
        ViewKind::Chord,
        ViewKind::ForceDirected,
        ViewKind::Sunburst,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::RadialBar => "radialBar",
            ViewKind::Chord => "chord",
            ViewKind::ForceDirected => "forceDirected",
            ViewKind::Sunburst => "sunburst",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Roles the view reads from its settings
    pub fn roles(&self) -> &'static [RoleSpec] {
        match self {
            ViewKind::RadialBar => RADIAL_BAR_ROLES,
            ViewKind::Chord => CHORD_ROLES,
            ViewKind::ForceDirected => FORCE_DIRECTED_ROLES,
            ViewKind::Sunburst => SUNBURST_ROLES,
        }
    }

    /// Columns whose values name this view's entities.
    ///
    /// The sunburst only exposes its first level; full path resolution is not
    /// attempted.
    pub fn identifying_columns<'a>(&self, settings: &'a ViewSettings) -> Vec<&'a str> {
        let mut columns = Vec::new();
        match self {
            ViewKind::RadialBar => columns.extend(settings.column(roles::CATEGORY)),
            ViewKind::Chord => {
                columns.extend(settings.column(roles::SOURCE));
                columns.extend(settings.column(roles::TARGET));
            }
            ViewKind::ForceDirected => {
                columns.extend(settings.column(roles::NODE_ID));
                columns.extend(settings.column(roles::LINK_TARGET));
            }
            ViewKind::Sunburst => {
                columns.extend(settings.columns(roles::HIERARCHY).first().copied());
            }
        }
        columns.dedup();
        columns
    }

    /// Stringified identifiers a record contributes to this view.
    ///
    /// The graph and the hierarchy never turn missing values into entities,
    /// so those values identify nothing there.
    pub fn identifiers_of(&self, record: &Record, settings: &ViewSettings) -> Vec<String> {
        let skip_missing = matches!(self, ViewKind::ForceDirected | ViewKind::Sunburst);
        self.identifying_columns(settings)
            .into_iter()
            .map(|column| record.get(column))
            .filter(|value| !(skip_missing && value.is_missing()))
            .map(Value::stringify)
            .collect()
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Well-known role names
pub mod roles {
    pub const CATEGORY: &str = "category";
    pub const VALUE: &str = "value";
    pub const SOURCE: &str = "source";
    pub const TARGET: &str = "target";
    pub const NODE_ID: &str = "nodeId";
    pub const LINK_TARGET: &str = "linkTarget";
    pub const LINK_VALUE: &str = "linkValue";
    pub const HIERARCHY: &str = "hierarchy";
}

const RADIAL_BAR_ROLES: &[RoleSpec] = &[
    RoleSpec::single(roles::CATEGORY, ColumnKind::Categorical, true),
    RoleSpec::single(roles::VALUE, ColumnKind::Numeric, true),
];

const CHORD_ROLES: &[RoleSpec] = &[
    RoleSpec::single(roles::SOURCE, ColumnKind::Categorical, true),
    RoleSpec::single(roles::TARGET, ColumnKind::Categorical, true),
    RoleSpec::single(roles::VALUE, ColumnKind::Numeric, true),
];

const FORCE_DIRECTED_ROLES: &[RoleSpec] = &[
    RoleSpec::single(roles::NODE_ID, ColumnKind::Categorical, true),
    RoleSpec::single(roles::LINK_TARGET, ColumnKind::Categorical, true),
    RoleSpec::single(roles::LINK_VALUE, ColumnKind::Numeric, false),
];

const SUNBURST_ROLES: &[RoleSpec] = &[
    RoleSpec {
        name: roles::HIERARCHY,
        kind: ColumnKind::Categorical,
        required: true,
        multiple: true,
    },
    RoleSpec::single(roles::VALUE, ColumnKind::Numeric, true),
];

/// Column kind a role expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Declaration of one role of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    /// Accepts an ordered list of columns rather than one
    pub multiple: bool,
}

impl RoleSpec {
    const fn single(name: &'static str, kind: ColumnKind, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
            multiple: false,
        }
    }
}

/// Column(s) bound to a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleBinding {
    Single(String),
    Many(Vec<String>),
}

impl RoleBinding {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            RoleBinding::Single(column) => vec![column.as_str()],
            RoleBinding::Many(columns) => columns.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RoleBinding::Single(column) => column.is_empty(),
            RoleBinding::Many(columns) => columns.iter().all(String::is_empty),
        }
    }
}

/// The user's role → column mapping for one view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewSettings {
    bindings: BTreeMap<String, RoleBinding>,
}

impl ViewSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style single-column binding
    pub fn with(mut self, role: &str, column: &str) -> Self {
        self.bind(role, RoleBinding::Single(column.to_string()));
        self
    }

    /// Builder-style multi-column binding
    pub fn with_many(mut self, role: &str, columns: &[&str]) -> Self {
        self.bind(
            role,
            RoleBinding::Many(columns.iter().map(|c| c.to_string()).collect()),
        );
        self
    }

    pub fn bind(&mut self, role: &str, binding: RoleBinding) {
        self.bindings.insert(role.to_string(), binding);
    }

    pub fn unbind(&mut self, role: &str) {
        self.bindings.remove(role);
    }

    pub fn binding(&self, role: &str) -> Option<&RoleBinding> {
        self.bindings.get(role).filter(|b| !b.is_empty())
    }

    /// The single column bound to `role`, if any
    pub fn column(&self, role: &str) -> Option<&str> {
        match self.binding(role)? {
            RoleBinding::Single(column) => Some(column.as_str()),
            RoleBinding::Many(columns) => columns.first().map(String::as_str),
        }
    }

    /// Every non-empty column bound to `role`, in order
    pub fn columns(&self, role: &str) -> Vec<&str> {
        self.binding(role)
            .map(|b| b.columns().into_iter().filter(|c| !c.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.values().all(RoleBinding::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleBinding)> {
        self.bindings.iter().map(|(role, b)| (role.as_str(), b))
    }
}
