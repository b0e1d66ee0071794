//! Shape transformer abstraction - the common face of the four views

use dv_core::{ColumnKind, RoleBinding, ViewKind, ViewSettings};
use dv_data::{Dimensions, FilteredRecordSet};

use crate::plots::{ChordTransformer, ForceDirectedTransformer, RadialBarTransformer, SunburstTransformer};
use crate::{ViewDataset, ViewError};

/// Turns the filtered records into the dataset one view kind renders
pub trait ShapeTransformer: Send + Sync {
    /// The view this transformer feeds
    fn kind(&self) -> ViewKind;

    /// Build the view's dataset from the current filtered records
    fn transform(
        &self,
        records: &FilteredRecordSet,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<ViewDataset, ViewError>;
}

/// The transformer for a view kind
pub fn transformer_for(kind: ViewKind) -> Box<dyn ShapeTransformer> {
    match kind {
        ViewKind::RadialBar => Box::new(RadialBarTransformer),
        ViewKind::Chord => Box::new(ChordTransformer),
        ViewKind::ForceDirected => Box::new(ForceDirectedTransformer),
        ViewKind::Sunburst => Box::new(SunburstTransformer),
    }
}

/// Check every role the view declares against the settings and dimensions.
///
/// Missing required roles are reported before any column problem so the view
/// can show its placeholder.
pub(crate) fn validate_settings(
    view: ViewKind,
    settings: &ViewSettings,
    dimensions: &Dimensions,
) -> Result<(), ViewError> {
    for role in view.roles() {
        if role.required && settings.binding(role.name).is_none() {
            return Err(ViewError::IncompleteSettings {
                view,
                role: role.name.to_string(),
            });
        }
    }

    for role in view.roles() {
        let Some(binding) = settings.binding(role.name) else {
            continue;
        };
        if let RoleBinding::Many(columns) = binding {
            if !role.multiple && columns.len() > 1 {
                return Err(ViewError::transform(
                    view,
                    format!("'{}' takes a single column, got {}", role.name, columns.len()),
                ));
            }
        }
        for column in binding.columns() {
            let dimension = dimensions
                .get(column)
                .ok_or_else(|| ViewError::transform(view, format!("unknown column '{}' for '{}'", column, role.name)))?;
            if role.kind == ColumnKind::Numeric && !dimension.is_numeric() {
                return Err(ViewError::transform(
                    view,
                    format!("'{}' needs a numeric column but '{}' is categorical", role.name, column),
                ));
            }
        }
    }
    Ok(())
}

/// Column bound to a role that validation has already confirmed
pub(crate) fn required_column<'s>(
    view: ViewKind,
    settings: &'s ViewSettings,
    role: &str,
) -> Result<&'s str, ViewError> {
    settings.column(role).ok_or_else(|| ViewError::IncompleteSettings {
        view,
        role: role.to_string(),
    })
}
