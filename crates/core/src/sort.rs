//! Column sorting for incident tables.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Incident;

wire_enum!(
    /// Sortable columns.
    SortField, "sort field" {
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        Priority => "priority",
        Status => "status",
        Title => "title",
        Type => "type",
    }
);

wire_enum!(
    SortDirection, "sort direction" {
        Ascending => "asc",
        Descending => "desc",
    }
);

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl SortField {
    /// Direction a column starts in when first selected: newest / most
    /// urgent first for timestamps and priority, A→Z for text.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortField::CreatedAt | SortField::UpdatedAt | SortField::Priority => {
                SortDirection::Descending
            }
            SortField::Status | SortField::Title | SortField::Type => SortDirection::Ascending,
        }
    }

    /// Ascending comparison on this column.
    pub fn compare(self, a: &Incident, b: &Incident) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortField::Status => a.status.workflow_rank().cmp(&b.status.workflow_rank()),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Type => a.incident_type.as_str().cmp(b.incident_type.as_str()),
        }
    }
}

/// The active column and direction of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        SortState {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        SortState { field, direction }
    }

    /// Header click: the active column flips direction, any other column
    /// becomes active in its default direction.
    pub fn toggle(self, field: SortField) -> Self {
        if field == self.field {
            SortState {
                field,
                direction: self.direction.reversed(),
            }
        } else {
            SortState {
                field,
                direction: field.default_direction(),
            }
        }
    }

    pub fn compare(&self, a: &Incident, b: &Incident) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Stable in-place sort; equal keys keep their incoming order.
pub fn sort_incidents(incidents: &mut [&Incident], state: SortState) {
    incidents.sort_by(|a, b| state.compare(a, b));
}
