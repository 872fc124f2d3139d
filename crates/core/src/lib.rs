//! dispatch-core: incident model and the list-view derivation pipeline.
//!
//! Everything here is synchronous and pure. Given the incidents the backend
//! returned and the signed-in user, the crate answers which incidents the
//! user may see, which of those match the search panel, in what order they
//! appear, and which workflow actions each row offers.
//!
//! # Public API
//!
//! - [`scope_incidents`] -- role-based visibility
//! - [`FilterCriteria`] / [`apply_filters`] -- search and filter predicate
//! - [`SortState`] / [`sort_incidents`] -- stable column sorting
//! - [`available_actions`] -- action menu decision table
//! - [`build_view`] -- all four stages in order
//! - [`dates`] -- shared timestamp parsing and formatting
//! - [`validate`] -- mutation forms checked before any request

#[macro_use]
pub mod model;

pub mod actions;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod filter;
pub mod scope;
pub mod sort;
pub mod stats;
pub mod validate;
pub mod workflow;

#[cfg(test)]
mod fixtures;

// ── Convenience re-exports ───────────────────────────────────────────

pub use actions::{available_actions, is_permitted, menu_entries, IncidentAction, MenuEntry};
pub use dashboard::{build_view, DashboardQuery, DashboardRow, DashboardView};
pub use dates::DateRange;
pub use error::{ParseEnumError, TimestampError, ValidationError, ValidationErrors};
pub use filter::{apply_filters, AssigneeFilter, FilterContext, FilterCriteria};
pub use model::{
    Incident, IncidentId, IncidentType, Location, Organization, OrganizationId, Priority,
    ReporterInfo, Role, Station, StationId, Status, User, UserId,
};
pub use scope::{scope_incidents, VisibilityScope};
pub use sort::{sort_incidents, SortDirection, SortField, SortState};
pub use stats::IncidentStats;
pub use validate::{
    AssignForm, BulkAction, BulkRequest, EscalationForm, IncidentUpdate, LoginForm,
};
pub use workflow::Transition;
