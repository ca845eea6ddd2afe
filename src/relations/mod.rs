//! Qualitative temporal relations — Allen classification and the lowering
//! of relations into numeric STN bounds.

pub mod classify;
pub mod lowering;

pub use classify::{
    allen_relation, allen_to_language_neutral, classify_relation, relation_description,
    AllenRelation, RelationCode,
};
pub use lowering::{
    constraint_between, filter_valid_intervals, generate_stn_constraint,
    validate_interval_duration,
};
