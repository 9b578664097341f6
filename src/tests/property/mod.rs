//! Property-based tests for the bestiary pipeline.

mod markup_props;
mod modify_props;
mod normalize_props;
