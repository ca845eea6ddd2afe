//! Timeline composite — ownership of intervals, bridge markers, and the
//! network mirror, plus building and segmentation.

pub mod builder;
pub mod segmenter;
#[allow(clippy::module_inception)]
pub mod timeline;

pub use builder::TimelineBuilder;
pub use segmenter::{
    create_segment, create_time_ranges, get_timeline_bounds, interval_in_range,
    record_segmentation, segment_by_bridges, validate_segments, TimeRange,
};
pub use timeline::Timeline;
