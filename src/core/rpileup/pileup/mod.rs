pub use fragment::{Fragment, MappedRead, MismatchPolicy};
pub use position::{Clip, PositionPileup};
pub use region::RegionPileup;
pub use view::RegionPileupView;

mod fragment;
mod position;
mod region;
mod view;
