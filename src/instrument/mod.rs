pub mod guitar;
pub mod model;
pub mod pitch;
pub mod strum;

pub use guitar::{AirGuitar, FrameOutcome, Strum, StrumSink};
pub use model::{InstrumentFrame, InstrumentGeometry, InstrumentModel, PartRoles};
pub use pitch::PitchMapper;
pub use strum::StrumDetector;
