pub mod adapter;
pub mod course;
pub mod paper;
pub mod youtube;

pub use adapter::SourceAdapter;
pub use course::CoursePageAdapter;
pub use paper::PaperAdapter;
pub use youtube::YoutubeAdapter;
