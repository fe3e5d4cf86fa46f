// 宣告子模組
pub mod adapter;
pub mod engine;
pub mod services;
pub mod trait_def;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// 重新導出常用項目（讓外部可以用 discovery::XXX 直接存取）
pub use adapter::SourceAdapter;
pub use engine::Aggregator;
pub use services::build_sources;
pub use trait_def::ImageSource;
pub use types::{Availability, REGISTRY, SOURCE_IDS, SourceDescriptor, SourceKind, descriptor};
