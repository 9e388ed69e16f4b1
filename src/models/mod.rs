pub mod loaders;
pub mod manifest_row;
pub mod page_range;

pub use loaders::{load_manifest, parse_manifest};
pub use manifest_row::{ManifestRow, RawManifestRecord, Rotation, MANIFEST_FIELD_COUNT};
pub use page_range::{parse_range_expr, PageSpan};
