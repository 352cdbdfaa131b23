mod demo;
mod load;
mod parse;
mod record;

pub use demo::demo_records;
pub use load::{RecordSource, load_records};
pub use parse::parse_records;
pub use record::DataRecord;
