mod coerce;
mod delimiter;
mod errors;
mod table_name;

pub use coerce::{to_big_int, to_date, to_int};
pub use delimiter::Delimiter;
pub use errors::DelimiterError;
pub use table_name::TableName;
