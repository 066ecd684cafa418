pub mod id;
pub mod snowflake;
pub mod time;

pub use snowflake::SnowflakeGenerator;
