pub mod csv_table;
pub mod loader;
pub mod normalize;
