pub mod coordinate;
pub mod result_link;
pub mod result_table;
pub mod townhouse;
