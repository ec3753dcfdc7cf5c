pub mod bookmark;
pub mod dataset;
pub mod diffgram;
pub mod errors;
pub mod ports;
pub mod print_spec;
pub mod report;
pub mod table;
pub mod value_objects;
