pub mod guide;
pub mod matcher;
pub mod parser;
pub mod resolver;
