pub mod compression_utils;
