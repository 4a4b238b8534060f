pub mod fixed_width;
pub mod pipe_delimited;
