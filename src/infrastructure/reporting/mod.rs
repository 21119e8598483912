pub mod json_file_sink;

pub use json_file_sink::JsonFileReportSink;
