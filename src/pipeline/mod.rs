// Build monitoring module
// Progress tracing for corpus builds

pub mod trace;

pub use trace::{read_trace_file, TraceBuilder, TraceEntry, TraceError, TraceWriter};
