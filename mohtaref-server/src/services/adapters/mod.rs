pub mod document_adapter;

pub use document_adapter::DocumentAdapter;
