pub mod sample_documents;
