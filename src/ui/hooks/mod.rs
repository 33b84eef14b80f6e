pub mod use_collection_query;
