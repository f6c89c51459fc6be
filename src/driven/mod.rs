pub mod cache;
pub mod celery;
