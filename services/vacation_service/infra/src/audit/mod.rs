mod sink;

pub use sink::PgAuditSink;
