mod allocation_repository;
mod export;
mod period_repository;
mod request_engine;
mod request_repository;

pub use allocation_repository::PgAllocationRepository;
pub use export::PgExportService;
pub use period_repository::PgPeriodRepository;
pub use request_engine::PgVacationService;
pub use request_repository::PgRequestRepository;
