pub mod admission;
pub mod error_handler;
pub mod metrics;
pub mod request_id;

pub use admission::AdmissionMiddleware;
pub use error_handler::{error_response, ErrorHandler, ErrorHandlerMiddleware};
pub use metrics::{Metrics, MetricsCollector, MetricsMiddleware};
pub use request_id::RequestId;
